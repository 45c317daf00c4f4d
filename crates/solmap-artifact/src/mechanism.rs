//! Ingestion mechanism classification
//!
//! Signals overlap between artifact shapes, so classification is an ordered
//! rule table: the first rule whose predicate holds decides the direction and
//! mechanism. Artifacts matching no rule default to a pull-based
//! service-to-service connector.
//!
//! Rule order matters:
//! - UI-configuration artifacts sometimes embed data-source-like fields, so
//!   the CCF rule runs before the data-collection-rule rules.
//! - The agent/direct split for data collection rules depends on agent
//!   data-source keys that only exist on real data collection rules.

use crate::artifact::{truthy, Artifact};
use serde::{Deserialize, Serialize};

/// Version of the rule table below. Bump when rules change meaning.
pub const RULESET_VERSION: u32 = 1;

/// Connection direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Pull,
    Push,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ingestion mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mechanism {
    /// Customizable connector framework
    #[serde(rename = "CCF")]
    Ccf,

    /// Azure Monitor Agent
    #[serde(rename = "AMA")]
    Ama,

    #[serde(rename = "Logs Ingestion API")]
    LogsIngestionApi,

    #[serde(rename = "Event Hub")]
    EventHub,

    #[serde(rename = "Logic Apps")]
    LogicApps,

    #[serde(rename = "Azure Functions")]
    AzureFunctions,

    #[serde(rename = "HTTP Data Collector API")]
    HttpDataCollectorApi,

    #[serde(rename = "Service-to-Service")]
    ServiceToService,
}

impl Mechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ccf => "CCF",
            Self::Ama => "AMA",
            Self::LogsIngestionApi => "Logs Ingestion API",
            Self::EventHub => "Event Hub",
            Self::LogicApps => "Logic Apps",
            Self::AzureFunctions => "Azure Functions",
            Self::HttpDataCollectorApi => "HTTP Data Collector API",
            Self::ServiceToService => "Service-to-Service",
        }
    }
}

impl std::fmt::Display for Mechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of classifying one artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub direction: Direction,
    pub mechanism: Mechanism,

    /// Customizable connector framework definition
    pub is_ccf: bool,

    /// Data-collection-rule shaped artifact
    pub is_dcr: bool,

    /// Name of the rule that matched, `None` for the default
    pub rule: Option<&'static str>,
}

impl Classification {
    /// Pull-based service-to-service, used when no rule matches
    pub const DEFAULT: Classification = Classification {
        direction: Direction::Pull,
        mechanism: Mechanism::ServiceToService,
        is_ccf: false,
        is_dcr: false,
        rule: None,
    };
}

/// One row of the rule table
#[derive(Clone, Copy)]
pub struct MechanismRule {
    pub name: &'static str,
    pub matches: fn(&Artifact) -> bool,
    pub direction: Direction,
    pub mechanism: Mechanism,
    pub is_dcr: bool,
}

impl std::fmt::Debug for MechanismRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MechanismRule")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("mechanism", &self.mechanism)
            .finish()
    }
}

impl MechanismRule {
    fn classification(&self) -> Classification {
        Classification {
            direction: self.direction,
            mechanism: self.mechanism,
            is_ccf: self.mechanism == Mechanism::Ccf,
            is_dcr: self.is_dcr,
            rule: Some(self.name),
        }
    }
}

/// Rule table v1, evaluated top to bottom
pub static RULES_V1: &[MechanismRule] = &[
    MechanismRule {
        name: "ccf",
        matches: is_ccf,
        direction: Direction::Pull,
        mechanism: Mechanism::Ccf,
        is_dcr: false,
    },
    MechanismRule {
        name: "dcr-agent",
        matches: is_agent_dcr,
        direction: Direction::Push,
        mechanism: Mechanism::Ama,
        is_dcr: true,
    },
    MechanismRule {
        name: "dcr-direct",
        matches: Artifact::has_dcr_shape,
        direction: Direction::Push,
        mechanism: Mechanism::LogsIngestionApi,
        is_dcr: true,
    },
    MechanismRule {
        name: "event-hub",
        matches: |a| a.contains("eventhub"),
        direction: Direction::Push,
        mechanism: Mechanism::EventHub,
        is_dcr: false,
    },
    MechanismRule {
        name: "logic-app",
        matches: |a| a.contains("logic app") || a.contains("workflows"),
        direction: Direction::Pull,
        mechanism: Mechanism::LogicApps,
        is_dcr: false,
    },
    MechanismRule {
        name: "function-app",
        matches: |a| a.contains("azure function") || a.contains("functionapp"),
        direction: Direction::Pull,
        mechanism: Mechanism::AzureFunctions,
        is_dcr: false,
    },
    MechanismRule {
        name: "data-collector-api",
        matches: |a| a.contains("data collector api"),
        direction: Direction::Push,
        mechanism: Mechanism::HttpDataCollectorApi,
        is_dcr: false,
    },
];

fn is_ccf(artifact: &Artifact) -> bool {
    artifact.ui_config().is_some() || artifact.kind() == "customizable"
}

fn is_agent_dcr(artifact: &Artifact) -> bool {
    if !artifact.has_dcr_shape() {
        return false;
    }

    let source = |key: &str| {
        artifact
            .data_sources()
            .and_then(|ds| ds.get(key))
            .map(truthy)
            .unwrap_or(false)
    };

    let syslog = source("syslog") || artifact.contains("syslog");
    let windows = source("windowsEvent") || artifact.contains("windowsevent");
    syslog || windows
}

/// Classifier over a rule table
#[derive(Debug, Clone, Copy)]
pub struct MechanismClassifier {
    rules: &'static [MechanismRule],
}

impl Default for MechanismClassifier {
    fn default() -> Self {
        Self { rules: RULES_V1 }
    }
}

impl MechanismClassifier {
    /// Classifier over a custom rule table
    pub fn with_rules(rules: &'static [MechanismRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [MechanismRule] {
        self.rules
    }

    /// Classify an artifact. Total and side-effect free.
    pub fn classify(&self, artifact: &Artifact) -> Classification {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(artifact))
            .map(MechanismRule::classification)
            .unwrap_or(Classification::DEFAULT)
    }
}

/// Classify with the current rule table
pub fn classify(artifact: &Artifact) -> Classification {
    MechanismClassifier::default().classify(artifact)
}
