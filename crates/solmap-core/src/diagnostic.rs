//! Diagnostic codes and status reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Recoverable per-file problems (1xxx)
    /// Raw content for a path could not be fetched; the file was skipped
    FetchSkipped,

    /// Content at a path is not valid JSON; the file was skipped
    ParseSkipped,

    /// The recursive tree listing was truncated by the content host
    TreeTruncated,

    // Empty results (2xxx)
    /// No solution directories were found under the solutions root
    NoSolutions,

    /// The solution directory holds no JSON files
    NoJsonFiles,

    /// No connector definitions were detected in the solution
    NoConnectors,

    /// No data-collection-rule artifacts were detected in the solution
    NoDependencies,

    /// The solution has no usable mainTemplate.json
    MainTemplateMissing,

    // General messages (9xxx)
    /// General informational message
    Info,

    /// General warning message
    Warning,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchSkipped => "FETCH_SKIPPED",
            Self::ParseSkipped => "PARSE_SKIPPED",
            Self::TreeTruncated => "TREE_TRUNCATED",
            Self::NoSolutions => "NO_SOLUTIONS",
            Self::NoJsonFiles => "NO_JSON_FILES",
            Self::NoConnectors => "NO_CONNECTORS",
            Self::NoDependencies => "NO_DEPENDENCIES",
            Self::MainTemplateMissing => "MAIN_TEMPLATE_MISSING",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }

    /// Severity used when no override is configured
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::FetchSkipped | Self::ParseSkipped | Self::TreeTruncated => Severity::Warn,
            Self::NoSolutions | Self::NoJsonFiles | Self::NoConnectors => Severity::Warn,
            Self::NoDependencies | Self::MainTemplateMissing | Self::Info => Severity::Info,
            Self::Warning => Severity::Warn,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - the result is degraded but usable
    Warn,

    /// Error - the result should not be trusted
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Location of the artifact a diagnostic refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Path relative to the repository root
    pub path: String,

    /// HTTP-like status reported by the content host, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Location {
    /// Create a new location with just a path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: None,
        }
    }

    /// Create a location carrying the status returned for the path
    pub fn with_status(path: impl Into<String>, status: u16) -> Self {
        Self {
            path: path.into(),
            status: Some(status),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Artifact location (best-effort)
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
        }
    }

    /// Create a diagnostic using the code's default severity
    pub fn from_code(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, code.default_severity(), message)
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Override the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}
