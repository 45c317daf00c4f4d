//! Solution package metadata from `mainTemplate.json`

use crate::artifact::{first_text, Artifact};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File name of the solution deployment template
pub const MAIN_TEMPLATE_FILE: &str = "mainTemplate.json";

const CONNECTOR_RESOURCE: &str = "microsoft.securityinsights/dataconnector";
const WORKBOOK_RESOURCE: &str = "microsoft.insights/workbooks";
const ALERT_RULE_RESOURCE: &str = "microsoft.securityinsights/alertrules";

/// Whether `path` names the solution deployment template
pub fn is_main_template_path(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .map(|name| name.eq_ignore_ascii_case(MAIN_TEMPLATE_FILE))
        .unwrap_or(false)
}

/// Data connector declared in the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConnector {
    pub name: String,
    pub data_types: Vec<String>,
    pub connector_type: String,
}

/// Workbook declared in the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateWorkbook {
    pub name: String,
    pub display_name: String,
}

/// Analytic rule declared in the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateAlertRule {
    pub name: String,
    pub display_name: String,
    pub severity: String,
}

/// General metadata and resource inventory of a solution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionMetadata {
    pub solution_name: String,
    pub contact_email: String,
    pub publisher: String,
    pub connectors: Vec<TemplateConnector>,
    pub workbooks: Vec<TemplateWorkbook>,
    pub analytic_rules: Vec<TemplateAlertRule>,
}

impl SolutionMetadata {
    pub fn from_artifact(artifact: &Artifact) -> Self {
        let root = artifact.value();
        let mut metadata = Self {
            solution_name: parameter_default(root, "solutionName"),
            contact_email: parameter_default(root, "contactEmail"),
            publisher: parameter_default(root, "publisher"),
            ..Self::default()
        };

        let resources = root
            .get("resources")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        for resource in resources {
            let resource_type = resource
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_lowercase)
                .unwrap_or_default();
            let name = text(resource.get("name"));
            let property = |key: &str| resource.get("properties").and_then(|p| p.get(key));

            if resource_type.contains(CONNECTOR_RESOURCE) {
                metadata.connectors.push(TemplateConnector {
                    name: name.clone(),
                    data_types: data_type_names(property("dataTypes")),
                    connector_type: text(property("connectorType")),
                });
            }
            if resource_type.contains(WORKBOOK_RESOURCE) {
                metadata.workbooks.push(TemplateWorkbook {
                    name: name.clone(),
                    display_name: text(property("displayName")),
                });
            }
            if resource_type.contains(ALERT_RULE_RESOURCE) {
                metadata.analytic_rules.push(TemplateAlertRule {
                    name,
                    display_name: text(property("displayName")),
                    severity: text(property("severity")),
                });
            }
        }

        metadata
    }

    /// Declared solution name, if not blank
    pub fn name(&self) -> Option<&str> {
        Some(self.solution_name.trim()).filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn parameter_default(root: &Value, key: &str) -> String {
    text(root.get("parameters").and_then(|p| p.get(key)).and_then(|p| p.get("defaultValue")))
}

fn text(value: Option<&Value>) -> String {
    first_text([value]).unwrap_or_default()
}

/// `dataTypes` is either a list of names or a list of `{ "name": ... }` objects
fn data_type_names(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| first_text([Some(item), item.get("name")]))
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
