//! Test fixtures for pipeline tests
//!
//! A small syslog solution: one connector definition with a UI config, a
//! duplicate of it, a legacy connector without one, an agent data
//! collection rule, a hunting query, the package template and a file that
//! is not valid JSON.

#![allow(dead_code)]

use serde_json::{json, Value};
use solmap_source::{MockSource, MockSourceBuilder};

pub const SOLUTION: &str = "Syslog";
pub const BROKEN_PATH: &str = "Solutions/Syslog/Data Connectors/broken.json";
pub const DUPLICATE_PATH: &str = "Solutions/Syslog/Data Connectors/SyslogAmaCopy.json";
pub const QUERY_PATH: &str = "Solutions/Syslog/Hunting Queries/SshBruteForce.json";
pub const TEMPLATE_PATH: &str = "Solutions/Syslog/Package/mainTemplate.json";

pub fn ama_connector() -> Value {
    json!({
        "id": "SyslogAma",
        "properties": {
            "connectorUiConfig": {
                "title": "Syslog via AMA",
                "publisher": "Microsoft",
                "dataTypes": [{"name": "Syslog"}]
            }
        }
    })
}

pub fn ama_connector_copy() -> Value {
    json!({
        "properties": {
            "connectorUiConfig": {"title": "Syslog via AMA", "publisher": "Someone Else"}
        }
    })
}

pub fn function_connector() -> Value {
    json!({
        "name": "Contoso Function",
        "type": "dataConnector",
        "description": "Polls the vendor API from an Azure Function"
    })
}

pub fn syslog_dcr() -> Value {
    json!({
        "name": "syslog-dcr",
        "type": "Microsoft.Insights/dataCollectionRules",
        "properties": {
            "dataSources": {"syslog": [{"streams": ["Microsoft-Syslog"]}]},
            "destinations": {"logAnalytics": [{"name": "la"}]},
            "dataFlows": [
                {"streams": ["Microsoft-Syslog"], "transformKql": "source | into table Custom_Extra"}
            ]
        }
    })
}

pub fn hunting_query() -> Value {
    json!({
        "properties": {
            "displayName": "SSH brute force",
            "query": "Syslog | where ProcessName == 'sshd' | invoke ASIM_AuthenticationBegin() | union imAuthentication"
        }
    })
}

pub fn main_template() -> Value {
    json!({
        "parameters": {
            "solutionName": {"defaultValue": "Syslog Solution"},
            "publisher": {"defaultValue": "Microsoft"},
            "contactEmail": {"defaultValue": "support@example.com"}
        },
        "resources": [
            {
                "type": "Microsoft.Insights/workbooks",
                "name": "syslog-workbook",
                "properties": {"displayName": "Syslog overview"}
            },
            {
                "type": "Microsoft.SecurityInsights/alertRules",
                "name": "ssh-rule",
                "properties": {"displayName": "SSH brute force", "severity": "Medium"}
            }
        ]
    })
}

/// Files of the solution, as (path, contents)
pub fn solution_files() -> Vec<(&'static str, Value)> {
    vec![
        ("Solutions/Syslog/Data Connectors/SyslogAma.json", ama_connector()),
        (DUPLICATE_PATH, ama_connector_copy()),
        ("Solutions/Syslog/Data Connectors/ContosoFunction.json", function_connector()),
        ("Solutions/Syslog/Data Connectors/dcr.json", syslog_dcr()),
        (QUERY_PATH, hunting_query()),
        (TEMPLATE_PATH, main_template()),
    ]
}

pub fn solution_builder() -> MockSourceBuilder {
    let mut builder = MockSourceBuilder::new().with_file(BROKEN_PATH, "{ not json");
    for (path, value) in solution_files() {
        builder = builder.with_json(path, value);
    }
    builder
}

pub fn solution_source() -> MockSource {
    solution_builder().build()
}
