//! Destination table inference for data collection rules
//!
//! Best effort: well-known streams map through a static table, `Custom-`
//! streams derive a custom-log table name, and transform expressions are
//! scanned for `into table <name>`. Streams matching neither rule are
//! dropped.

use crate::artifact::Artifact;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

/// Well-known stream names (lowercase) and their tables
pub const STREAM_TO_TABLE: &[(&str, &str)] = &[
    ("microsoft-syslog", "Syslog"),
    ("microsoft-windowsevent", "WindowsEvents"),
    ("microsoft-commonsecuritylog", "CommonSecurityLog"),
    ("microsoft-azurefirewall", "AzureDiagnostics"),
    ("microsoft-perf", "Perf"),
];

/// Prefix of custom stream names
pub const CUSTOM_STREAM_PREFIX: &str = "custom-";

/// Suffix of custom-log tables
pub const CUSTOM_TABLE_SUFFIX: &str = "_CL";

static INTO_TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)into\s+table\s+([a-z0-9_]+)").unwrap());

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]").unwrap());

/// Map one stream name to its table, if known
pub fn map_stream_to_table(stream: &str) -> Option<String> {
    let key = stream.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }

    if let Some((_, table)) = STREAM_TO_TABLE.iter().find(|(name, _)| *name == key) {
        return Some((*table).to_string());
    }

    let suffix = key.strip_prefix(CUSTOM_STREAM_PREFIX)?;
    let suffix = NON_ALNUM_RE.replace_all(suffix, "");
    if suffix.is_empty() {
        None
    } else {
        Some(format!("{}{}", suffix, CUSTOM_TABLE_SUFFIX))
    }
}

/// Tables named by `into table` clauses of a transform expression
pub fn tables_in_transform(transform: &str) -> Vec<String> {
    let lowered = transform.to_lowercase();
    INTO_TABLE_RE
        .captures_iter(&lowered)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn data_flows(artifact: &Artifact) -> &[Value] {
    artifact
        .data_flows()
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn stream_names(flow: &Value) -> impl Iterator<Item = &str> {
    flow.get("streams")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

/// Infer the destination tables a data collection rule writes to
pub fn infer_tables(artifact: &Artifact) -> BTreeSet<String> {
    let mut tables = BTreeSet::new();

    for flow in data_flows(artifact) {
        tables.extend(stream_names(flow).filter_map(map_stream_to_table));

        if let Some(transform) = flow.get("transformKql").and_then(Value::as_str) {
            tables.extend(tables_in_transform(transform));
        }
    }

    tables
}

/// Declared stream names across all data flows
pub fn infer_streams(artifact: &Artifact) -> BTreeSet<String> {
    data_flows(artifact)
        .iter()
        .flat_map(stream_names)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dcr(value: Value) -> Artifact {
        Artifact::from_value("Solutions/Test/Data Connectors/dcr.json", value)
    }

    #[test]
    fn well_known_streams() {
        assert_eq!(map_stream_to_table("Microsoft-Syslog").as_deref(), Some("Syslog"));
        assert_eq!(map_stream_to_table(" microsoft-perf ").as_deref(), Some("Perf"));
        assert_eq!(
            map_stream_to_table("Microsoft-AzureFirewall").as_deref(),
            Some("AzureDiagnostics")
        );
    }

    #[test]
    fn custom_stream_derives_custom_table() {
        assert_eq!(map_stream_to_table("Custom-MyLog").as_deref(), Some("mylog_CL"));
        assert_eq!(map_stream_to_table("Custom-My.Log-2").as_deref(), Some("mylog2_CL"));
        assert_eq!(map_stream_to_table("Custom-"), None);
        assert_eq!(map_stream_to_table("Custom-!!"), None);
    }

    #[test]
    fn unknown_streams_are_dropped() {
        assert_eq!(map_stream_to_table("Microsoft-Unknown"), None);
        assert_eq!(map_stream_to_table(""), None);
    }

    #[test]
    fn transform_matches_every_clause() {
        let tables = tables_in_transform("source | INTO TABLE Foo_CL | x | into  table bar");
        assert_eq!(tables, vec!["foo_cl".to_string(), "bar".to_string()]);
    }

    #[test]
    fn infer_tables_unions_streams_and_transforms() {
        let artifact = dcr(json!({
            "properties": {
                "dataFlows": [
                    {"streams": ["Microsoft-Syslog", "Custom-MyLog"]},
                    {"streams": ["Microsoft-Syslog", "Microsoft-Nope"], "transformKql": "source | into table extra_cl"}
                ]
            }
        }));

        let tables: Vec<String> = infer_tables(&artifact).into_iter().collect();
        assert_eq!(tables, vec!["Syslog", "extra_cl", "mylog_CL"]);
        assert!(infer_tables(&artifact).iter().all(|t| !t.is_empty()));
    }

    #[test]
    fn top_level_data_flows_are_read() {
        let artifact = dcr(json!({"dataFlows": [{"streams": ["Microsoft-WindowsEvent"]}]}));
        assert!(infer_tables(&artifact).contains("WindowsEvents"));
    }

    #[test]
    fn malformed_flows_yield_nothing() {
        let artifact = dcr(json!({"dataFlows": {"streams": "Microsoft-Syslog"}}));
        assert!(infer_tables(&artifact).is_empty());

        let artifact = dcr(json!({"dataFlows": [{"streams": "Microsoft-Syslog"}, 7]}));
        assert!(infer_streams(&artifact).is_empty());
    }

    #[test]
    fn streams_are_kept_verbatim() {
        let artifact = dcr(json!({"dataFlows": [{"streams": ["Custom-MyLog", "Custom-MyLog", ""]}]}));
        let streams: Vec<String> = infer_streams(&artifact).into_iter().collect();
        assert_eq!(streams, vec!["Custom-MyLog"]);
    }
}
