//! Parsed configuration artifacts
//!
//! An artifact is one JSON document from the solution tree. There is no
//! canonical schema, so every accessor reads fields opportunistically and
//! the heuristics lean on a lowercased serialization of the whole document.

use serde_json::Value;

/// Resource-type marker carried by data-collection-rule documents
pub const DCR_RESOURCE_TYPE: &str = "microsoft.insights/datacollectionrules";

/// Text marker carried by data connector definitions
pub const DATA_CONNECTOR_MARKER: &str = "dataconnector";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One parsed artifact
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Path relative to the repository root
    path: String,

    /// Parsed document
    value: Value,

    /// Lowercased compact serialization, used for substring heuristics
    text: String,
}

impl Artifact {
    /// Parse raw bytes fetched from `path`. A leading UTF-8 byte order mark is ignored.
    pub fn parse(path: impl Into<String>, bytes: &[u8]) -> Result<Self, ArtifactError> {
        let path = path.into();
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ArtifactError::ParseError(path.clone(), e.to_string()))?;

        Ok(Self::from_value(path, value))
    }

    /// Wrap an already-parsed document
    pub fn from_value(path: impl Into<String>, value: Value) -> Self {
        let text = value.to_string().to_lowercase();
        Self {
            path: path.into(),
            value,
            text,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Lowercased full-text view
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Check the full-text view for a lowercase marker
    pub fn contains(&self, marker: &str) -> bool {
        self.text.contains(marker)
    }

    /// Last path segment (`conn.json`)
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Last path segment without a `.json` extension (`conn`)
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        let cut = name.len().saturating_sub(".json".len());
        if name.len() > 5 && name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".json") {
            &name[..cut]
        } else {
            name
        }
    }

    /// The `properties` object, if present
    pub fn properties(&self) -> Option<&Value> {
        self.value.get("properties").filter(|v| truthy(v))
    }

    /// Look up a field under `properties`
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties().and_then(|p| p.get(key)).filter(|v| truthy(v))
    }

    /// Look up a top-level field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.value.get(key).filter(|v| truthy(v))
    }

    /// Connector UI configuration block (`connectorUiConfig` or `connectorUIConfig`)
    pub fn ui_config(&self) -> Option<&Value> {
        self.property("connectorUiConfig")
            .or_else(|| self.property("connectorUIConfig"))
    }

    /// Declared `kind`, lowercased (top-level first, then under `properties`)
    pub fn kind(&self) -> String {
        self.field("kind")
            .or_else(|| self.property("kind"))
            .and_then(Value::as_str)
            .map(str::to_lowercase)
            .unwrap_or_default()
    }

    /// `dataSources` under `properties`, falling back to top level
    pub fn data_sources(&self) -> Option<&Value> {
        self.property("dataSources").or_else(|| self.field("dataSources"))
    }

    /// `dataFlows` under `properties`, falling back to top level
    pub fn data_flows(&self) -> Option<&Value> {
        self.property("dataFlows").or_else(|| self.field("dataFlows"))
    }

    /// Whether the artifact looks like a data collection rule
    pub fn has_dcr_shape(&self) -> bool {
        self.contains(DCR_RESOURCE_TYPE)
            || self.data_sources().is_some()
            || self.data_flows().is_some()
    }

    /// Whether the artifact carries connector definition signals
    pub fn has_connector_signals(&self) -> bool {
        self.ui_config().is_some() || self.contains(DATA_CONNECTOR_MARKER)
    }
}

/// Loose presence test: null, `false`, `0` and `""` count as absent
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First non-blank string among `candidates`, trimmed
pub fn first_text<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Artifact errors
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_rejects_invalid_json() {
        let err = Artifact::parse("Solutions/X/bad.json", b"{not json").unwrap_err();
        assert!(err.to_string().contains("Solutions/X/bad.json"));
    }

    #[test]
    fn parse_skips_byte_order_mark() {
        let artifact = Artifact::parse(
            "Solutions/X/Data Connectors/conn.json",
            b"\xEF\xBB\xBF{\"kind\":\"Customizable\"}",
        )
        .unwrap();
        assert_eq!(artifact.kind(), "customizable");
        assert!(crate::classify(&artifact).is_ccf);
    }

    #[test]
    fn text_view_is_lowercased() {
        let artifact = Artifact::from_value("a.json", json!({"Type": "Microsoft.Insights/DataCollectionRules"}));
        assert!(artifact.contains(DCR_RESOURCE_TYPE));
        assert!(artifact.has_dcr_shape());
    }

    #[test]
    fn file_names() {
        let artifact = Artifact::from_value("Solutions/X/Data Connectors/Conn.JSON", json!({}));
        assert_eq!(artifact.file_name(), "Conn.JSON");
        assert_eq!(artifact.file_stem(), "Conn");

        let bare = Artifact::from_value("noext", json!({}));
        assert_eq!(bare.file_stem(), "noext");
    }

    #[test]
    fn ui_config_accepts_both_spellings() {
        let lower = Artifact::from_value("a.json", json!({"properties": {"connectorUiConfig": {"title": "A"}}}));
        let upper = Artifact::from_value("b.json", json!({"properties": {"connectorUIConfig": {"title": "B"}}}));
        let none = Artifact::from_value("c.json", json!({"connectorUiConfig": {"title": "C"}}));

        assert!(lower.ui_config().is_some());
        assert!(upper.ui_config().is_some());
        assert!(none.ui_config().is_none());
    }

    #[test]
    fn kind_prefers_top_level() {
        let artifact = Artifact::from_value(
            "a.json",
            json!({"kind": "Customizable", "properties": {"kind": "other"}}),
        );
        assert_eq!(artifact.kind(), "customizable");

        let nested = Artifact::from_value("b.json", json!({"properties": {"kind": "Customizable"}}));
        assert_eq!(nested.kind(), "customizable");
    }

    #[test]
    fn falsy_fields_do_not_count() {
        let artifact = Artifact::from_value("a.json", json!({"dataSources": null, "dataFlows": ""}));
        assert!(!artifact.has_dcr_shape());

        let empty_object = Artifact::from_value("b.json", json!({"properties": {"dataSources": {}}}));
        assert!(empty_object.has_dcr_shape());
    }

    #[test]
    fn first_text_skips_blank() {
        let value = json!({"a": "  ", "b": 3, "c": " name "});
        let picked = first_text([value.get("a"), value.get("b"), value.get("missing"), value.get("c")]);
        assert_eq!(picked.as_deref(), Some("name"));
    }
}
