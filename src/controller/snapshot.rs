//! Defensive decoding of gateway response payloads.
//!
//! The gateway's envelope is loosely typed; missing and mistyped fields
//! degrade to defaults rather than failing the operation.

use serde_json::{Map, Value};

/// One `config.get` response: the stored raw text, the parsed document, and
/// the validation verdict with its diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSnapshot {
    pub raw: Option<String>,
    pub document: Value,
    pub valid: Option<bool>,
    pub issues: Vec<Value>,
}

impl ConfigSnapshot {
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        let raw = match map.shift_remove("raw") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let document = map.shift_remove("config").unwrap_or(Value::Null);
        let valid = match map.shift_remove("valid") {
            Some(Value::Bool(b)) => Some(b),
            _ => None,
        };
        let issues = match map.shift_remove("issues") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        Self {
            raw,
            document,
            valid,
            issues,
        }
    }
}

/// One `config.schema` response: schema blob, dashboard rendering hints,
/// and the schema version string.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaInfo {
    pub schema: Option<Value>,
    pub ui_hints: Value,
    pub version: Option<String>,
}

impl Default for SchemaInfo {
    fn default() -> Self {
        Self {
            schema: None,
            ui_hints: Value::Object(Map::new()),
            version: None,
        }
    }
}

impl SchemaInfo {
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        let schema = map.shift_remove("schema").filter(|v| !v.is_null());
        let ui_hints = match map.shift_remove("uiHints") {
            Some(v) if !v.is_null() => v,
            _ => Value::Object(Map::new()),
        };
        let version = match map.shift_remove("version") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        Self {
            schema,
            ui_hints,
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_decodes_complete_payload() {
        let snapshot = ConfigSnapshot::from_value(json!({
            "raw": "{\n  \"telegram\": {}\n}",
            "config": { "telegram": {} },
            "valid": true,
            "issues": [],
        }));
        assert_eq!(snapshot.raw.as_deref(), Some("{\n  \"telegram\": {}\n}"));
        assert_eq!(snapshot.document, json!({ "telegram": {} }));
        assert_eq!(snapshot.valid, Some(true));
        assert!(snapshot.issues.is_empty());
    }

    #[test]
    fn snapshot_defaults_missing_and_mistyped_fields() {
        let snapshot = ConfigSnapshot::from_value(json!({
            "raw": 42,
            "valid": "yes",
            "issues": "none",
        }));
        assert_eq!(snapshot.raw, None);
        assert_eq!(snapshot.document, Value::Null);
        assert_eq!(snapshot.valid, None);
        assert!(snapshot.issues.is_empty());

        assert_eq!(ConfigSnapshot::from_value(json!([1, 2])), ConfigSnapshot::default());
        assert_eq!(ConfigSnapshot::from_value(Value::Null), ConfigSnapshot::default());
    }

    #[test]
    fn snapshot_keeps_issue_entries_opaque() {
        let snapshot = ConfigSnapshot::from_value(json!({
            "valid": false,
            "issues": [{ "path": "telegram.botToken", "message": "required" }, "loose text"],
        }));
        assert_eq!(snapshot.valid, Some(false));
        assert_eq!(snapshot.issues.len(), 2);
        assert_eq!(snapshot.issues[1], json!("loose text"));
    }

    #[test]
    fn schema_defaults_hints_to_empty_mapping() {
        let info = SchemaInfo::from_value(json!({ "schema": { "type": "object" } }));
        assert_eq!(info.schema, Some(json!({ "type": "object" })));
        assert_eq!(info.ui_hints, json!({}));
        assert_eq!(info.version, None);

        let info = SchemaInfo::from_value(json!({
            "schema": null,
            "uiHints": { "telegram": { "order": 1 } },
            "version": "2024-05",
        }));
        assert_eq!(info.schema, None);
        assert_eq!(info.ui_hints, json!({ "telegram": { "order": 1 } }));
        assert_eq!(info.version.as_deref(), Some("2024-05"));
    }
}
