use serde::Serialize;
use serde_json::Value;

use super::{channel, read_bool, read_enum, read_list, read_num_string, read_str};

/// iMessage connection form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IMessageForm {
    pub enabled: bool,
    pub cli_path: String,
    pub db_path: String,
    pub service: String,
    pub region: String,
    pub allow_from: String,
    pub include_attachments: bool,
    pub media_max_mb: String,
}

impl IMessageForm {
    #[must_use]
    pub fn from_document(doc: &Value) -> Self {
        let imessage = channel(doc, "imessage");
        Self {
            enabled: read_bool(imessage, "enabled", true),
            cli_path: read_str(imessage, "cliPath"),
            db_path: read_str(imessage, "dbPath"),
            service: read_enum(imessage, "service", &["imessage", "sms", "auto"], "auto"),
            region: read_str(imessage, "region"),
            allow_from: read_list(imessage, "allowFrom"),
            include_attachments: read_bool(imessage, "includeAttachments", false),
            media_max_mb: read_num_string(imessage, "mediaMaxMb"),
        }
    }
}

impl Default for IMessageForm {
    fn default() -> Self {
        Self::from_document(&Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_yields_defaults() {
        let form = IMessageForm::from_document(&json!({}));
        assert!(form.enabled);
        assert_eq!(form.service, "auto");
        assert!(!form.include_attachments);
        assert_eq!(form.media_max_mb, "");
    }

    #[test]
    fn service_falls_back_to_auto() {
        for (stored, expected) in [
            (json!("imessage"), "imessage"),
            (json!("sms"), "sms"),
            (json!("rcs"), "auto"),
            (json!(1), "auto"),
        ] {
            let doc = json!({ "imessage": { "service": stored } });
            assert_eq!(IMessageForm::from_document(&doc).service, expected);
        }
    }

    #[test]
    fn paths_and_allowlist_read_defensively() {
        let doc = json!({
            "imessage": {
                "cliPath": "/usr/local/bin/imsg",
                "dbPath": "~/Library/Messages/chat.db",
                "region": "US",
                "allowFrom": ["+15550100", "me@example.com"],
                "includeAttachments": true,
                "mediaMaxMb": 10,
            }
        });
        let form = IMessageForm::from_document(&doc);
        assert_eq!(form.cli_path, "/usr/local/bin/imsg");
        assert_eq!(form.db_path, "~/Library/Messages/chat.db");
        assert_eq!(form.region, "US");
        assert_eq!(form.allow_from, "+15550100, me@example.com");
        assert!(form.include_attachments);
        assert_eq!(form.media_max_mb, "10");
    }
}
