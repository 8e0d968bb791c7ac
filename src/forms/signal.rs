use serde::Serialize;
use serde_json::Value;

use super::{channel, read_bool, read_enum, read_list, read_num_string, read_str};

/// Signal connection form, covering both the signal-cli daemon settings and
/// the HTTP endpoint it is reached on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalForm {
    pub enabled: bool,
    pub account: String,
    pub http_url: String,
    pub http_host: String,
    pub http_port: String,
    pub cli_path: String,
    pub auto_start: bool,
    pub receive_mode: String,
    pub ignore_attachments: bool,
    pub ignore_stories: bool,
    pub send_read_receipts: bool,
    pub allow_from: String,
    pub media_max_mb: String,
}

impl SignalForm {
    #[must_use]
    pub fn from_document(doc: &Value) -> Self {
        let signal = channel(doc, "signal");
        Self {
            enabled: read_bool(signal, "enabled", true),
            account: read_str(signal, "account"),
            http_url: read_str(signal, "httpUrl"),
            http_host: read_str(signal, "httpHost"),
            http_port: read_num_string(signal, "httpPort"),
            cli_path: read_str(signal, "cliPath"),
            auto_start: read_bool(signal, "autoStart", true),
            // Unset means the daemon decides when to start receiving.
            receive_mode: read_enum(signal, "receiveMode", &["on-start", "manual"], ""),
            ignore_attachments: read_bool(signal, "ignoreAttachments", false),
            ignore_stories: read_bool(signal, "ignoreStories", false),
            send_read_receipts: read_bool(signal, "sendReadReceipts", false),
            allow_from: read_list(signal, "allowFrom"),
            media_max_mb: read_num_string(signal, "mediaMaxMb"),
        }
    }
}

impl Default for SignalForm {
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
        let form = SignalForm::from_document(&json!({}));
        assert!(form.enabled);
        assert!(form.auto_start);
        assert_eq!(form.receive_mode, "");
        assert!(!form.ignore_attachments);
        assert!(!form.send_read_receipts);
    }

    #[test]
    fn receive_mode_only_accepts_known_values() {
        for (stored, expected) in [
            (json!("on-start"), "on-start"),
            (json!("manual"), "manual"),
            (json!("always"), ""),
            (json!(true), ""),
        ] {
            let doc = json!({ "signal": { "receiveMode": stored } });
            assert_eq!(SignalForm::from_document(&doc).receive_mode, expected);
        }
    }

    #[test]
    fn endpoint_fields_read_defensively() {
        let doc = json!({
            "signal": {
                "account": "+15550100",
                "httpUrl": "http://127.0.0.1:8686",
                "httpPort": 8686,
                "autoStart": false,
                "allowFrom": ["+15550101", "+15550102"],
            }
        });
        let form = SignalForm::from_document(&doc);
        assert_eq!(form.account, "+15550100");
        assert_eq!(form.http_port, "8686");
        assert!(!form.auto_start);
        assert_eq!(form.allow_from, "+15550101, +15550102");
    }
}
