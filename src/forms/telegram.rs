use serde::Serialize;
use serde_json::Value;

use super::{channel, is_truthy, read_bool, read_str, read_str_or_list, subtree};

/// Telegram connection form. Group-wide behavior lives under the `"*"`
/// wildcard entry of `telegram.groups`; the form surfaces that entry's
/// mention flag and whether the wildcard exists at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramForm {
    pub token: String,
    pub require_mention: bool,
    pub groups_wildcard_enabled: bool,
    pub allow_from: String,
    pub proxy: String,
    pub webhook_url: String,
    pub webhook_secret: String,
    pub webhook_path: String,
}

impl TelegramForm {
    #[must_use]
    pub fn from_document(doc: &Value) -> Self {
        let telegram = channel(doc, "telegram");
        let groups = subtree(telegram, "groups");
        let wildcard = subtree(groups, "*");
        Self {
            token: read_str(telegram, "botToken"),
            require_mention: read_bool(wildcard, "requireMention", true),
            // Any wildcard value marks the group default as configured, even
            // one the mention lookup cannot read fields from.
            groups_wildcard_enabled: groups.get("*").is_some_and(is_truthy),
            allow_from: read_str_or_list(telegram, "allowFrom"),
            proxy: read_str(telegram, "proxy"),
            webhook_url: read_str(telegram, "webhookUrl"),
            webhook_secret: read_str(telegram, "webhookSecret"),
            webhook_path: read_str(telegram, "webhookPath"),
        }
    }
}

impl Default for TelegramForm {
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
        let form = TelegramForm::from_document(&json!({}));
        assert_eq!(
            form,
            TelegramForm {
                token: String::new(),
                require_mention: true,
                groups_wildcard_enabled: false,
                allow_from: String::new(),
                proxy: String::new(),
                webhook_url: String::new(),
                webhook_secret: String::new(),
                webhook_path: String::new(),
            }
        );
    }

    #[test]
    fn wildcard_group_controls_mention_default() {
        let doc = json!({
            "telegram": {
                "botToken": "12345:abc",
                "groups": { "*": { "requireMention": false } },
            }
        });
        let form = TelegramForm::from_document(&doc);
        assert_eq!(form.token, "12345:abc");
        assert!(!form.require_mention);
        assert!(form.groups_wildcard_enabled);
    }

    #[test]
    fn scalar_wildcard_still_counts_as_configured() {
        let doc = json!({ "telegram": { "groups": { "*": "yes" } } });
        let form = TelegramForm::from_document(&doc);
        assert!(form.groups_wildcard_enabled);
        // The scalar entry has no readable mention flag.
        assert!(form.require_mention);
    }

    #[test]
    fn falsy_wildcard_is_not_configured() {
        for wildcard in [json!(false), json!(0), json!(""), json!(null)] {
            let doc = json!({ "telegram": { "groups": { "*": wildcard } } });
            assert!(
                !TelegramForm::from_document(&doc).groups_wildcard_enabled,
                "wildcard {doc} must not count as configured"
            );
        }
    }

    #[test]
    fn allow_from_accepts_sequence_or_string() {
        let doc = json!({ "telegram": { "allowFrom": [123, " 456 ", null] } });
        assert_eq!(TelegramForm::from_document(&doc).allow_from, "123, 456");

        let doc = json!({ "telegram": { "allowFrom": "777, 888" } });
        assert_eq!(TelegramForm::from_document(&doc).allow_from, "777, 888");

        let doc = json!({ "telegram": { "allowFrom": 777 } });
        assert_eq!(TelegramForm::from_document(&doc).allow_from, "");
    }

    #[test]
    fn mistyped_section_yields_defaults() {
        let form = TelegramForm::from_document(&json!({ "telegram": "oops" }));
        assert_eq!(form, TelegramForm::default());
    }
}
