//! Display helpers.

use regex::Regex;
use std::sync::LazyLock;

static SECRET_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^(\s*"(?:apiKey|accessToken|botToken|appToken|token|webhookSecret|signingSecret|secret|password)"\s*:\s*)"[^"]+""#,
    )
    .expect("secret field regex must compile")
});

/// Mask token-bearing fields in serialized configuration text for display.
/// Only quoted string values are touched; empty strings and every other line
/// pass through unchanged. Never applied to text sent to the gateway.
#[must_use]
pub fn mask_secret_fields(text: &str) -> String {
    SECRET_FIELD_RE.replace_all(text, "$1\"***\"").into_owned()
}

/// Render a secret field for the summary view: presence only, never the
/// value, with a note when a gateway environment variable pins the field.
#[must_use]
pub fn secret_display(value: &str, locked: bool) -> String {
    let state = if value.is_empty() { "(unset)" } else { "***" };
    if locked {
        format!("{state} [locked by gateway env]")
    } else {
        state.to_string()
    }
}
