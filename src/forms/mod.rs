//! Channel form projections of the configuration document.
//!
//! Every snapshot refresh derives one flat, display-ready form per messaging
//! channel from the raw document. Derivation is total: any shape the gateway
//! can hand back, including a missing channel section, a scalar where a
//! mapping was expected, or a legacy layout, normalizes to a fully populated
//! form without errors. Absent or mistyped fields take the documented channel
//! default, so `Form::default()` is exactly the projection of an empty
//! document.
//!
//! Forms are read-only views. Edits flow the other way, as path mutations
//! against the document itself, and the next projection picks them up.

mod discord;
mod imessage;
mod signal;
mod slack;
mod telegram;

pub use discord::{DiscordActionForm, DiscordForm, DiscordGuildChannelForm, DiscordGuildForm};
pub use imessage::IMessageForm;
pub use signal::SignalForm;
pub use slack::{SlackActionForm, SlackChannelForm, SlackForm};
pub use telegram::TelegramForm;

use serde::Serialize;
use serde_json::{Map, Value};

static NULL: Value = Value::Null;

/// All channel forms, derived together from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelForms {
    pub telegram: TelegramForm,
    pub discord: DiscordForm,
    pub slack: SlackForm,
    pub signal: SignalForm,
    pub imessage: IMessageForm,
}

impl ChannelForms {
    #[must_use]
    pub fn from_document(doc: &Value) -> Self {
        Self {
            telegram: TelegramForm::from_document(doc),
            discord: DiscordForm::from_document(doc),
            slack: SlackForm::from_document(doc),
            signal: SignalForm::from_document(doc),
            imessage: IMessageForm::from_document(doc),
        }
    }
}

// ── Field readers ───────────────────────────────────────────────
//
// Shared vocabulary for the per-channel normalizers. Each reader tolerates
// any node shape: a lookup on a scalar or sequence simply misses and yields
// the caller's default.

/// The named channel section of a document. Non-mapping documents have no
/// sections, so every field read inside them falls back to its default.
pub(crate) fn channel<'a>(doc: &'a Value, name: &str) -> &'a Value {
    doc.get(name).unwrap_or(&NULL)
}

/// The mapping stored under `key`, or an empty stand-in when the value is
/// missing or not a mapping.
pub(crate) fn subtree<'a>(node: &'a Value, key: &str) -> &'a Value {
    node.get(key).filter(|v| v.is_object()).unwrap_or(&NULL)
}

pub(crate) fn read_str(node: &Value, key: &str) -> String {
    node.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn read_bool(node: &Value, key: &str, default: bool) -> bool {
    node.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Numeric field rendered for display. Anything that is not a JSON number,
/// including numeric strings, renders empty.
pub(crate) fn read_num_string(node: &Value, key: &str) -> String {
    match node.get(key) {
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// String field constrained to `allowed`; everything else takes `fallback`.
pub(crate) fn read_enum(node: &Value, key: &str, allowed: &[&str], fallback: &str) -> String {
    match node.get(key).and_then(Value::as_str) {
        Some(s) if allowed.contains(&s) => s.to_string(),
        _ => fallback.to_string(),
    }
}

/// Sequence field rendered as a comma-joined list; non-sequences render empty.
pub(crate) fn read_list(node: &Value, key: &str) -> String {
    node.get(key).map(to_list).unwrap_or_default()
}

/// Field that historically accepted both a sequence and a pre-joined string.
/// Strings pass through untouched; sequences join like [`read_list`].
pub(crate) fn read_str_or_list(node: &Value, key: &str) -> String {
    match node.get(key) {
        Some(list @ Value::Array(_)) => to_list(list),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Join sequence entries as `"a, b, c"`. Entries are coerced to text the way
/// the gateway's JS tooling does, trimmed, and dropped when blank; a
/// non-sequence input joins to the empty string.
pub(crate) fn to_list(value: &Value) -> String {
    let Value::Array(items) = value else {
        return String::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let text = coerce_text(item);
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// JS `String()` coercion: nulls are blank, nested sequences join their
/// coerced entries with a bare comma, mappings render the object tag.
fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(coerce_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Mapping entries in JS enumeration order: keys that are canonical array
/// indices ascend numerically ahead of everything else, which keeps document
/// order. Snowflake ids are past the index range, so they stay in document
/// order too.
pub(crate) fn entries_in_display_order(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut indexed: Vec<(u32, &String, &Value)> = Vec::new();
    let mut named: Vec<(&String, &Value)> = Vec::new();
    for (key, value) in map {
        match array_index(key) {
            Some(i) => indexed.push((i, key, value)),
            None => named.push((key, value)),
        }
    }
    indexed.sort_unstable_by_key(|&(i, _, _)| i);
    indexed.into_iter().map(|(_, k, v)| (k, v)).chain(named).collect()
}

/// The canonical array index a key encodes, if any: digits only, no leading
/// zero, value below 2^32 - 1.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty()
        || (key.len() > 1 && key.starts_with('0'))
        || !key.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    key.parse::<u32>().ok().filter(|&i| i < u32::MAX)
}

/// Split a comma-joined list back into its entries, trimming whitespace and
/// dropping empties. Inverse of the [`to_list`] projection for scalar lists.
#[must_use]
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Presence check with loose-truthiness semantics: `false`, `0`, `""`, and
/// null count as absent, any mapping or sequence counts as present.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
