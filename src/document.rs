//! Path-addressable operations over loosely-typed configuration documents.
//!
//! The gateway exchanges configuration as arbitrary JSON. This module owns the
//! three primitives the sync layer builds on: walking/patching a document at a
//! key path, removing at a path, and serializing the document back to the
//! canonical raw text the gateway parser accepts.
//!
//! Addressing follows JS object/array semantics, because that is what the
//! gateway's own tooling produces: an index segment on a mapping addresses the
//! stringified key (`doc[2]` is `doc["2"]`), and an all-digit key segment on a
//! sequence addresses the index. A node a segment cannot address (a scalar in
//! the way, a non-index key on a sequence) is replaced by the container the
//! segment requires, so a set followed by a get at the same path always yields
//! the value that was written. Sequence gap padding is bounded by
//! [`MAX_PADDED_INDEX`]; writes farther out are rejected with a typed error.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use thiserror::Error;

/// One step of a document path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{k}"),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Largest sequence position [`set_path`] will create by padding a gap with
/// nulls. Mapping keys are unaffected: an all-digit key of any size still
/// addresses a mapping entry.
pub const MAX_PADDED_INDEX: usize = 9_999;

/// Errors from parsing or applying a dotted path expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
    #[error("sequence index {0} is past the padding limit {limit}", limit = MAX_PADDED_INDEX)]
    IndexTooLarge(usize),
}

/// Parse a dotted path (`telegram.groups.*.requireMention`, `a.items.0`) into
/// segments. All-digit segments become indices; everything else is a key.
pub fn parse_path(input: &str) -> std::result::Result<Vec<PathSegment>, PathError> {
    if input.trim().is_empty() {
        return Err(PathError::Empty);
    }
    input
        .split('.')
        .enumerate()
        .map(|(pos, seg)| {
            if seg.is_empty() {
                return Err(PathError::EmptySegment(pos));
            }
            Ok(match digit_index(seg) {
                Some(i) => PathSegment::Index(i),
                None => PathSegment::Key(seg.to_string()),
            })
        })
        .collect()
}

/// Render a path back to its dotted form, for log lines and error messages.
pub fn format_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Read the value at `path`, mirroring the addressing rules of [`set_path`].
pub fn get_path<'a>(doc: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let mut node = doc;
    for seg in path {
        node = match node {
            Value::Object(map) => map.get(&mapping_key(seg))?,
            Value::Array(arr) => arr.get(sequence_index(seg)?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Assign `value` at `path`, creating missing intermediates: an empty sequence
/// where the next segment is an index, an empty mapping otherwise. Setting a
/// sequence index past the end pads the gap with nulls, up to
/// [`MAX_PADDED_INDEX`]; a write farther out is rejected, and may leave
/// intermediates created while walking. An empty path is a no-op. The
/// document is mutated in place; callers that need the previous state intact
/// must clone first.
pub fn set_path(
    doc: &mut Value,
    path: &[PathSegment],
    value: Value,
) -> std::result::Result<(), PathError> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };
    let mut node = doc;
    for (depth, seg) in parents.iter().enumerate() {
        let fill = match &path[depth + 1] {
            PathSegment::Key(_) => Value::Object(Map::new()),
            PathSegment::Index(_) => Value::Array(Vec::new()),
        };
        node = slot(node, seg, fill)?;
    }
    *slot(node, last, Value::Null)? = value;
    Ok(())
}

/// Delete the value at `path` if the whole path resolves. Any miss (absent
/// intermediate, out-of-range index, scalar in the way) is a silent no-op.
/// Returns whether something was removed. Sequence removal compacts (sibling
/// indices shift down); mapping removal keeps the remaining keys in order.
pub fn remove_path(doc: &mut Value, path: &[PathSegment]) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let mut node = doc;
    for seg in parents {
        node = match step_mut(node, seg) {
            Some(next) => next,
            None => return false,
        };
    }
    match node {
        Value::Object(map) => map.shift_remove(&mapping_key(last)).is_some(),
        Value::Array(arr) => match sequence_index(last) {
            Some(i) if i < arr.len() => {
                arr.remove(i);
                true
            }
            _ => false,
        },
        _ => false,
    }
}

/// Serialize a document to the canonical raw text form: two-space-indented
/// JSON, byte-identical for equal documents, parseable by the gateway back
/// into an equivalent document.
pub fn serialize_document(doc: &Value) -> Result<String> {
    serde_json::to_string_pretty(doc).context("serializing configuration document")
}

// ── Addressing internals ────────────────────────────────────────

fn digit_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

/// The sequence position a segment addresses, when it addresses one.
fn sequence_index(seg: &PathSegment) -> Option<usize> {
    match seg {
        PathSegment::Index(i) => Some(*i),
        PathSegment::Key(k) => digit_index(k),
    }
}

/// The mapping key a segment addresses (always resolvable on a mapping).
fn mapping_key(seg: &PathSegment) -> String {
    match seg {
        PathSegment::Key(k) => k.clone(),
        PathSegment::Index(i) => i.to_string(),
    }
}

fn step_mut<'a>(node: &'a mut Value, seg: &PathSegment) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(&mapping_key(seg)),
        Value::Array(arr) => sequence_index(seg).and_then(move |i| arr.get_mut(i)),
        _ => None,
    }
}

/// Borrow the child slot `seg` addresses inside `node`, normalizing `node`
/// first: anything the segment cannot address is replaced by the container
/// the segment requires. A missing mapping entry is created as `fill`. An
/// index past [`MAX_PADDED_INDEX`] that would need padding is rejected
/// before the node is touched.
fn slot<'a>(
    node: &'a mut Value,
    seg: &PathSegment,
    fill: Value,
) -> std::result::Result<&'a mut Value, PathError> {
    // The sequence position the segment lands on, decided up front: existing
    // sequences keep index-addressable segments, and anything that is not a
    // container becomes a sequence when the segment is an index.
    let index = match node {
        Value::Object(_) => None,
        Value::Array(_) => sequence_index(seg),
        _ => match seg {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(_) => None,
        },
    };
    if let Some(i) = index {
        let len = node.as_array().map_or(0, Vec::len);
        if i >= len && i > MAX_PADDED_INDEX {
            return Err(PathError::IndexTooLarge(i));
        }
    }
    match index {
        Some(_) if !node.is_array() => *node = Value::Array(Vec::new()),
        None if !node.is_object() => *node = Value::Object(Map::new()),
        _ => {}
    }
    Ok(match node {
        Value::Array(arr) => {
            // Sequences survive normalization only for index-addressable
            // segments, so the position is always present here.
            let i = index.unwrap_or_default();
            if i >= arr.len() {
                arr.resize(i + 1, Value::Null);
            }
            &mut arr[i]
        }
        Value::Object(map) => map.entry(mapping_key(seg)).or_insert(fill),
        _ => unreachable!("slot target was normalized to a container"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(input: &str) -> Vec<PathSegment> {
        parse_path(input).expect("test path parses")
    }

    #[test]
    fn parse_path_splits_keys_and_indices() {
        assert_eq!(
            parse_path("discord.guilds.0.slug").unwrap(),
            vec![
                PathSegment::Key("discord".into()),
                PathSegment::Key("guilds".into()),
                PathSegment::Index(0),
                PathSegment::Key("slug".into()),
            ]
        );
    }

    #[test]
    fn parse_path_keeps_wildcard_key() {
        assert_eq!(
            parse_path("telegram.groups.*").unwrap(),
            vec![
                PathSegment::Key("telegram".into()),
                PathSegment::Key("groups".into()),
                PathSegment::Key("*".into()),
            ]
        );
    }

    #[test]
    fn parse_path_rejects_empty_input_and_segments() {
        assert_eq!(parse_path(""), Err(PathError::Empty));
        assert_eq!(parse_path("  "), Err(PathError::Empty));
        assert_eq!(parse_path("a..b"), Err(PathError::EmptySegment(1)));
    }

    #[test]
    fn set_creates_nested_mappings() {
        let mut doc = json!({});
        set_path(&mut doc, &path("telegram.botToken"), json!("abc")).unwrap();
        assert_eq!(doc, json!({ "telegram": { "botToken": "abc" } }));
    }

    #[test]
    fn set_creates_sequence_for_index_segment() {
        let mut doc = json!({});
        set_path(&mut doc, &path("telegram.allowFrom.0"), json!("123")).unwrap();
        assert_eq!(doc, json!({ "telegram": { "allowFrom": ["123"] } }));
    }

    #[test]
    fn set_pads_sparse_indices_with_null() {
        let mut doc = json!({ "items": [] });
        set_path(&mut doc, &path("items.2"), json!("x")).unwrap();
        assert_eq!(doc, json!({ "items": [null, null, "x"] }));
    }

    #[test]
    fn set_pads_up_to_the_padding_limit() {
        let mut doc = json!({ "items": [] });
        let p = path(&format!("items.{MAX_PADDED_INDEX}"));
        set_path(&mut doc, &p, json!("edge")).unwrap();
        let items = doc["items"].as_array().unwrap();
        assert_eq!(items.len(), MAX_PADDED_INDEX + 1);
        assert_eq!(get_path(&doc, &p), Some(&json!("edge")));
    }

    #[test]
    fn set_rejects_indices_past_the_padding_limit() {
        let over = MAX_PADDED_INDEX + 1;
        let mut doc = json!({ "items": ["a"] });
        assert_eq!(
            set_path(&mut doc, &path(&format!("items.{over}")), json!("x")),
            Err(PathError::IndexTooLarge(over))
        );
        assert_eq!(doc, json!({ "items": ["a"] }));

        // The largest index a path can express must fail just as cleanly.
        let mut doc = json!({});
        assert_eq!(
            set_path(&mut doc, &path("items.18446744073709551615"), json!("x")),
            Err(PathError::IndexTooLarge(usize::MAX))
        );
        // The walk had already created the intermediate sequence.
        assert_eq!(doc, json!({ "items": [] }));
    }

    #[test]
    fn set_within_an_existing_sequence_needs_no_padding() {
        let mut doc = json!({});
        doc["items"] = Value::Array(vec![Value::Null; MAX_PADDED_INDEX + 11]);
        let p = path(&format!("items.{}", MAX_PADDED_INDEX + 5));
        set_path(&mut doc, &p, json!("ok")).unwrap();
        assert_eq!(get_path(&doc, &p), Some(&json!("ok")));
    }

    #[test]
    fn set_replaces_scalar_in_the_way() {
        let mut doc = json!({ "telegram": "oops" });
        set_path(&mut doc, &path("telegram.botToken"), json!("abc")).unwrap();
        assert_eq!(doc, json!({ "telegram": { "botToken": "abc" } }));
    }

    #[test]
    fn set_numeric_segment_addresses_mapping_key() {
        // Guild collections are mappings keyed by snowflake ids; a dotted path
        // parses those ids as indices and they must still land as keys.
        let mut doc = json!({ "discord": { "guilds": { "123": { "slug": "old" } } } });
        set_path(&mut doc, &path("discord.guilds.123.slug"), json!("new")).unwrap();
        assert_eq!(
            doc,
            json!({ "discord": { "guilds": { "123": { "slug": "new" } } } })
        );
    }

    #[test]
    fn set_snowflake_segment_addresses_a_mapping_not_a_sequence() {
        // Guild ids parse as indices far past the padding limit; on a
        // mapping they must still land as keys.
        let mut doc = json!({ "discord": { "guilds": {} } });
        set_path(
            &mut doc,
            &path("discord.guilds.1180435216308906034.slug"),
            json!("home"),
        )
        .unwrap();
        assert_eq!(
            doc,
            json!({ "discord": { "guilds": { "1180435216308906034": { "slug": "home" } } } })
        );
    }

    #[test]
    fn set_then_get_round_trips() {
        let cases = ["a", "a.b.c", "a.0", "a.2.b", "roots.*.deep.3"];
        for case in cases {
            let mut doc = json!({});
            let p = path(case);
            set_path(&mut doc, &p, json!({ "v": [1, 2, 3] })).unwrap();
            assert_eq!(
                get_path(&doc, &p),
                Some(&json!({ "v": [1, 2, 3] })),
                "round trip failed for {case}"
            );
        }
    }

    #[test]
    fn set_empty_path_is_a_no_op() {
        let mut doc = json!({ "keep": true });
        set_path(&mut doc, &[], json!("ignored")).unwrap();
        assert_eq!(doc, json!({ "keep": true }));
    }

    #[test]
    fn set_does_not_touch_the_source_of_a_clone() {
        let original = json!({ "telegram": { "botToken": "old" } });
        let mut copy = original.clone();
        set_path(&mut copy, &path("telegram.botToken"), json!("new")).unwrap();
        set_path(&mut copy, &path("discord.token"), json!("d")).unwrap();
        assert_eq!(original, json!({ "telegram": { "botToken": "old" } }));
    }

    #[test]
    fn remove_missing_path_is_a_no_op() {
        let original = json!({ "a": { "b": 1 } });
        let mut doc = original.clone();
        assert!(!remove_path(&mut doc, &path("a.c.d")));
        assert!(!remove_path(&mut doc, &path("x")));
        assert!(!remove_path(&mut doc, &path("a.b.c")));
        assert!(!remove_path(&mut doc, &[]));
        assert_eq!(doc, original);
    }

    #[test]
    fn remove_compacts_sequences() {
        let mut doc = json!({ "list": ["a", "b", "c"] });
        assert!(remove_path(&mut doc, &path("list.1")));
        assert_eq!(doc, json!({ "list": ["a", "c"] }));
        assert!(!remove_path(&mut doc, &path("list.5")));
    }

    #[test]
    fn remove_preserves_order_of_remaining_keys() {
        let mut doc = json!({ "c": 1, "a": 2, "b": 3 });
        assert!(remove_path(&mut doc, &path("a")));
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["c", "b"]);
    }

    #[test]
    fn serialize_is_deterministic() {
        let doc = json!({ "z": [1, true, "s"], "a": { "nested": null } });
        let first = serialize_document(&doc).unwrap();
        let second = serialize_document(&doc).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn serialize_round_trips_through_the_parser() {
        let doc = json!({
            "telegram": { "botToken": "abc", "allowFrom": ["1", "2"] },
            "discord": { "mediaMaxMb": 25, "enabled": false },
            "note": "unicode \u{1f980} and \"quotes\"",
        });
        let text = serialize_document(&doc).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn serialize_preserves_insertion_order() {
        let mut doc = json!({});
        set_path(&mut doc, &path("zulu"), json!(1)).unwrap();
        set_path(&mut doc, &path("alpha"), json!(2)).unwrap();
        let text = serialize_document(&doc).unwrap();
        assert!(
            text.find("zulu").unwrap() < text.find("alpha").unwrap(),
            "keys must keep insertion order: {text}"
        );
    }

    #[test]
    fn format_path_is_dotted() {
        assert_eq!(format_path(&path("a.b.0")), "a.b.0");
    }
}
