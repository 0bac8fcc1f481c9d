//! Small combinators for reading untyped (possibly hostile) JSON candidates.
//!
//! Every function here is total: anything unusable reads as absent.

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

static EMPTY_OBJECT: Lazy<Map<String, Value>> = Lazy::new(Map::new);

/// Trimmed string content of a scalar; blank strings and non-scalars are `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Trimmed, non-blank string value; numbers are not accepted.
pub fn non_blank_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Evaluates `keys` left to right and returns the first non-blank string field.
pub fn first_non_blank(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_match(obj, keys, non_blank_str)
}

/// Evaluates `keys` left to right and returns the first field `read` accepts.
pub fn first_match<T>(
    obj: &Map<String, Value>,
    keys: &[&str],
    read: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(read)
}

/// Coerces a value into a list of non-blank trimmed strings.
///
/// A bare string becomes a one-element list, array elements that are strings,
/// numbers or `{ "text": ... }` / `{ "name": ... }` objects are kept, everything else is dropped.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(list_item_text).collect(),
        Value::String(_) => scalar_text(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn list_item_text(item: &Value) -> Option<String> {
    match item {
        Value::Object(obj) => first_non_blank(obj, &["text", "name"]),
        other => scalar_text(other),
    }
}

/// Like [`string_list`] but `None` when nothing survives.
pub fn non_empty_list(value: &Value) -> Option<Vec<String>> {
    let list = string_list(value);
    (!list.is_empty()).then_some(list)
}

/// The object behind `value`, or an empty map for any other shape.
pub fn as_object(value: Option<&Value>) -> &Map<String, Value> {
    value.and_then(Value::as_object).unwrap_or(&EMPTY_OBJECT)
}

/// Truncates to at most `max` characters, keeping whole code points.
pub fn clamp_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Case- and whitespace-insensitive comparison key.
pub fn fold_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
