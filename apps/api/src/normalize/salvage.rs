//! Recovery of a JSON value from noisy generator output.
//!
//! Generators wrap JSON in code fences, prepend chatter, leave trailing commas and
//! comments. [`salvage_json`] tries progressively looser readings and gives up with
//! `None` rather than inventing structure.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```(?:json)?").unwrap());
static RE_BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static RE_LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*//[^\n]*$").unwrap());
static RE_TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Parses `text` as JSON, tolerating the usual generator noise.
///
/// Attempts, in order: the cleaned text as a whole, the body of the first code fence,
/// the first balanced `{…}`/`[…]` region, then the span from the first opening to the
/// last closing bracket.
pub fn salvage_json(text: &str) -> Option<Value> {
    let cleaned = pre_clean(text);
    if let Ok(value) = serde_json::from_str(&cleaned) {
        return Some(value);
    }
    if let Some(payload) = fenced_payload(text) {
        if let Ok(value) = serde_json::from_str(&pre_clean(payload)) {
            return Some(value);
        }
    }
    if let Some(region) = balanced_region(&cleaned) {
        if let Ok(value) = serde_json::from_str(region) {
            return Some(value);
        }
    }
    let start = cleaned.find(['{', '['].as_slice())?;
    let end = cleaned.rfind(['}', ']'].as_slice())?;
    (end > start)
        .then(|| serde_json::from_str(&cleaned[start..=end]).ok())
        .flatten()
}

/// Body of the first ```json ... ``` or ``` ... ``` block, ignoring text around it.
fn fenced_payload(text: &str) -> Option<&str> {
    let (_, opened) = text.split_once("```")?;
    let opened = opened
        .strip_prefix("json")
        .or_else(|| opened.strip_prefix("JSON"))
        .unwrap_or(opened);
    let (body, _) = opened.split_once("```")?;
    Some(body.trim())
}

fn pre_clean(text: &str) -> String {
    let text = text.replace(['\u{FEFF}', '\u{200B}'].as_slice(), "");
    let text = RE_FENCE.replace_all(&text, "");
    let text = text
        .replace(['\u{201C}', '\u{201D}'].as_slice(), "\"")
        .replace(['\u{2018}', '\u{2019}'].as_slice(), "'");
    let text = RE_BLOCK_COMMENT.replace_all(&text, "");
    let text = RE_LINE_COMMENT.replace_all(&text, "");
    let text = RE_TRAILING_COMMA.replace_all(&text, "$1");
    text.trim().to_string()
}

/// The first bracket-balanced region, skipping brackets inside string literals.
fn balanced_region(text: &str) -> Option<&str> {
    let start = text.find(['{', '['].as_slice())?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_payload() {
        assert_eq!(
            fenced_payload("Sure:\n```json\n{\"key\": \"value\"}\n```\nDone."),
            Some("{\"key\": \"value\"}")
        );
        assert_eq!(fenced_payload("```\n[1, 2]\n```"), Some("[1, 2]"));
        assert_eq!(fenced_payload("```json\n{\"open\": true}"), None);
        assert_eq!(fenced_payload("no fences"), None);
    }

    #[test]
    fn test_fence_wins_over_braces_in_chatter() {
        let input = "Use the shape {\"a\": 0} as a guide.\n```json\n{\"b\": 1,}\n```";
        assert_eq!(salvage_json(input), Some(json!({"b": 1})));
    }

    #[test]
    fn test_plain_json() {
        assert_eq!(salvage_json(r#"{"a": 1}"#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_chatter_around_fenced_payload() {
        let input = "Here is the CV:\n```json\n{\"header\": {\"fullName\": \"Jane\"}}\n```\nHope it helps!";
        assert_eq!(
            salvage_json(input),
            Some(json!({"header": {"fullName": "Jane"}}))
        );
    }

    #[test]
    fn test_trailing_commas_comments_and_smart_quotes() {
        let input = "{\n  // generated\n  \u{201C}skills\u{201D}: [\"Rust\", \"SQL\",],\n  /* note */ \"x\": 1,\n}";
        assert_eq!(
            salvage_json(input),
            Some(json!({"skills": ["Rust", "SQL"], "x": 1}))
        );
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_balancing() {
        let input = r#"result: {"summary": "uses {braces} and ] brackets"} trailing {junk"#;
        assert_eq!(
            salvage_json(input),
            Some(json!({"summary": "uses {braces} and ] brackets"}))
        );
    }

    #[test]
    fn test_hopeless_input() {
        assert_eq!(salvage_json("no json here"), None);
        assert_eq!(salvage_json("{ unclosed"), None);
        assert_eq!(salvage_json(""), None);
    }
}
