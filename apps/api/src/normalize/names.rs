//! Full-name inference for headers that arrive without one.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::text::{content_lines, normalize_text};

/// Placeholder for any required string nobody could fill.
pub const PLACEHOLDER: &str = "—";

/// Lines scanned by the sanitizer when backfilling a name.
pub const NAME_SCAN_LINES: usize = 6;

static RE_NAME_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-ZÀÂÄÇÉÈÊËÏÎÔÖÙÛÜŸ][\p{L}'-]+$").unwrap());

/// First line among the first `max_lines` non-blank lines holding 2–5 name-shaped words.
pub fn name_from_lines<'a>(lines: impl IntoIterator<Item = &'a str>, max_lines: usize) -> Option<String> {
    lines.into_iter().take(max_lines).find_map(|line| {
        let caps: Vec<&str> = line
            .split_whitespace()
            .filter(|w| RE_NAME_WORD.is_match(w))
            .collect();
        (2..=5).contains(&caps.len()).then(|| caps.join(" "))
    })
}

/// `jane.doe@x.com` → `Jane Doe` (at most three local-part segments).
pub fn name_from_email(email: &str) -> Option<String> {
    let (local, _) = email.split_once('@')?;
    let parts: Vec<String> = local
        .split(|c| c == '.' || c == '_' || c == '-')
        .filter(|p| !p.is_empty())
        .take(3)
        .map(capitalize)
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Tries the source text first, then the email; `None` when both fail.
pub fn guess_full_name(source_text: &str, email: Option<&str>) -> Option<String> {
    let text = normalize_text(source_text);
    name_from_lines(content_lines(&text), NAME_SCAN_LINES).or_else(|| email.and_then(name_from_email))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
