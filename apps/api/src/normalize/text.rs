//! Text normalization applied to raw CV text before any extraction heuristic runs.

use once_cell::sync::Lazy;
use regex::Regex;

/// Glyphs treated as list bullets; all of them normalize to `-`.
pub const BULLET_GLYPHS: &[char] = &['•', '·', '‣', '⁃'];

static RE_SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static RE_NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_PAGINATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*[0-9]+[ \t]*/[ \t]*[0-9]+[ \t]*\n").unwrap());

/// Bullets → `-`, CRLF/CR → LF, space runs → one space, 3+ newlines → one blank line, trimmed.
pub fn normalize_text(text: &str) -> String {
    let t: String = text
        .chars()
        .map(|c| if BULLET_GLYPHS.contains(&c) { '-' } else { c })
        .collect();
    let t = t.replace("\r\n", "\n").replace('\r', "\n");
    let t = RE_SPACE_RUNS.replace_all(&t, " ");
    let t = RE_NEWLINE_RUNS.replace_all(&t, "\n\n");
    t.trim().to_string()
}

/// Removes page counters such as `1 / 2` that sit alone on a line.
pub fn strip_pagination(text: &str) -> String {
    // Adjacent counters share a newline, so one pass can miss every other one.
    let mut current = text.to_string();
    loop {
        let next = RE_PAGINATION.replace_all(&current, "\n").to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Non-blank trimmed lines, in order.
pub fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}
