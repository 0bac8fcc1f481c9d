//! Date normalization: loosely formatted dates to `YYYY-MM` or `Present`.

use std::fmt;

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A calendar month. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Builds a month, clamping `month` into 1–12.
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month: month.clamp(1, 12),
        }
    }

    pub fn current() -> Self {
        let now = Utc::now();
        Self::new(now.year(), now.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A normalized résumé date: a month, or the literal `Present`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResumeDate {
    Month(YearMonth),
    Present,
}

impl ResumeDate {
    /// True when this is a month strictly after `reference`. `Present` never is.
    pub fn is_after(&self, reference: YearMonth) -> bool {
        match self {
            ResumeDate::Month(ym) => *ym > reference,
            ResumeDate::Present => false,
        }
    }
}

impl fmt::Display for ResumeDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumeDate::Month(ym) => ym.fmt(f),
            ResumeDate::Present => f.write_str("Present"),
        }
    }
}

impl Serialize for ResumeDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResumeDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        normalize_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("unrecognized date '{raw}'")))
    }
}

static RE_PRESENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(present|présent|now)$").unwrap());
static RE_YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})[-/]([0-9]{1,2})$").unwrap());
static RE_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2})/([0-9]{4})$").unwrap());
static RE_DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})$").unwrap());
static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{4})$").unwrap());

/// Normalizes a date string.
///
/// Accepted shapes, in precedence order:
/// - `present` / `présent` / `now` (any case) → `Present`
/// - `YYYY-MM`, `YYYY/MM`
/// - `MM/YYYY`
/// - `DD/MM/YYYY` (day discarded)
/// - `YYYY` → January
///
/// Anything else is `None`; callers drop the field.
pub fn normalize_date(input: &str) -> Option<ResumeDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if RE_PRESENT.is_match(s) {
        return Some(ResumeDate::Present);
    }
    if let Some(c) = RE_YEAR_MONTH.captures(s) {
        return month_of(&c[1], &c[2]);
    }
    if let Some(c) = RE_MONTH_YEAR.captures(s) {
        return month_of(&c[2], &c[1]);
    }
    if let Some(c) = RE_DAY_MONTH_YEAR.captures(s) {
        return month_of(&c[3], &c[2]);
    }
    if let Some(c) = RE_YEAR.captures(s) {
        return month_of(&c[1], "1");
    }
    None
}

/// Like [`normalize_date`], but accepts any JSON value; bare numbers are read as text.
pub fn normalize_date_value(value: &Value) -> Option<ResumeDate> {
    match value {
        Value::String(s) => normalize_date(s),
        Value::Number(n) => normalize_date(&n.to_string()),
        _ => None,
    }
}

/// True when the text is a `present`-like marker.
pub fn is_present_marker(s: &str) -> bool {
    RE_PRESENT.is_match(s.trim())
}

fn month_of(year: &str, month: &str) -> Option<ResumeDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    Some(ResumeDate::Month(YearMonth::new(year, month)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(s: &str) -> Option<String> {
        normalize_date(s).map(|d| d.to_string())
    }

    #[test]
    fn test_year_month_passthrough() {
        assert_eq!(norm("2020-03").as_deref(), Some("2020-03"));
        assert_eq!(norm("2020/3").as_deref(), Some("2020-03"));
    }

    #[test]
    fn test_month_year() {
        assert_eq!(norm("3/2020").as_deref(), Some("2020-03"));
        assert_eq!(norm("12/2021").as_deref(), Some("2021-12"));
    }

    #[test]
    fn test_day_month_year_discards_day() {
        assert_eq!(norm("03/03/2020").as_deref(), Some("2020-03"));
        assert_eq!(norm("25/11/2018").as_deref(), Some("2018-11"));
    }

    #[test]
    fn test_bare_year_defaults_to_january() {
        assert_eq!(norm("2020").as_deref(), Some("2020-01"));
    }

    #[test]
    fn test_present_variants() {
        assert_eq!(norm("present").as_deref(), Some("Present"));
        assert_eq!(norm("Présent").as_deref(), Some("Present"));
        assert_eq!(norm("NOW").as_deref(), Some("Present"));
    }

    #[test]
    fn test_month_is_clamped() {
        assert_eq!(norm("2020-00").as_deref(), Some("2020-01"));
        assert_eq!(norm("2020-13").as_deref(), Some("2020-12"));
        assert_eq!(norm("99/2020").as_deref(), Some("2020-12"));
    }

    #[test]
    fn test_unrecognized_is_none() {
        assert_eq!(norm("not a date"), None);
        assert_eq!(norm(""), None);
        assert_eq!(norm("March 2020"), None);
        assert_eq!(norm("2020-03-01"), None);
    }

    #[test]
    fn test_value_variants() {
        assert_eq!(
            normalize_date_value(&json!(2019)).map(|d| d.to_string()),
            Some("2019-01".to_string())
        );
        assert_eq!(normalize_date_value(&json!(null)), None);
        assert_eq!(normalize_date_value(&json!(["2019"])), None);
    }

    #[test]
    fn test_normalized_output_is_stable() {
        for raw in ["2020-03", "3/2020", "03/03/2020", "2020", "present"] {
            let once = norm(raw).unwrap();
            assert_eq!(norm(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn test_is_after() {
        let reference = YearMonth::new(2024, 6);
        assert!(ResumeDate::Month(YearMonth::new(2024, 7)).is_after(reference));
        assert!(!ResumeDate::Month(YearMonth::new(2024, 6)).is_after(reference));
        assert!(!ResumeDate::Present.is_after(reference));
    }

    #[test]
    fn test_serde_as_string() {
        let d = ResumeDate::Month(YearMonth::new(2021, 2));
        assert_eq!(serde_json::to_value(d).unwrap(), json!("2021-02"));
        let back: ResumeDate = serde_json::from_value(json!("Present")).unwrap();
        assert_eq!(back, ResumeDate::Present);
        assert!(serde_json::from_value::<ResumeDate>(json!("soon")).is_err());
    }
}
