//! Merging a generator's draft with the extractor's draft of the same CV.
//!
//! The extractor reads contact details straight from the source text, so its header
//! wins and the generated draft only fills gaps. Narrative sections come from the
//! generated draft whenever it produced something. Education is append-only: entries
//! from the generated draft are added to the extracted ones unless already present.
//!
//! Both inputs are untyped; the merged value is meant to go through the sanitizer.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::normalize::coerce::{as_object, first_non_blank, fold_key, string_list};
use crate::normalize::sanitizer::{education_dates, SCHOOL_KEYS};

pub const MAX_MERGED_EDUCATION: usize = 8;

const HEADER_FIELDS: &[&str] = &["fullName", "email", "phone", "location"];
const LINK_FIELDS: &[&str] = &["linkedin", "github", "portfolio"];
const GENERATED_SECTIONS: &[&str] = &[
    "summary",
    "experience",
    "projects",
    "skills",
    "languages",
    "certifications",
    "interests",
    "otherSections",
];

pub fn merge_drafts(generated: &Value, extracted: &Value) -> Value {
    let generated = as_object(Some(generated));
    let extracted = as_object(Some(extracted));
    let mut merged = Map::new();

    merged.insert(
        "metadata".to_string(),
        merge_metadata(
            as_object(generated.get("metadata")),
            as_object(extracted.get("metadata")),
        ),
    );
    merged.insert(
        "header".to_string(),
        merge_header(
            as_object(generated.get("header")),
            as_object(extracted.get("header")),
        ),
    );
    for key in GENERATED_SECTIONS {
        if let Some(value) = pick(generated.get(*key), extracted.get(*key)) {
            merged.insert(key.to_string(), value.clone());
        }
    }
    merged.insert(
        "education".to_string(),
        Value::Array(merge_education(
            generated.get("education"),
            extracted.get("education"),
        )),
    );

    Value::Object(merged)
}

fn merge_metadata(generated: &Map<String, Value>, extracted: &Map<String, Value>) -> Value {
    let mut warnings: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for warning in [generated, extracted]
        .iter()
        .flat_map(|meta| meta.get("warnings").map(string_list).unwrap_or_default())
    {
        if seen.insert(fold_key(&warning)) {
            warnings.push(warning);
        }
    }

    let mut metadata = json!({ "sourceOrderPreserved": true, "warnings": warnings });
    if let Some(language) = pick(generated.get("language"), extracted.get("language")) {
        metadata["language"] = language.clone();
    }
    metadata
}

fn merge_header(generated: &Map<String, Value>, extracted: &Map<String, Value>) -> Value {
    let mut header = Map::new();
    for key in HEADER_FIELDS {
        if let Some(value) = pick(extracted.get(*key), generated.get(*key)) {
            header.insert(key.to_string(), value.clone());
        }
    }

    let generated_links = as_object(generated.get("links"));
    let extracted_links = as_object(extracted.get("links"));
    let links: Map<String, Value> = LINK_FIELDS
        .iter()
        .filter_map(|key| {
            pick(extracted_links.get(*key), generated_links.get(*key))
                .map(|v| (key.to_string(), v.clone()))
        })
        .collect();
    if !links.is_empty() {
        header.insert("links".to_string(), Value::Object(links));
    }
    Value::Object(header)
}

/// Extracted entries first, then generated ones not already present, keyed on
/// school and canonical dates.
fn merge_education(generated: Option<&Value>, extracted: Option<&Value>) -> Vec<Value> {
    let entries = |value: Option<&Value>| match value {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    entries(extracted)
        .into_iter()
        .chain(entries(generated))
        .filter(|entry| {
            let obj = as_object(Some(entry));
            let Some(school) = first_non_blank(obj, SCHOOL_KEYS) else {
                return false;
            };
            let dates = education_dates(obj).unwrap_or_default();
            seen.insert(format!("{}|{}", fold_key(&school), canonical_dates(&dates)))
        })
        .take(MAX_MERGED_EDUCATION)
        .collect()
}

/// `"2019 – 2021"` and `"2019-2021"` compare equal.
fn canonical_dates(dates: &str) -> String {
    dates
        .chars()
        .map(|c| if matches!(c, '–' | '—') { '-' } else { c })
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn pick<'a>(preferred: Option<&'a Value>, fallback: Option<&'a Value>) -> Option<&'a Value> {
    preferred
        .filter(|v| has_content(v))
        .or_else(|| fallback.filter(|v| has_content(v)))
}
