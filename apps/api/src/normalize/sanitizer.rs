//! Sanitizer / coercer: any JSON value → a schema-conformant [`ResumeDocument`].
//!
//! The candidate is only ever read. Every output field is rebuilt from scratch, so
//! unknown keys disappear, required strings fall back to a placeholder, and caps are
//! applied after synonyms are resolved. The function is total and idempotent: feeding
//! its serialized output back in yields the same document.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{
    Education, Experience, Header, Links, Metadata, OtherSection, Project, ResumeDocument, Skills,
};
use crate::normalize::coerce::{
    as_object, clamp_chars, first_match, first_non_blank, non_blank_str, non_empty_list,
    scalar_text, string_list,
};
use crate::normalize::dates::{is_present_marker, normalize_date, normalize_date_value, ResumeDate, YearMonth};
use crate::normalize::language::LanguageDetector;
use crate::normalize::links::clean_url;
use crate::normalize::names::{guess_full_name, PLACEHOLDER};
use crate::normalize::tables::HeuristicTables;
use crate::normalize::warnings::WarningKind;

pub const MAX_SUMMARY_CHARS: usize = 600;
pub const MAX_EXPERIENCE: usize = 6;
pub const MAX_EXPERIENCE_BULLETS: usize = 5;
pub const MAX_EDUCATION: usize = 3;
pub const MAX_PROJECTS: usize = 4;
pub const MAX_PROJECT_BULLETS: usize = 4;

// Synonym keys, read left to right.
const FULL_NAME_KEYS: &[&str] = &["fullName", "full_name", "name"];
const COMPANY_KEYS: &[&str] = &["company", "company_name", "employer", "org", "organization", "organisation"];
const TITLE_KEYS: &[&str] = &["title", "position", "role"];
const EXPERIENCE_LOCATION_KEYS: &[&str] = &["location", "city", "place"];
const START_KEYS: &[&str] = &["startDate", "start", "from", "startDateRaw"];
const END_KEYS: &[&str] = &["endDate", "end", "to", "endDateRaw"];
const RANGE_KEYS: &[&str] = &["datesRaw", "dates", "period", "years"];
const BULLET_KEYS: &[&str] = &["bullets", "achievements", "responsibilities", "tasks"];
pub(crate) const SCHOOL_KEYS: &[&str] = &["school", "institution", "university", "college", "school_name"];
const DEGREE_KEYS: &[&str] = &["degree", "diploma"];
const EDUCATION_LOCATION_KEYS: &[&str] = &["location", "city"];
const EDUCATION_DATES_KEYS: &[&str] = &["dates", "period", "years"];
const PROJECT_NAME_KEYS: &[&str] = &["name", "title"];
const SECTION_TITLE_KEYS: &[&str] = &["title", "name"];
const SECTION_ITEM_KEYS: &[&str] = &["items", "bullets"];

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static RE_RANGE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(present|présent|[0-9]{1,2}/[0-9]{4}|[0-9]{4}-[0-9]{2}\b|[0-9]{4})").unwrap()
});

/// Context the sanitizer reads besides the candidate itself.
#[derive(Debug, Clone, Default)]
pub struct SanitizeContext<'a> {
    /// Original CV text; used for language detection and name inference.
    pub source_text: &'a str,
    /// Secondary text (a job description, say); language detection fallback only.
    pub auxiliary_reference_text: &'a str,
    /// Month future-date checks compare against; the current month when `None`.
    pub reference_month: Option<YearMonth>,
}

impl<'a> SanitizeContext<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self {
            source_text,
            ..Self::default()
        }
    }

    pub fn with_auxiliary(mut self, text: &'a str) -> Self {
        self.auxiliary_reference_text = text;
        self
    }

    pub fn with_reference_month(mut self, month: YearMonth) -> Self {
        self.reference_month = Some(month);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    tables: Arc<HeuristicTables>,
    detector: LanguageDetector,
}

impl Sanitizer {
    pub fn new(tables: Arc<HeuristicTables>) -> Self {
        Self {
            detector: LanguageDetector::new(tables.clone()),
            tables,
        }
    }

    pub fn sanitize(&self, candidate: &Value, ctx: &SanitizeContext<'_>) -> ResumeDocument {
        let root = as_object(Some(candidate));
        if !candidate.is_object() {
            debug!("Sanitizing a non-object candidate; starting from an empty document");
        }

        let mut metadata = self.sanitize_metadata(as_object(root.get("metadata")), ctx);
        let header = sanitize_header(as_object(root.get("header")), ctx.source_text);
        let summary = root
            .get("summary")
            .and_then(non_blank_str)
            .map(|s| clamp_chars(&s, MAX_SUMMARY_CHARS).trim_end().to_string())
            .filter(|s| !s.is_empty());

        let experience = sanitize_experience(root.get("experience"));

        let reference = ctx.reference_month.unwrap_or_else(YearMonth::current);
        let has_future_date = experience.iter().any(|e| {
            [e.start_date, e.end_date]
                .iter()
                .flatten()
                .any(|d| d.is_after(reference))
        });
        if let Some(warnings) = metadata.warnings.take() {
            let kept: Vec<String> = warnings
                .into_iter()
                .filter(|w| {
                    has_future_date || WarningKind::classify(w, &self.tables) != WarningKind::FutureDate
                })
                .collect();
            metadata.warnings = (!kept.is_empty()).then_some(kept);
        }

        let education = sanitize_education(root.get("education"));
        let projects = sanitize_projects(root.get("projects"));
        let skills = root.get("skills").and_then(sanitize_skills);

        ResumeDocument {
            metadata,
            header,
            summary,
            experience,
            education,
            projects,
            skills,
            languages: root.get("languages").and_then(non_empty_list),
            certifications: root.get("certifications").and_then(non_empty_list),
            interests: root.get("interests").and_then(non_empty_list),
            other_sections: sanitize_other_sections(root.get("otherSections")),
        }
    }

    fn sanitize_metadata(&self, meta: &Map<String, Value>, ctx: &SanitizeContext<'_>) -> Metadata {
        let label = meta.get("language").and_then(Value::as_str);
        let language = self
            .detector
            .normalize_label(label, &[ctx.source_text, ctx.auxiliary_reference_text]);
        let warnings = match meta.get("warnings") {
            Some(list @ Value::Array(_)) => non_empty_list(list),
            _ => None,
        };
        Metadata {
            language,
            source_order_preserved: meta
                .get("sourceOrderPreserved")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            warnings,
        }
    }
}

// ── Header ──────────────────────────────────────────────────────────────

fn sanitize_header(header: &Map<String, Value>, source_text: &str) -> Header {
    let email = header
        .get("email")
        .and_then(non_blank_str)
        .filter(|e| RE_EMAIL.is_match(e));

    let raw_links = as_object(header.get("links"));
    let link = |key: &str| raw_links.get(key).and_then(non_blank_str).and_then(|u| clean_url(&u));
    let links = Links {
        linkedin: link("linkedin"),
        github: link("github"),
        portfolio: link("portfolio"),
    };

    let full_name = first_non_blank(header, FULL_NAME_KEYS)
        .or_else(|| guess_full_name(source_text, email.as_deref()))
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    Header {
        full_name,
        email,
        phone: header.get("phone").and_then(scalar_text),
        location: header.get("location").and_then(non_blank_str),
        links: (!links.is_empty()).then_some(links),
    }
}

// ── Experience ──────────────────────────────────────────────────────────

fn sanitize_experience(value: Option<&Value>) -> Vec<Experience> {
    let entries: Vec<Experience> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .take(MAX_EXPERIENCE)
            .map(|item| sanitize_experience_entry(as_object(Some(item))))
            .collect(),
        _ => Vec::new(),
    };
    if entries.is_empty() {
        return vec![sanitize_experience_entry(as_object(None))];
    }
    entries
}

fn sanitize_experience_entry(entry: &Map<String, Value>) -> Experience {
    let mut start_date = first_match(entry, START_KEYS, normalize_date_value);
    let mut end_date = first_match(entry, END_KEYS, normalize_date_value);
    if start_date.is_none() || end_date.is_none() {
        if let Some(range) = first_match(entry, RANGE_KEYS, scalar_text) {
            let (start, end) = split_date_range(&range);
            start_date = start_date.or(start);
            end_date = end_date.or(end);
        }
    }

    let mut bullets: Vec<String> = first_match(entry, BULLET_KEYS, non_empty_list)
        .unwrap_or_default()
        .into_iter()
        .take(MAX_EXPERIENCE_BULLETS)
        .collect();
    if bullets.is_empty() {
        bullets.push(PLACEHOLDER.to_string());
    }

    Experience {
        company: first_non_blank(entry, COMPANY_KEYS).unwrap_or_else(|| PLACEHOLDER.to_string()),
        title: first_non_blank(entry, TITLE_KEYS).unwrap_or_else(|| PLACEHOLDER.to_string()),
        location: first_non_blank(entry, EXPERIENCE_LOCATION_KEYS),
        start_date,
        end_date,
        bullets,
    }
}

/// Reads `start … end` out of free text such as `"03/2019 – Present"`.
///
/// A present-like first token is not a start date; a present-like second token is an
/// ongoing end date.
fn split_date_range(text: &str) -> (Option<ResumeDate>, Option<ResumeDate>) {
    let mut tokens = RE_RANGE_TOKEN.find_iter(text).map(|m| m.as_str());
    let start = tokens
        .next()
        .filter(|t| !is_present_marker(t))
        .and_then(normalize_date);
    let end = tokens.next().and_then(|t| {
        if is_present_marker(t) {
            Some(ResumeDate::Present)
        } else {
            normalize_date(t)
        }
    });
    (start, end)
}

// ── Education and projects ──────────────────────────────────────────────

fn sanitize_education(value: Option<&Value>) -> Vec<Education> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let with_school: Vec<Education> = items
        .iter()
        .filter_map(|item| sanitize_education_entry(as_object(Some(item))))
        .collect();
    if with_school.len() < items.len() {
        debug!(
            "Dropped {} education entries without a school",
            items.len() - with_school.len()
        );
    }
    with_school.into_iter().take(MAX_EDUCATION).collect()
}

fn sanitize_education_entry(entry: &Map<String, Value>) -> Option<Education> {
    Some(Education {
        school: first_non_blank(entry, SCHOOL_KEYS)?,
        degree: first_non_blank(entry, DEGREE_KEYS),
        location: first_non_blank(entry, EDUCATION_LOCATION_KEYS),
        dates: education_dates(entry),
    })
}

/// Free-text dates of an education entry, composed from `startDate`/`endDate` if needed.
pub(crate) fn education_dates(entry: &Map<String, Value>) -> Option<String> {
    first_match(entry, EDUCATION_DATES_KEYS, scalar_text).or_else(|| {
        let start = entry.get("startDate").and_then(scalar_text);
        let end = entry.get("endDate").and_then(scalar_text);
        match (start, end) {
            (Some(start), Some(end)) => Some(format!("{start}–{end}")),
            (start, end) => start.or(end),
        }
    })
}

fn sanitize_projects(value: Option<&Value>) -> Option<Vec<Project>> {
    let Some(Value::Array(items)) = value else {
        return None;
    };
    let projects: Vec<Project> = items
        .iter()
        .filter_map(|item| {
            let entry = as_object(Some(item));
            let name = first_non_blank(entry, PROJECT_NAME_KEYS)?;
            let mut bullets: Vec<String> = entry
                .get("bullets")
                .map(string_list)
                .unwrap_or_default()
                .into_iter()
                .take(MAX_PROJECT_BULLETS)
                .collect();
            if bullets.is_empty() {
                bullets.push(PLACEHOLDER.to_string());
            }
            Some(Project {
                name,
                bullets,
                dates: entry.get("dates").and_then(scalar_text),
            })
        })
        .take(MAX_PROJECTS)
        .collect();
    (!projects.is_empty()).then_some(projects)
}

// ── Skills and free sections ────────────────────────────────────────────

fn sanitize_skills(value: &Value) -> Option<Skills> {
    let skills = match value {
        Value::Array(_) | Value::String(_) => Skills {
            tools: non_empty_list(value),
            ..Skills::default()
        },
        Value::Object(categories) => {
            let category = |key: &str| match categories.get(key) {
                Some(list @ (Value::Array(_) | Value::String(_))) => non_empty_list(list),
                _ => None,
            };
            Skills {
                languages: category("languages"),
                frameworks: category("frameworks"),
                tools: category("tools"),
                other: category("other"),
            }
        }
        _ => return None,
    };
    (!skills.is_empty()).then_some(skills)
}

fn sanitize_other_sections(value: Option<&Value>) -> Option<Vec<OtherSection>> {
    let Some(Value::Array(items)) = value else {
        return None;
    };
    let sections: Vec<OtherSection> = items
        .iter()
        .filter_map(|item| {
            let entry = as_object(Some(item));
            Some(OtherSection {
                title: first_non_blank(entry, SECTION_TITLE_KEYS)?,
                items: first_match(entry, SECTION_ITEM_KEYS, non_empty_list)?,
            })
        })
        .collect();
    (!sections.is_empty()).then_some(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ALLOWED_ROOT_KEYS;
    use serde_json::json;

    fn sanitizer() -> Sanitizer {
        Sanitizer::new(Arc::new(HeuristicTables::default()))
    }

    fn march_2024() -> YearMonth {
        YearMonth::new(2024, 3)
    }

    fn run(candidate: Value, source_text: &str) -> Value {
        let ctx = SanitizeContext::new(source_text).with_reference_month(march_2024());
        serde_json::to_value(sanitizer().sanitize(&candidate, &ctx)).unwrap()
    }

    #[test]
    fn test_end_to_end_jane_doe() {
        let candidate = json!({
            "metadata": {"language": "English"},
            "header": {"email": "jane.doe@x.com"},
            "experience": [{"company_name": "Acme", "position": "Engineer", "datesRaw": "03/2019 - 12/2021", "achievements": ["Built things"]}]
        });
        let out = run(candidate, "Jane Doe\nSoftware Engineer");

        assert_eq!(out["metadata"]["language"], "en");
        assert_eq!(out["metadata"]["sourceOrderPreserved"], true);
        assert_eq!(out["header"]["fullName"], "Jane Doe");
        assert_eq!(out["header"]["email"], "jane.doe@x.com");
        assert_eq!(
            out["experience"][0],
            json!({
                "company": "Acme",
                "title": "Engineer",
                "startDate": "2019-03",
                "endDate": "2021-12",
                "bullets": ["Built things"]
            })
        );
        assert_eq!(out["education"], json!([]));
    }

    #[test]
    fn test_role_dates_and_responsibilities_synonyms() {
        let candidate = json!({
            "header": {"email": "jane.doe@x.com"},
            "experience": [{"company_name": "Acme", "role": "Engineer", "dates": "03/2019 - 12/2021", "responsibilities": "Built things"}]
        });
        let out = run(candidate, "Jane Doe\nSoftware Engineer");

        assert_eq!(out["header"]["fullName"], "Jane Doe");
        assert_eq!(
            out["experience"][0],
            json!({
                "company": "Acme",
                "title": "Engineer",
                "startDate": "2019-03",
                "endDate": "2021-12",
                "bullets": ["Built things"]
            })
        );
    }

    #[test]
    fn test_source_order_flag_defaults_to_true() {
        let out = run(json!({"metadata": {"sourceOrderPreserved": false}}), "");
        assert_eq!(out["metadata"]["sourceOrderPreserved"], false);

        let out = run(json!({"metadata": {"sourceOrderPreserved": "no"}}), "");
        assert_eq!(out["metadata"]["sourceOrderPreserved"], true);
    }

    #[test]
    fn test_total_over_hostile_inputs() {
        for candidate in [json!(null), json!({}), json!([]), json!("string"), json!({"garbage": 1})] {
            let out = run(candidate, "");
            let root = out.as_object().unwrap();
            assert!(root.keys().all(|k| ALLOWED_ROOT_KEYS.contains(&k.as_str())));
            assert_eq!(out["metadata"]["language"], "unknown");
            assert_eq!(out["metadata"]["sourceOrderPreserved"], true);
            assert_eq!(out["header"]["fullName"], PLACEHOLDER);
            assert_eq!(
                out["experience"],
                json!([{"company": "—", "title": "—", "bullets": ["—"]}])
            );
            assert_eq!(out["education"], json!([]));
            assert!(root.get("garbage").is_none());
        }
    }

    #[test]
    fn test_idempotent() {
        let candidate = json!({
            "metadata": {"language": "fr-FR", "warnings": [" Check dates ", ""], "extra": true},
            "header": {"fullName": " Jeanne Martin ", "phone": 33612345678u64, "links": {"linkedin": "linkedin.com/in/jm", "github": "  "}},
            "summary": "x".repeat(700),
            "experience": [
                {"employer": "AXA", "role": "Analyst", "start": "2019", "end": "present", "tasks": "Pricing"},
                {"org": "Beta", "period": "2018 – 2019", "bullets": [{"text": "Did"}, 3]}
            ],
            "education": [{"university": "Dauphine", "startDate": "2017", "endDate": "2019"}],
            "projects": [{"title": "Bot", "bullets": []}],
            "skills": ["Rust", "SQL"],
            "languages": "French",
            "otherSections": [{"title": "Volunteering", "items": ["Red Cross"]}],
            "unknown": {"nested": 1}
        });
        let once = run(candidate, "Jeanne Martin");
        let twice = run(once.clone(), "Jeanne Martin");
        assert_eq!(once, twice);
        assert_eq!(once["summary"].as_str().unwrap().chars().count(), MAX_SUMMARY_CHARS);
        assert_eq!(once["education"][0]["dates"], "2017–2019");
        assert_eq!(once["experience"][0]["endDate"], "Present");
        assert_eq!(once["experience"][1]["startDate"], "2018-01");
        assert_eq!(once["experience"][1]["endDate"], "2019-01");
    }

    #[test]
    fn test_caps() {
        let experience: Vec<Value> = (0..10)
            .map(|i| json!({"company": format!("C{i}"), "bullets": (0..8).map(|b| format!("b{b}")).collect::<Vec<_>>()}))
            .collect();
        let education: Vec<Value> = (0..5).map(|i| json!({"school": format!("S{i}")})).collect();
        let projects: Vec<Value> = (0..6)
            .map(|i| json!({"name": format!("P{i}"), "bullets": ["a", "b", "c", "d", "e"]}))
            .collect();
        let out = run(
            json!({"experience": experience, "education": education, "projects": projects}),
            "",
        );
        assert_eq!(out["experience"].as_array().unwrap().len(), MAX_EXPERIENCE);
        assert_eq!(out["experience"][0]["bullets"].as_array().unwrap().len(), MAX_EXPERIENCE_BULLETS);
        assert_eq!(out["experience"][5]["company"], "C5");
        assert_eq!(out["education"].as_array().unwrap().len(), MAX_EDUCATION);
        assert_eq!(out["projects"].as_array().unwrap().len(), MAX_PROJECTS);
        assert_eq!(out["projects"][0]["bullets"].as_array().unwrap().len(), MAX_PROJECT_BULLETS);
    }

    #[test]
    fn test_education_filters_before_capping() {
        let out = run(
            json!({"education": [{"degree": "MBA"}, {"school": "A"}, {"school": " "}, {"school": "B"}, {"school": "C"}, {"school": "D"}]}),
            "",
        );
        assert_eq!(
            out["education"],
            json!([{"school": "A"}, {"school": "B"}, {"school": "C"}])
        );
    }

    #[test]
    fn test_future_warning_dropped_without_future_dates() {
        let candidate = json!({
            "metadata": {"warnings": ["Dates postérieures à aujourd'hui", "Phone number ambiguous"]},
            "experience": [{"company": "Acme", "startDate": "2020-01", "endDate": "2023-06"}]
        });
        let out = run(candidate, "");
        assert_eq!(out["metadata"]["warnings"], json!(["Phone number ambiguous"]));
    }

    #[test]
    fn test_future_warning_kept_with_future_dates() {
        let candidate = json!({
            "metadata": {"warnings": ["Some dates are in the future"]},
            "experience": [{"company": "Acme", "startDate": "2030-01"}]
        });
        let out = run(candidate, "");
        assert_eq!(out["metadata"]["warnings"], json!(["Some dates are in the future"]));
    }

    #[test]
    fn test_warnings_removed_when_all_filtered() {
        let candidate = json!({"metadata": {"warnings": ["future dates"]}});
        let out = run(candidate, "");
        assert!(out["metadata"].get("warnings").is_none());
    }

    #[test]
    fn test_explicit_dates_win_over_combined_field() {
        let out = run(
            json!({"experience": [{"startDate": "2015-02", "dates": "2010 - 2012"}]}),
            "",
        );
        assert_eq!(out["experience"][0]["startDate"], "2015-02");
        assert_eq!(out["experience"][0]["endDate"], "2012-01");
    }

    #[test]
    fn test_unparseable_dates_are_dropped() {
        let out = run(
            json!({"experience": [{"startDate": "sometime", "endDate": "later"}]}),
            "",
        );
        assert!(out["experience"][0].get("startDate").is_none());
        assert!(out["experience"][0].get("endDate").is_none());
    }

    #[test]
    fn test_present_first_token_is_not_a_start() {
        assert_eq!(split_date_range("Present"), (None, None));
        assert_eq!(
            split_date_range("2019-04 to présent"),
            (Some(ResumeDate::Month(YearMonth::new(2019, 4))), Some(ResumeDate::Present))
        );
    }

    #[test]
    fn test_header_email_and_links_validation() {
        let out = run(
            json!({"header": {"email": "not-an-email", "location": " Paris ", "links": {"portfolio": "jdoe.dev", "github": "not a url at all"}}}),
            "",
        );
        assert!(out["header"].get("email").is_none());
        assert_eq!(out["header"]["location"], "Paris");
        assert_eq!(out["header"]["links"], json!({"portfolio": "https://jdoe.dev/"}));
    }

    #[test]
    fn test_full_name_from_email_when_text_has_none() {
        let out = run(json!({"header": {"email": "jane.doe@x.com"}}), "");
        assert_eq!(out["header"]["fullName"], "Jane Doe");
    }

    #[test]
    fn test_language_falls_back_to_auxiliary_text() {
        let ctx = SanitizeContext::new("")
            .with_auxiliary("Nous recherchons un actuaire pour le pôle de la tarification et des études")
            .with_reference_month(march_2024());
        let doc = sanitizer().sanitize(&json!({}), &ctx);
        assert_eq!(doc.metadata.language, "fr");
    }

    #[test]
    fn test_skills_shapes() {
        let out = run(json!({"skills": "Excel"}), "");
        assert_eq!(out["skills"], json!({"tools": ["Excel"]}));

        let out = run(
            json!({"skills": {"languages": ["Rust", " "], "frameworks": "Axum", "tools": 5, "other": []}}),
            "",
        );
        assert_eq!(out["skills"], json!({"languages": ["Rust"], "frameworks": ["Axum"]}));

        let out = run(json!({"skills": {"tools": []}}), "");
        assert!(out.get("skills").is_none());
    }

    #[test]
    fn test_summary_non_string_removed() {
        let out = run(json!({"summary": {"text": "x"}}), "");
        assert!(out.get("summary").is_none());
        let out = run(json!({"summary": "   "}), "");
        assert!(out.get("summary").is_none());
    }

    #[test]
    fn test_projects_without_names_are_dropped() {
        let out = run(json!({"projects": [{"bullets": ["x"]}]}), "");
        assert!(out.get("projects").is_none());
    }

    #[test]
    fn test_candidate_is_not_mutated() {
        let candidate = json!({"header": {"fullName": "  A B  "}, "extra": 1});
        let before = candidate.clone();
        let ctx = SanitizeContext::new("").with_reference_month(march_2024());
        let _ = sanitizer().sanitize(&candidate, &ctx);
        assert_eq!(candidate, before);
    }
}
