//! Heuristic tables: every keyword list the detector, extractor and sanitizer consult.
//!
//! The tables are plain data: the built-in set comes from `Default`, and a JSON
//! document (see `HEURISTICS_PATH`) can override any top-level field. Missing
//! fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read heuristic tables: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse heuristic tables: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("heuristic tables produced an invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Canonical section a heading label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Profile,
    Experience,
    Education,
    Skills,
    Languages,
    Certifications,
    Projects,
    Interests,
}

/// A writing system that identifies a language on sight.
/// Ranges are inclusive Unicode scalar values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRule {
    pub code: String,
    pub ranges: Vec<(u32, u32)>,
}

/// Space-padded markers scored against lowercased text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopwordSet {
    pub code: String,
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelAlias {
    pub label: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingRule {
    pub label: String,
    pub kind: SectionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicTables {
    /// Checked in order; the first script present in the text wins.
    pub scripts: Vec<ScriptRule>,
    /// Scored in order; ties keep the earlier entry.
    pub stopwords: Vec<StopwordSet>,
    /// Lowercase labels (codes, English and French names) → canonical code.
    pub language_labels: Vec<LabelAlias>,
    /// Lowercase section headings, matched in order.
    pub headings: Vec<HeadingRule>,
    pub skill_languages: Vec<String>,
    pub skill_frameworks: Vec<String>,
    pub school_keywords: Vec<String>,
    pub degree_keywords: Vec<String>,
    pub known_locations: Vec<String>,
    /// A warning is about future dates when every stem of any one group appears in it.
    pub future_warning_markers: Vec<Vec<String>>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn stopwords(code: &str, markers: &[&str]) -> StopwordSet {
    StopwordSet {
        code: code.to_string(),
        markers: words(markers),
    }
}

fn heading(label: &str, kind: SectionKind) -> HeadingRule {
    HeadingRule {
        label: label.to_string(),
        kind,
    }
}

impl Default for HeuristicTables {
    fn default() -> Self {
        let scripts = vec![
            ScriptRule {
                code: "ar".to_string(),
                ranges: vec![(0x0600, 0x06FF), (0x0750, 0x077F)],
            },
            // Kana before Han: Japanese text mixes kanji with kana, Chinese never has kana.
            ScriptRule {
                code: "ja".to_string(),
                ranges: vec![(0x3040, 0x30FF)],
            },
            ScriptRule {
                code: "zh".to_string(),
                ranges: vec![(0x4E00, 0x9FFF)],
            },
            ScriptRule {
                code: "ko".to_string(),
                ranges: vec![(0xAC00, 0xD7AF)],
            },
        ];

        let stopwords = vec![
            stopwords(
                "fr",
                &[
                    " le ", " la ", " les ", " de ", " des ", " et ", " à ", " ou ",
                    " expérience ", "compétence", "profil",
                ],
            ),
            stopwords(
                "en",
                &[
                    " the ", " and ", " to ", " or ", " experience ", " skills ", " profile ",
                    " developer ", " engineer ",
                ],
            ),
            stopwords(
                "es",
                &[
                    " el ", " la ", " los ", " las ", " de ", " y ", " para ", " experiencia ",
                    " perfil ", " desarrollador ",
                ],
            ),
            stopwords(
                "it",
                &[
                    " il ", " la ", " lo ", " le ", " di ", " e ", " per ", " esperienza ",
                    " profilo ", " sviluppatore ",
                ],
            ),
            stopwords(
                "de",
                &[
                    " der ", " die ", " das ", " und ", " für ", " erfahrung ", " profil ",
                    " entwickler ",
                ],
            ),
            stopwords(
                "pt",
                &[
                    " o ", " a ", " os ", " as ", " de ", " e ", " para ", " experiência ",
                    " perfil ", " desenvolvedor ",
                ],
            ),
            stopwords(
                "nl",
                &[
                    " de ", " het ", " en ", " voor ", " ervaring ", " profiel ",
                    " ontwikkelaar ",
                ],
            ),
            stopwords(
                "tr",
                &[
                    " ve ", " için ", " deneyim ", " profil ", " geliştirici ", " mühendis ",
                ],
            ),
        ];

        let language_labels = [
            ("fr", &["fr", "français", "francais", "french"][..]),
            ("en", &["en", "anglais", "english"][..]),
            ("es", &["es", "espagnol", "spanish", "español"][..]),
            ("it", &["it", "italien", "italian", "italiano"][..]),
            ("de", &["de", "allemand", "german", "deutsch"][..]),
            ("pt", &["pt", "portugais", "portuguese", "português"][..]),
            ("nl", &["nl", "néerlandais", "dutch", "nederlands"][..]),
            ("tr", &["tr", "turc", "turkish", "türkçe"][..]),
            ("ar", &["ar", "arabe", "arabic"][..]),
            ("zh", &["zh", "chinois", "chinese"][..]),
            ("ja", &["ja", "japonais", "japanese"][..]),
            ("ko", &["ko", "coréen", "korean"][..]),
        ]
        .iter()
        .flat_map(|(code, labels)| {
            labels.iter().map(move |label| LabelAlias {
                label: label.to_string(),
                code: code.to_string(),
            })
        })
        .collect();

        use SectionKind::*;
        let headings = vec![
            heading("profil", Profile),
            heading("profile", Profile),
            heading("résumé", Profile),
            heading("resume", Profile),
            heading("summary", Profile),
            heading("experience", Experience),
            heading("experiences", Experience),
            heading("expérience", Experience),
            heading("expériences", Experience),
            heading("expérience professionnelle", Experience),
            heading("expériences professionnelles", Experience),
            heading("professional experience", Experience),
            heading("work experience", Experience),
            heading("formation", Education),
            heading("formations", Education),
            heading("éducation", Education),
            heading("education", Education),
            heading("compétences", Skills),
            heading("skills", Skills),
            heading("langues", Languages),
            heading("languages", Languages),
            heading("certifications", Certifications),
            heading("projets", Projects),
            heading("projects", Projects),
            heading("centres d'intérêt", Interests),
            heading("interests", Interests),
        ];

        Self {
            scripts,
            stopwords,
            language_labels,
            headings,
            skill_languages: words(&[
                "python", "r", "sas", "sql", "excel", "vba", "typescript", "javascript", "java",
                "c++", "c#", "c", "go", "rust", "kotlin", "swift", "php", "ruby", "scala",
            ]),
            skill_frameworks: words(&[
                "react", "node.js", "pytorch", "tensorflow", "scikit-learn", "xgboost",
                "lightgbm", "prophet", "django", "flask", "spring", "angular", "vue",
                "next.js", "express",
            ]),
            school_keywords: words(&[
                "Université", "University", "École", "Ecole", "Lycée", "School", "Institut",
                "Institute", "College",
            ]),
            degree_keywords: words(&[
                "Actuaire", "Master", "Licence", "Bachelor", "DUAS", "CPGE", "MP", "Engineer",
                "Diplôme", "Diplome", "MBA", "PhD", "Doctorat",
            ]),
            known_locations: words(&[
                "Paris", "France", "Maroc", "Morocco", "Rabat", "Casablanca", "Courbevoie",
                "Bois-Colombes", "Strasbourg", "Lyon", "London", "Berlin",
            ]),
            future_warning_markers: vec![
                words(&["future"]),
                words(&["futur"]),
                words(&["postérieur"]),
                words(&["posterior"]),
                words(&["post", "date"]),
            ],
        }
    }
}

impl HeuristicTables {
    /// Parses a JSON override; fields absent from the document keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Maps a lowercase heading label to its section, if registered.
    pub fn heading_kind(&self, label: &str) -> Option<SectionKind> {
        self.headings
            .iter()
            .find(|h| h.label == label)
            .map(|h| h.kind)
    }
}
