//! Language detection and language-label normalization.

use std::sync::Arc;

use crate::normalize::tables::HeuristicTables;

pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Best-effort language guesser driven by [`HeuristicTables`].
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    tables: Arc<HeuristicTables>,
}

impl LanguageDetector {
    pub fn new(tables: Arc<HeuristicTables>) -> Self {
        Self { tables }
    }

    /// Returns an ISO-639-1-like code, or `"unknown"`.
    ///
    /// Script sniffing runs first and wins outright. Otherwise every stopword set is
    /// scored by how many of its markers occur in the lowercased text, whitespace
    /// collapsed to single spaces and padded at both ends;
    /// the highest score wins and ties keep the earlier set.
    pub fn detect(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return UNKNOWN_LANGUAGE.to_string();
        }

        for rule in &self.tables.scripts {
            let hit = text.chars().any(|c| {
                let cp = c as u32;
                rule.ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
            });
            if hit {
                return rule.code.clone();
            }
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let padded = format!(" {} ", words.join(" ").to_lowercase());
        let mut best = UNKNOWN_LANGUAGE;
        let mut best_score = 0usize;
        for set in &self.tables.stopwords {
            let score = set
                .markers
                .iter()
                .filter(|m| padded.contains(m.as_str()))
                .count();
            if score > best_score {
                best_score = score;
                best = set.code.as_str();
            }
        }
        best.to_string()
    }

    /// Maps a free-form label (`"fr"`, `"French"`, `"français"`, `"en-US"`) to a code.
    pub fn code_for_label(&self, label: &str) -> Option<String> {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }
        let lookup = |l: &str| {
            self.tables
                .language_labels
                .iter()
                .find(|a| a.label == l)
                .map(|a| a.code.clone())
        };
        lookup(&label).or_else(|| {
            let primary = label.split(|c| c == '-' || c == '_').next()?;
            lookup(primary)
        })
    }

    /// Canonical code for `label`; falls back to detecting each reference text in turn.
    pub fn normalize_label(&self, label: Option<&str>, references: &[&str]) -> String {
        if let Some(code) = label.and_then(|l| self.code_for_label(l)) {
            return code;
        }
        references
            .iter()
            .map(|text| self.detect(text))
            .find(|code| code != UNKNOWN_LANGUAGE)
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> LanguageDetector {
        LanguageDetector::new(Arc::new(HeuristicTables::default()))
    }

    #[test]
    fn test_arabic_script() {
        assert_eq!(detector().detect("مرحبا بكم"), "ar");
    }

    #[test]
    fn test_japanese_kana() {
        assert_eq!(detector().detect("こんにちは"), "ja");
    }

    #[test]
    fn test_japanese_with_kanji_is_not_chinese() {
        assert_eq!(detector().detect("東京で働いています"), "ja");
    }

    #[test]
    fn test_chinese_han() {
        assert_eq!(detector().detect("软件工程师"), "zh");
    }

    #[test]
    fn test_korean_hangul() {
        assert_eq!(detector().detect("안녕하세요"), "ko");
    }

    #[test]
    fn test_script_beats_stopwords() {
        assert_eq!(
            detector().detect("the and to or experience 안녕하세요"),
            "ko"
        );
    }

    #[test]
    fn test_french_stopwords() {
        assert_eq!(
            detector().detect("Je suis développeur avec une expérience solide"),
            "fr"
        );
    }

    #[test]
    fn test_english_stopwords() {
        assert_eq!(
            detector().detect("Senior developer with experience in the cloud and data"),
            "en"
        );
    }

    #[test]
    fn test_german_stopwords() {
        assert_eq!(
            detector().detect("Entwickler mit Erfahrung für die Cloud und das Backend"),
            "de"
        );
    }

    #[test]
    fn test_blank_is_unknown() {
        assert_eq!(detector().detect(""), "unknown");
        assert_eq!(detector().detect("   \n\t"), "unknown");
    }

    #[test]
    fn test_no_markers_is_unknown() {
        assert_eq!(detector().detect("xyzzy plugh"), "unknown");
    }

    #[test]
    fn test_tie_keeps_first_registered() {
        // " de " scores fr, es, pt and nl equally; fr is registered first.
        assert_eq!(detector().detect("x de y"), "fr");
    }

    #[test]
    fn test_label_variants() {
        let d = detector();
        assert_eq!(d.code_for_label("French").as_deref(), Some("fr"));
        assert_eq!(d.code_for_label("français").as_deref(), Some("fr"));
        assert_eq!(d.code_for_label(" FR ").as_deref(), Some("fr"));
        assert_eq!(d.code_for_label("en-US").as_deref(), Some("en"));
        assert_eq!(d.code_for_label("klingon"), None);
        assert_eq!(d.code_for_label(""), None);
    }

    #[test]
    fn test_normalize_label_falls_back_to_references() {
        let d = detector();
        assert_eq!(d.normalize_label(Some("Anglais"), &["texte"]), "en");
        assert_eq!(
            d.normalize_label(None, &["", "Je suis développeur avec une expérience solide"]),
            "fr"
        );
        assert_eq!(d.normalize_label(Some("??"), &[""]), "unknown");
    }

    #[test]
    fn test_unknown_label_round_trips() {
        let d = detector();
        let first = d.normalize_label(Some("klingon"), &["xyzzy"]);
        assert_eq!(first, "unknown");
        assert_eq!(d.normalize_label(Some(&first), &["xyzzy"]), "unknown");
    }
}
