//! Advisory warnings carried in `metadata.warnings`.
//!
//! Warnings stay free text in the document, but the pipeline reasons about them
//! through [`WarningKind`]. Text from external generators is classified on read.

use serde::{Deserialize, Serialize};

use crate::normalize::tables::HeuristicTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Some date lies after the current month.
    FutureDate,
    FullNameUncertain,
    NoExperience,
    Other,
}

impl WarningKind {
    /// Message used when the pipeline raises this warning itself.
    pub fn message(self) -> &'static str {
        match self {
            WarningKind::FutureDate => "Some dates lie in the future.",
            WarningKind::FullNameUncertain => "Full name not confidently detected.",
            WarningKind::NoExperience => "No experience detected.",
            WarningKind::Other => "Review this document.",
        }
    }

    /// Classifies free warning text.
    pub fn classify(text: &str, tables: &HeuristicTables) -> Self {
        let lower = text.to_lowercase();
        let about_future = tables
            .future_warning_markers
            .iter()
            .any(|group| !group.is_empty() && group.iter().all(|stem| lower.contains(stem.as_str())));
        if about_future {
            return WarningKind::FutureDate;
        }
        for kind in [WarningKind::FullNameUncertain, WarningKind::NoExperience] {
            if lower == kind.message().to_lowercase() {
                return kind;
            }
        }
        WarningKind::Other
    }
}
