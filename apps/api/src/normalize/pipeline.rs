//! The end-to-end pipeline: extract, optionally merge a generated draft, sanitize.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::models::{DraftResume, ResumeDocument};
use crate::normalize::diff::{build_narrative, compute_resume_diff, ResumeDiff};
use crate::normalize::extractor::Extractor;
use crate::normalize::merge::merge_drafts;
use crate::normalize::sanitizer::{SanitizeContext, Sanitizer};
use crate::normalize::tables::{HeuristicTables, TableError};

/// Where the sanitized document's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSource {
    /// Heuristic extraction only.
    Extractor,
    /// Extraction merged with a generated draft.
    Merged,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeOutcome {
    pub document: ResumeDocument,
    pub draft_source: DraftSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffOutcome {
    pub diff: ResumeDiff,
    pub narrative: String,
}

/// Shared, immutable pipeline built once from a set of heuristic tables.
#[derive(Debug, Clone)]
pub struct Normalizer {
    extractor: Extractor,
    sanitizer: Sanitizer,
}

impl Normalizer {
    pub fn new(tables: HeuristicTables) -> Result<Self, TableError> {
        let tables = Arc::new(tables);
        Ok(Self {
            extractor: Extractor::new(tables.clone())?,
            sanitizer: Sanitizer::new(tables),
        })
    }

    pub fn extract(&self, source_text: &str) -> DraftResume {
        self.extractor.extract(source_text)
    }

    pub fn sanitize(&self, candidate: &Value, ctx: &SanitizeContext<'_>) -> ResumeDocument {
        self.sanitizer.sanitize(candidate, ctx)
    }

    /// Extracts a draft from `ctx.source_text`, merges `generated` into it when given,
    /// and sanitizes the result.
    pub fn normalize(&self, generated: Option<&Value>, ctx: &SanitizeContext<'_>) -> NormalizeOutcome {
        let draft = self.extract(ctx.source_text);
        // Serializing plain structs cannot fail; `Null` still sanitizes to a valid document.
        let extracted = serde_json::to_value(&draft).unwrap_or(Value::Null);

        let (candidate, draft_source) = match generated {
            Some(generated) => (merge_drafts(generated, &extracted), DraftSource::Merged),
            None => (extracted, DraftSource::Extractor),
        };
        debug!("Sanitizing {:?} draft", draft_source);

        NormalizeOutcome {
            document: self.sanitize(&candidate, ctx),
            draft_source,
        }
    }

    /// Sanitizes both sides, then diffs them.
    pub fn diff(&self, before: &Value, after: &Value, ctx: &SanitizeContext<'_>) -> DiffOutcome {
        let before = self.sanitize(before, ctx);
        let after = self.sanitize(after, ctx);
        let diff = compute_resume_diff(&before, &after);
        DiffOutcome {
            narrative: build_narrative(&diff),
            diff,
        }
    }
}
