// Resume normalization pipeline.
// Raw CV text goes through the extractor, an optional generated draft is merged in,
// and the sanitizer turns the result into a schema-conformant ResumeDocument.
// Nothing below handlers.rs performs I/O.

pub mod coerce;
pub mod dates;
pub mod diff;
pub mod extractor;
pub mod fields;
pub mod handlers;
pub mod language;
pub mod links;
pub mod merge;
pub mod names;
pub mod pipeline;
pub mod salvage;
pub mod sanitizer;
pub mod sections;
pub mod tables;
pub mod text;
pub mod warnings;

pub use dates::{normalize_date, ResumeDate, YearMonth};
pub use diff::{build_narrative, compute_resume_diff, ResumeDiff};
pub use extractor::Extractor;
pub use language::LanguageDetector;
pub use links::clean_url;
pub use merge::merge_drafts;
pub use names::guess_full_name;
pub use pipeline::{DiffOutcome, DraftSource, NormalizeOutcome, Normalizer};
pub use salvage::salvage_json;
pub use sanitizer::{SanitizeContext, Sanitizer};
pub use tables::{HeuristicTables, SectionKind, TableError};
pub use warnings::WarningKind;
