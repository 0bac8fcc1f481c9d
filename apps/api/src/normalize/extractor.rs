//! Heuristic extractor: raw CV text → [`DraftResume`].
//!
//! Pure and total. Any text, including the empty string, produces a draft; sections
//! that cannot be located are simply left empty and reported through warnings.

use std::sync::Arc;

use tracing::debug;

use crate::models::{DraftHeader, DraftMetadata, DraftResume};
use crate::normalize::fields::{
    extract_bullets, extract_email, extract_links, extract_phone, parse_flat_list, parse_projects,
    FieldExtractors,
};
use crate::normalize::language::LanguageDetector;
use crate::normalize::names::name_from_lines;
use crate::normalize::sections::{SectionSegmenter, Segmented};
use crate::normalize::tables::{HeuristicTables, SectionKind, TableError};
use crate::normalize::text::{content_lines, normalize_text, strip_pagination};
use crate::normalize::warnings::WarningKind;

/// Lines of the header block searched for a name.
const HEADER_NAME_LINES: usize = 3;

/// A profile section shorter than this is not used as a summary.
const MIN_SUMMARY_CHARS: usize = 20;

#[derive(Debug, Clone)]
pub struct Extractor {
    detector: LanguageDetector,
    segmenter: SectionSegmenter,
    fields: FieldExtractors,
}

impl Extractor {
    pub fn new(tables: Arc<HeuristicTables>) -> Result<Self, TableError> {
        Ok(Self {
            fields: FieldExtractors::new(&tables)?,
            detector: LanguageDetector::new(tables.clone()),
            segmenter: SectionSegmenter::new(tables),
        })
    }

    pub fn extract(&self, source_text: &str) -> DraftResume {
        let text = strip_pagination(&normalize_text(source_text));
        let language = self.detector.detect(&text);
        let segmented = self.segmenter.segment(&text);
        let header_block = segmented.header_block();

        let header = DraftHeader {
            full_name: name_from_lines(content_lines(header_block), HEADER_NAME_LINES),
            email: extract_email(&text),
            phone: extract_phone(header_block).or_else(|| extract_phone(&text)),
            location: self.fields.find_location(header_block),
            links: Some(extract_links(&text)).filter(|links| !links.is_empty()),
        };

        let body_of = |kind: SectionKind| section_bodies(&segmented, kind);

        let summary = body_of(SectionKind::Profile)
            .into_iter()
            .find(|body| body.chars().count() > MIN_SUMMARY_CHARS)
            .map(str::to_string);
        let experience = body_of(SectionKind::Experience)
            .into_iter()
            .flat_map(|body| self.fields.parse_experience(body))
            .collect::<Vec<_>>();
        let education = body_of(SectionKind::Education)
            .into_iter()
            .flat_map(|body| self.fields.parse_education(body))
            .collect();
        let projects = body_of(SectionKind::Projects)
            .into_iter()
            .flat_map(parse_projects)
            .collect();
        let skills = body_of(SectionKind::Skills)
            .into_iter()
            .find_map(|body| self.fields.parse_skills(body));
        let languages = body_of(SectionKind::Languages)
            .into_iter()
            .flat_map(parse_flat_list)
            .collect();
        let certifications = body_of(SectionKind::Certifications)
            .into_iter()
            .flat_map(|body| extract_bullets(body.lines()))
            .collect();
        let interests = body_of(SectionKind::Interests)
            .into_iter()
            .flat_map(parse_flat_list)
            .collect();

        let mut warnings = Vec::new();
        if header.full_name.is_none() {
            warnings.push(WarningKind::FullNameUncertain.message().to_string());
        }
        if experience.is_empty() {
            warnings.push(WarningKind::NoExperience.message().to_string());
        }

        let draft = DraftResume {
            metadata: DraftMetadata {
                language,
                source_order_preserved: true,
                warnings,
            },
            header,
            summary,
            experience,
            education,
            projects,
            skills,
            languages,
            certifications,
            interests,
        };
        debug!(
            "Extracted draft: language={}, {} sections, {} experience, {} education",
            draft.metadata.language,
            segmented.sections().len(),
            draft.experience.len(),
            draft.education.len()
        );
        draft
    }
}

/// Bodies of every section of `kind`, in document order.
fn section_bodies(segmented: &Segmented, kind: SectionKind) -> Vec<&str> {
    segmented
        .sections()
        .iter()
        .filter(|s| s.kind == kind && !s.body.is_empty())
        .map(|s| s.body.as_str())
        .collect()
}
