//! Section segmentation. Splits a normalized CV body on known headings.

use std::sync::Arc;

use crate::normalize::tables::{HeuristicTables, SectionKind};

/// One recognized section: the heading label that opened it and its body.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub kind: SectionKind,
    pub body: String,
}

/// Result of segmenting a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Segmented {
    /// No heading was recognized anywhere.
    Unstructured(String),
    /// Text before the first heading, then every section in document order.
    Structured { header: String, sections: Vec<Section> },
}

impl Segmented {
    /// First section of `kind`, if any.
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        match self {
            Segmented::Unstructured(_) => None,
            Segmented::Structured { sections, .. } => sections.iter().find(|s| s.kind == kind),
        }
    }

    /// Every recognized section, in document order.
    pub fn sections(&self) -> &[Section] {
        match self {
            Segmented::Unstructured(_) => &[],
            Segmented::Structured { sections, .. } => sections,
        }
    }

    /// The header block, or the whole text when unstructured.
    pub fn header_block(&self) -> &str {
        match self {
            Segmented::Unstructured(text) => text,
            Segmented::Structured { header, .. } => header,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionSegmenter {
    tables: Arc<HeuristicTables>,
}

impl SectionSegmenter {
    pub fn new(tables: Arc<HeuristicTables>) -> Self {
        Self { tables }
    }

    /// Heading label matched by `line`, if any.
    ///
    /// The trimmed, lowercased line (trailing colons removed) must equal a heading or
    /// start with the heading followed by a space.
    pub fn match_heading(&self, line: &str) -> Option<(&str, SectionKind)> {
        let lowered = line.trim().to_lowercase();
        let candidate = lowered.trim_end_matches(':').trim_end();
        if candidate.is_empty() {
            return None;
        }
        self.tables
            .headings
            .iter()
            .find(|h| {
                candidate == h.label
                    || candidate
                        .strip_prefix(h.label.as_str())
                        .is_some_and(|rest| rest.starts_with(' '))
            })
            .map(|h| (h.label.as_str(), h.kind))
    }

    pub fn segment(&self, text: &str) -> Segmented {
        let lines: Vec<&str> = text.split('\n').collect();
        let marks: Vec<(usize, &str, SectionKind)> = lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| {
                self.match_heading(line)
                    .map(|(label, kind)| (idx, label, kind))
            })
            .collect();

        let Some(&(first_idx, _, _)) = marks.first() else {
            return Segmented::Unstructured(text.to_string());
        };

        let header = lines[..first_idx].join("\n");
        let sections = marks
            .iter()
            .enumerate()
            .map(|(i, &(idx, label, kind))| {
                let end = marks.get(i + 1).map(|m| m.0).unwrap_or(lines.len());
                Section {
                    heading: label.to_string(),
                    kind,
                    body: lines[idx + 1..end].join("\n").trim().to_string(),
                }
            })
            .collect();

        Segmented::Structured { header, sections }
    }
}
