//! Structural diff between two sanitized documents, plus a short narrative of it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{Experience, ResumeDocument, Skills};
use crate::normalize::coerce::fold_key;
use crate::normalize::dates::ResumeDate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletEdit {
    /// Index of the experience entry in the `before` document.
    pub source_index: usize,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceDecisions {
    /// Indices into `before` whose signature survives.
    pub kept: Vec<usize>,
    /// Indices into `before` whose signature is gone.
    pub removed: Vec<usize>,
    /// Indices into `after` with a new signature.
    pub added: Vec<usize>,
    pub bullet_edits: Vec<BulletEdit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListChange {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ListChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillChange {
    pub category: String,
    #[serde(flatten)]
    pub change: ListChange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDiff {
    pub decisions: ExperienceDecisions,
    pub header: Vec<FieldChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<FieldChange>,
    pub skills: Vec<SkillChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<ListChange>,
    /// School names only, compared case-insensitively.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<ListChange>,
}

/// Experiences are matched on a company / title / start / end signature. Lists are
/// compared as case- and whitespace-insensitive sets.
pub fn compute_resume_diff(before: &ResumeDocument, after: &ResumeDocument) -> ResumeDiff {
    let before_sigs: Vec<String> = before.experience.iter().map(signature).collect();
    let after_sigs: Vec<String> = after.experience.iter().map(signature).collect();
    // Later duplicates overwrite earlier ones, so a signature maps to its last index.
    let after_index: HashMap<&str, usize> = after_sigs
        .iter()
        .enumerate()
        .map(|(i, sig)| (sig.as_str(), i))
        .collect();
    let before_set: HashSet<&str> = before_sigs.iter().map(String::as_str).collect();

    let mut decisions = ExperienceDecisions::default();
    for (bi, sig) in before_sigs.iter().enumerate() {
        let Some(&ai) = after_index.get(sig.as_str()) else {
            decisions.removed.push(bi);
            continue;
        };
        decisions.kept.push(bi);

        let old = before.experience[bi].bullets.join("\n");
        let new = after.experience[ai].bullets.join("\n");
        if fold_key(&old) != fold_key(&new) {
            decisions.bullet_edits.push(BulletEdit {
                source_index: bi,
                before: old,
                after: new,
            });
        }
    }
    decisions.added = after_sigs
        .iter()
        .enumerate()
        .filter(|(_, sig)| !before_set.contains(sig.as_str()))
        .map(|(i, _)| i)
        .collect();

    let header = [
        ("fullName", Some(&before.header.full_name), Some(&after.header.full_name)),
        ("email", before.header.email.as_ref(), after.header.email.as_ref()),
        ("phone", before.header.phone.as_ref(), after.header.phone.as_ref()),
        ("location", before.header.location.as_ref(), after.header.location.as_ref()),
    ]
    .into_iter()
    .filter_map(|(field, old, new)| field_change(field, old, new))
    .collect();

    let no_skills = Skills::default();
    let skills = before
        .skills
        .as_ref()
        .unwrap_or(&no_skills)
        .categories()
        .into_iter()
        .zip(after.skills.as_ref().unwrap_or(&no_skills).categories())
        .map(|((category, old), (_, new))| SkillChange {
            category: category.to_string(),
            change: list_diff(old, new),
        })
        .filter(|c| !c.change.is_empty())
        .collect();

    let schools = |doc: &ResumeDocument| -> Vec<String> {
        doc.education.iter().map(|e| fold_key(&e.school)).collect()
    };

    ResumeDiff {
        decisions,
        header,
        summary: field_change("summary", before.summary.as_ref(), after.summary.as_ref()),
        skills,
        languages: non_empty_change(list_diff(
            before.languages.as_deref().unwrap_or_default(),
            after.languages.as_deref().unwrap_or_default(),
        )),
        education: non_empty_change(list_diff(&schools(before), &schools(after))),
    }
}

/// A few plain sentences summarizing `diff`.
pub fn build_narrative(diff: &ResumeDiff) -> String {
    let d = &diff.decisions;
    let mut lines = vec![
        "Your resume was tailored while keeping its structure and reverse-chronological order."
            .to_string(),
    ];

    let mut experiences = format!("Experiences: {} kept", d.kept.len());
    if !d.removed.is_empty() {
        experiences.push_str(&format!(", {} removed", d.removed.len()));
    }
    if !d.added.is_empty() {
        experiences.push_str(&format!(", {} added", d.added.len()));
    }
    experiences.push('.');
    lines.push(experiences);

    if !d.bullet_edits.is_empty() {
        lines.push(format!(
            "{} role(s) had bullets rewritten for terminology alignment.",
            d.bullet_edits.len()
        ));
    }
    if !diff.header.is_empty() {
        lines.push("Header: some fields were harmonized (e.g., location/contact).".to_string());
    }
    if diff.summary.is_some() {
        lines.push("Summary: rewritten.".to_string());
    }
    if !diff.skills.is_empty() {
        lines.push("Skills: regrouped, deduplicated, and prioritized by relevance.".to_string());
    }
    lines.join("\n")
}

fn signature(e: &Experience) -> String {
    let date = |d: Option<ResumeDate>| d.map(|d| d.to_string()).unwrap_or_default();
    [
        fold_key(&e.company),
        fold_key(&e.title),
        fold_key(&date(e.start_date)),
        fold_key(&date(e.end_date)),
    ]
    .join("|")
}

fn field_change(field: &str, before: Option<&String>, after: Option<&String>) -> Option<FieldChange> {
    let fold = |v: Option<&String>| v.map(|s| fold_key(s)).unwrap_or_default();
    (fold(before) != fold(after)).then(|| FieldChange {
        field: field.to_string(),
        before: before.cloned(),
        after: after.cloned(),
    })
}

fn list_diff(before: &[String], after: &[String]) -> ListChange {
    let before_keys: HashSet<String> = before.iter().map(|s| fold_key(s)).collect();
    let after_keys: HashSet<String> = after.iter().map(|s| fold_key(s)).collect();
    ListChange {
        added: after
            .iter()
            .filter(|s| !before_keys.contains(&fold_key(s)))
            .cloned()
            .collect(),
        removed: before
            .iter()
            .filter(|s| !after_keys.contains(&fold_key(s)))
            .cloned()
            .collect(),
    }
}

fn non_empty_change(change: ListChange) -> Option<ListChange> {
    (!change.is_empty()).then_some(change)
}
