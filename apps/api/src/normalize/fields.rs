//! Field extractors: contact details, dated experience blocks, schools, skills and flat lists.
//!
//! Everything here is heuristic and best-effort. Results feed a draft that the sanitizer
//! still has to validate, so a miss is always preferable to a guess that fabricates content.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DraftEducation, DraftExperience, DraftProject, Links, Skills};
use crate::normalize::tables::{HeuristicTables, TableError};
use crate::normalize::text::{content_lines, BULLET_GLYPHS};

/// Unmarked lines longer than this count as bullets.
const BULLET_MIN_CHARS: usize = 12;

/// Minimum length of an uppercase run read as a company name.
const COMPANY_MIN_CHARS: usize = 3;

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").unwrap());
static RE_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+[0-9]{1,3}[ \t.-]?)?(0|\+?[0-9]{1,3})?[ \t.-]?([0-9][ \t.-]?){8,12}").unwrap()
});
static RE_LINKEDIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:https?://)?(?:[a-z0-9-]+\.)*linkedin\.com/[^\s,;|()<>"]+"#).unwrap()
});
static RE_GITHUB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:https?://)?(?:[a-z0-9-]+\.)*github\.com/[^\s,;|()<>"]+"#).unwrap()
});
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)https?://[^\s,;|()<>"]+"#).unwrap());
static RE_BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static RE_DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(present|présent|[0-9]{1,2}/[0-9]{4}|[0-9]{4}-[0-9]{2}\b|[0-9]{4})",
        r"\s*(?:–|—|-|to|au|/)\s*",
        r"(present|présent|[0-9]{1,2}/[0-9]{4}|[0-9]{4}-[0-9]{2}\b|[0-9]{4})",
    ))
    .unwrap()
});
static RE_YEAR_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([0-9]{4})(?:\s*[–-]\s*([0-9]{4}))?\b").unwrap());
static RE_UPPER_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-ZÀÂÄÇÉÈÊËÏÎÔÖÙÛÜŸ][A-ZÀÂÄÇÉÈÊËÏÎÔÖÙÛÜŸ' \&\-]*[A-ZÀÂÄÇÉÈÊËÏÎÔÖÙÛÜŸ]\b").unwrap()
});
static RE_SKILL_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;,|•·]").unwrap());
static RE_LIST_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;•,]").unwrap());

// ── Contact details ─────────────────────────────────────────────────────

pub fn extract_email(text: &str) -> Option<String> {
    RE_EMAIL.find(text).map(|m| m.as_str().to_string())
}

/// First phone-shaped run holding at least eight digits, separators trimmed.
pub fn extract_phone(text: &str) -> Option<String> {
    RE_PHONE
        .find_iter(text)
        .map(|m| m.as_str().trim_matches(|c: char| c.is_whitespace() || c == '.' || c == '-'))
        .find(|p| p.chars().filter(char::is_ascii_digit).count() >= 8)
        .map(str::to_string)
}

/// LinkedIn and GitHub profiles (scheme optional). When neither is present, the first
/// `http(s)` URL is taken as a portfolio.
///
/// The portfolio pick is best-effort: a personal site next to a LinkedIn or GitHub profile
/// is not reported.
pub fn extract_links(text: &str) -> Links {
    let find = |re: &Regex| re.find(text).map(|m| trim_url(m.as_str()));
    let linkedin = find(&*RE_LINKEDIN);
    let github = find(&*RE_GITHUB);
    let portfolio = if linkedin.is_none() && github.is_none() {
        find(&*RE_URL)
    } else {
        None
    };
    Links {
        linkedin,
        github,
        portfolio,
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches(['.', ','].as_slice()).to_string()
}

// ── Lines and blocks ────────────────────────────────────────────────────

/// Blank-line separated blocks that hold any content.
pub fn split_blocks(body: &str) -> impl Iterator<Item = &str> {
    RE_BLOCK_BREAK.split(body).filter(|b| !b.trim().is_empty())
}

/// Text after a leading bullet marker, or `None` when the line is not marked.
pub fn strip_bullet(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix(|c: char| c == '-' || c == '*' || BULLET_GLYPHS.contains(&c))
        .map(str::trim_start)
}

/// Bullet lines of a block: marked lines (marker stripped) and unmarked lines longer than
/// twelve characters. Duplicates are dropped, order is kept.
pub fn extract_bullets<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let picked = lines
        .into_iter()
        .map(str::trim)
        .filter_map(|line| match strip_bullet(line) {
            Some(item) => Some(item),
            None => (line.chars().count() > BULLET_MIN_CHARS).then_some(line),
        })
        .filter(|item| !item.is_empty())
        .collect();
    dedupe(picked)
}

/// Items of a comma/semicolon separated list section (languages, interests).
pub fn parse_flat_list(body: &str) -> Vec<String> {
    let items = content_lines(body)
        .map(|line| strip_bullet(line).unwrap_or(line))
        .flat_map(|line| RE_LIST_SPLIT.split(line))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    dedupe(items)
}

/// One project per block, or one per line when every line of a block is a bullet.
/// A bulleted `name: detail` line splits into the project name and a bullet.
pub fn parse_projects(body: &str) -> Vec<DraftProject> {
    split_blocks(body).flat_map(parse_project_block).collect()
}

fn parse_project_block(block: &str) -> Vec<DraftProject> {
    let lines: Vec<&str> = content_lines(block).collect();
    if !lines.is_empty() && lines.iter().all(|l| strip_bullet(l).is_some()) {
        return lines
            .iter()
            .filter_map(|l| strip_bullet(l))
            .map(|item| match item.split_once(':') {
                Some((name, detail)) => DraftProject {
                    name: non_blank(name),
                    bullets: non_blank(detail).into_iter().collect(),
                    dates: year_range(item),
                },
                None => DraftProject {
                    name: non_blank(&strip_dates(item)),
                    bullets: Vec::new(),
                    dates: year_range(item),
                },
            })
            .collect();
    }
    let Some(&head) = lines.first() else {
        return Vec::new();
    };
    let head = strip_bullet(head).unwrap_or(head);
    vec![DraftProject {
        name: non_blank(&strip_dates(head)),
        bullets: extract_bullets(lines[1..].iter().copied()),
        dates: year_range(head).or_else(|| year_range(block)),
    }]
}

// ── Table-driven extractors ─────────────────────────────────────────────

/// Extractors whose vocabularies come from [`HeuristicTables`].
#[derive(Debug, Clone)]
pub struct FieldExtractors {
    school: Option<Regex>,
    degree: Option<Regex>,
    location: Option<Regex>,
    skill_languages: Vec<String>,
    skill_frameworks: Vec<String>,
}

impl FieldExtractors {
    pub fn new(tables: &HeuristicTables) -> Result<Self, TableError> {
        let phrase = |words: &[String]| -> Result<Option<Regex>, TableError> {
            alternation(words)
                .map(|alts| Regex::new(&format!(r"(?i)\b(?:{alts})\s[^\n,|]*")))
                .transpose()
                .map_err(TableError::from)
        };
        let location = alternation(&tables.known_locations)
            .map(|alts| Regex::new(&format!(r"(?i)\b(?:{alts})\b")))
            .transpose()?;

        Ok(Self {
            school: phrase(&tables.school_keywords)?,
            degree: phrase(&tables.degree_keywords)?,
            location,
            skill_languages: lowercased(&tables.skill_languages),
            skill_frameworks: lowercased(&tables.skill_frameworks),
        })
    }

    /// First known location mentioned in `text`.
    pub fn find_location(&self, text: &str) -> Option<String> {
        find_in(self.location.as_ref(), text)
    }

    pub fn parse_experience(&self, body: &str) -> Vec<DraftExperience> {
        split_blocks(body)
            .filter_map(|block| self.parse_experience_block(block))
            .collect()
    }

    fn parse_experience_block(&self, block: &str) -> Option<DraftExperience> {
        let lines: Vec<&str> = content_lines(block).collect();
        let head = *lines.first()?;
        let range = RE_DATE_RANGE.captures(block);
        let (company, title) = company_and_title(&strip_dates(head));

        let mut bullets = extract_bullets(lines[1..].iter().copied().filter(|l| has_words(l)));
        if bullets.is_empty() {
            bullets.push(strip_bullet(head).unwrap_or(head).to_string());
        }

        Some(DraftExperience {
            company,
            title,
            location: self.find_location(block),
            start_date_raw: range.as_ref().map(|c| c[1].to_string()),
            end_date_raw: range.as_ref().map(|c| c[2].to_string()),
            dates_raw: range.as_ref().map(|c| c[0].to_string()),
            bullets,
        })
    }

    pub fn parse_education(&self, body: &str) -> Vec<DraftEducation> {
        split_blocks(body)
            .map(|block| DraftEducation {
                school: find_in(self.school.as_ref(), block),
                degree: find_in(self.degree.as_ref(), block),
                location: self.find_location(block),
                dates: year_range(block),
            })
            .collect()
    }

    /// Splits skill lines into tokens and buckets them against the allow-lists.
    ///
    /// When nothing matches a language or framework, every token lands in `other`.
    pub fn parse_skills(&self, body: &str) -> Option<Skills> {
        let mut tokens: Vec<String> = Vec::new();
        for line in content_lines(body) {
            let line = strip_bullet(line).unwrap_or(line);
            let items = line.split_once(':').map_or(line, |(_, rest)| rest);
            for token in RE_SKILL_SPLIT.split(items).map(str::trim).filter(|t| !t.is_empty()) {
                if !tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                    tokens.push(token.to_string());
                }
            }
        }
        if tokens.is_empty() {
            return None;
        }

        let (mut languages, mut frameworks, mut tools) = (Vec::new(), Vec::new(), Vec::new());
        for token in tokens {
            let lowered = token.to_lowercase();
            if self.skill_languages.contains(&lowered) {
                languages.push(token);
            } else if self.skill_frameworks.contains(&lowered) {
                frameworks.push(token);
            } else {
                tools.push(token);
            }
        }

        if languages.is_empty() && frameworks.is_empty() {
            return Some(Skills {
                other: Some(tools),
                ..Skills::default()
            });
        }
        Some(Skills {
            languages: non_empty(languages),
            frameworks: non_empty(frameworks),
            tools: non_empty(tools),
            other: None,
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn alternation(words: &[String]) -> Option<String> {
    let alts: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    (!alts.is_empty()).then(|| alts.join("|"))
}

fn lowercased(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.trim().to_lowercase()).collect()
}

fn find_in(re: Option<&Regex>, text: &str) -> Option<String> {
    re?.find(text).and_then(|m| non_blank(m.as_str()))
}

fn year_range(text: &str) -> Option<String> {
    RE_YEAR_RANGE.find(text).map(|m| m.as_str().to_string())
}

fn strip_dates(line: &str) -> String {
    let stripped = RE_DATE_RANGE.replace_all(line, "");
    let stripped = RE_YEAR_RANGE.replace_all(&stripped, "");
    trim_separators(&stripped).to_string()
}

fn has_words(line: &str) -> bool {
    RE_DATE_RANGE.replace_all(line, "").chars().any(char::is_alphabetic)
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '|' | '-' | '–' | '—' | '@' | '(' | ')'))
}

/// `Title | Company`, else an uppercase run as company with the rest of the line as title.
fn company_and_title(head: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = head
        .split('|')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() >= 2 {
        return (non_blank(parts[1]), non_blank(parts[0]));
    }

    let company = RE_UPPER_RUN
        .find_iter(head)
        .find(|m| m.as_str().trim().chars().count() >= COMPANY_MIN_CHARS);
    let Some(company) = company else {
        return (None, non_blank(head));
    };

    let before = trim_separators(&head[..company.start()]);
    let before = before
        .strip_suffix(" at")
        .or_else(|| before.strip_suffix(" chez"))
        .unwrap_or(before);
    let title = non_blank(before).or_else(|| non_blank(trim_separators(&head[company.end()..])));
    (non_blank(company.as_str()), title.or_else(|| non_blank(head)))
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

fn dedupe(items: Vec<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.iter().any(|o| o == item) {
            out.push(item.to_string());
        }
    }
    out
}
