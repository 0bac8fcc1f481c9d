use std::path::Path;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{DraftResume, ResumeDocument};
use crate::normalize::pipeline::{DiffOutcome, NormalizeOutcome};
use crate::normalize::salvage::salvage_json;
use crate::normalize::sanitizer::SanitizeContext;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExtractRequest {
    pub source_text: String,
}

#[derive(Deserialize)]
pub struct SanitizeRequest {
    #[serde(default)]
    pub candidate: Value,
    #[serde(default)]
    pub source_text: String,
    #[serde(default)]
    pub auxiliary_reference_text: String,
}

#[derive(Deserialize)]
pub struct NormalizeRequest {
    pub source_text: String,
    /// Generated draft, already parsed.
    #[serde(default)]
    pub ai_draft: Option<Value>,
    /// Raw generator output; salvaged into JSON when `ai_draft` is absent.
    #[serde(default)]
    pub ai_output: Option<String>,
    #[serde(default)]
    pub auxiliary_reference_text: String,
}

#[derive(Deserialize)]
pub struct DiffRequest {
    #[serde(default)]
    pub before: Value,
    #[serde(default)]
    pub after: Value,
    #[serde(default)]
    pub source_text: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub document: ResumeDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Pdf,
    Text,
}

impl UploadKind {
    fn from_filename(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(UploadKind::Pdf),
            "txt" => Some(UploadKind::Text),
            _ => None,
        }
    }
}

/// POST /api/v1/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<DraftResume>, AppError> {
    check_source_size(&req.source_text, state.config.max_source_text_bytes)?;
    let draft = state.normalizer.extract(&req.source_text);
    info!(
        "Extracted draft: {} experience, {} education entries",
        draft.experience.len(),
        draft.education.len()
    );
    Ok(Json(draft))
}

/// POST /api/v1/sanitize
pub async fn handle_sanitize(
    State(state): State<AppState>,
    Json(req): Json<SanitizeRequest>,
) -> Result<Json<ResumeDocument>, AppError> {
    check_source_size(&req.source_text, state.config.max_source_text_bytes)?;
    let ctx = SanitizeContext::new(&req.source_text).with_auxiliary(&req.auxiliary_reference_text);
    let document = state.normalizer.sanitize(&req.candidate, &ctx);
    info!("Sanitized candidate (language: {})", document.metadata.language);
    Ok(Json(document))
}

/// POST /api/v1/normalize
pub async fn handle_normalize(
    State(state): State<AppState>,
    Json(req): Json<NormalizeRequest>,
) -> Result<Json<NormalizeOutcome>, AppError> {
    check_source_size(&req.source_text, state.config.max_source_text_bytes)?;

    let generated = match (req.ai_draft, req.ai_output.as_deref()) {
        (Some(draft), _) => Some(draft),
        (None, Some(raw)) => {
            let salvaged = salvage_json(raw);
            if salvaged.is_none() {
                warn!("Generated output is not recoverable JSON; using the extracted draft alone");
            }
            salvaged
        }
        (None, None) => None,
    };

    let ctx = SanitizeContext::new(&req.source_text).with_auxiliary(&req.auxiliary_reference_text);
    let outcome = state.normalizer.normalize(generated.as_ref(), &ctx);
    info!(
        "Normalized resume from {:?} draft: {} experience entries",
        outcome.draft_source,
        outcome.document.experience.len()
    );
    Ok(Json(outcome))
}

/// POST /api/v1/diff
pub async fn handle_diff(
    State(state): State<AppState>,
    Json(req): Json<DiffRequest>,
) -> Result<Json<DiffOutcome>, AppError> {
    check_source_size(&req.source_text, state.config.max_source_text_bytes)?;
    let ctx = SanitizeContext::new(&req.source_text);
    let outcome = state.normalizer.diff(&req.before, &req.after, &ctx);
    info!(
        "Diffed documents: {} kept, {} removed, {} added",
        outcome.diff.decisions.kept.len(),
        outcome.diff.decisions.removed.len(),
        outcome.diff.decisions.added.len()
    );
    Ok(Json(outcome))
}

/// POST /api/v1/upload
/// Accepts a multipart `file` field holding a `.pdf` or `.txt` resume.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let kind = UploadKind::from_filename(&filename).ok_or_else(|| {
            AppError::UnsupportedMediaType(format!("'{filename}' is not a .pdf or .txt file"))
        })?;

        let bytes = field.bytes().await?;
        if bytes.len() > state.config.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "'{filename}' is {} bytes; the limit is {}",
                bytes.len(),
                state.config.max_upload_bytes
            )));
        }

        let text = read_upload(kind, bytes).await?;
        if text.trim().is_empty() {
            return Err(AppError::UnprocessableEntity(format!(
                "No text could be read from '{filename}'"
            )));
        }
        check_source_size(&text, state.config.max_source_text_bytes)?;

        let outcome = state.normalizer.normalize(None, &SanitizeContext::new(&text));
        info!(
            "Normalized upload '{filename}' ({:?}, {} chars of text)",
            kind,
            text.chars().count()
        );
        return Ok(Json(UploadResponse {
            filename,
            document: outcome.document,
        }));
    }

    Err(AppError::Validation("Multipart field 'file' is missing".to_string()))
}

async fn read_upload(kind: UploadKind, bytes: Bytes) -> Result<String, AppError> {
    match kind {
        UploadKind::Text => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        UploadKind::Pdf => tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::UnprocessableEntity(format!("PDF text extraction failed: {e}"))),
    }
}

fn check_source_size(text: &str, limit: usize) -> Result<(), AppError> {
    if text.len() > limit {
        return Err(AppError::PayloadTooLarge(format!(
            "source_text is {} bytes; the limit is {limit}",
            text.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_kind_from_filename() {
        assert_eq!(UploadKind::from_filename("cv.pdf"), Some(UploadKind::Pdf));
        assert_eq!(UploadKind::from_filename("CV.PDF"), Some(UploadKind::Pdf));
        assert_eq!(UploadKind::from_filename("notes.txt"), Some(UploadKind::Text));
        assert_eq!(UploadKind::from_filename("cv.docx"), None);
        assert_eq!(UploadKind::from_filename("README"), None);
    }

    #[test]
    fn test_check_source_size() {
        assert!(check_source_size("abc", 3).is_ok());
        assert!(matches!(
            check_source_size("abcd", 3),
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_read_text_upload_is_lossy() {
        let bytes = Bytes::from_static(b"Jane \xff Doe");
        let text = read_upload(UploadKind::Text, bytes).await.unwrap();
        assert!(text.starts_with("Jane "));
        assert!(text.ends_with(" Doe"));
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_unprocessable() {
        let bytes = Bytes::from_static(b"not a pdf at all");
        let err = read_upload(UploadKind::Pdf, bytes).await.unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }
}
