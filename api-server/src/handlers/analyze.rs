//! Capture analysis handlers
//!
//! Parsing and scoring are CPU-bound and run on the blocking pool.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, FromRequest, Multipart, Request, State},
    http::{header, HeaderMap},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use pulse_core::analysis::{AnalysisReport, QuickReport};
use pulse_core::capture::read_capture_file;
use pulse_core::CoreError;

use super::upload::{read_file_field, require_multipart};
use crate::storage::allowed_file;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AnalyzeRequest {
    pub filename: Option<String>,
    /// Negative values list threat packets only
    #[validate(range(max = 1_000_000, message = "max_details is out of range"))]
    pub max_details: Option<i64>,
}

impl AnalyzeRequest {
    /// An empty body means "no fields"; anything else must be valid JSON
    fn parse(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::ValidationError(format!("Invalid request body: {}", e)))
    }

    fn max_details_or(&self, default: usize) -> usize {
        self.max_details
            .map_or(default, |d| usize::try_from(d).unwrap_or(0))
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.starts_with("multipart/form-data"))
}

fn capture_error(err: CoreError) -> AppError {
    match err {
        CoreError::Capture(msg) => AppError::CaptureError(msg),
        other => AppError::CaptureError(other.to_string()),
    }
}

/// Analyze a stored capture (JSON `{filename, max_details}`) or a capture
/// uploaded in the same request (multipart `file`)
pub async fn analyze(State(state): State<AppState>, request: Request) -> AppResult<Json<AnalysisReport>> {
    let analyzer = state.packets()?;
    let limit_mb = state.config.max_upload_mb();

    let (filename, path, max_details) = if is_multipart(request.headers()) {
        let mut multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::ValidationError(e.body_text()))?;

        let file = read_file_field(&mut multipart, limit_mb)
            .await?
            .ok_or_else(|| AppError::ValidationError("No filename provided".to_string()))?;
        if file.name.is_empty() || !allowed_file(&file.name) {
            return Err(AppError::ValidationError("Invalid file".to_string()));
        }

        let stored = state.uploads.save(&file.name, &file.bytes).await?;
        (stored.filename, stored.path, state.config.default_max_details)
    } else {
        let body = Bytes::from_request(request, &state).await.map_err(|e| {
            if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge(limit_mb)
            } else {
                AppError::ValidationError(e.body_text())
            }
        })?;

        let req = AnalyzeRequest::parse(&body)?;
        req.validate()?;
        let max_details = req.max_details_or(state.config.default_max_details);

        let filename = req
            .filename
            .filter(|f| !f.is_empty())
            .ok_or_else(|| AppError::ValidationError("No filename provided".to_string()))?;
        let path = state
            .uploads
            .resolve(&filename)
            .await
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        (filename, path, max_details)
    };

    tracing::info!("Analyzing {} (max_details {})", filename, max_details);

    let report = tokio::task::spawn_blocking(move || -> Result<AnalysisReport, CoreError> {
        let capture = read_capture_file(&path)?;
        Ok(analyzer.analyze(&capture, &filename, max_details))
    })
    .await?
    .map_err(|e| AppError::AnalysisFailed(e.to_string()))?;

    Ok(Json(report))
}

/// Upload and quick-scan in one call
pub async fn analyze_quick(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<QuickReport>> {
    let analyzer = state.packets()?;
    let mut multipart = require_multipart(multipart)?;

    let file = read_file_field(&mut multipart, state.config.max_upload_mb())
        .await?
        .ok_or_else(|| AppError::ValidationError("No file provided".to_string()))?;
    tracing::info!("Quick analysis: {} ({} bytes)", file.name, file.bytes.len());

    if file.name.is_empty() || !allowed_file(&file.name) {
        return Err(AppError::ValidationError("Invalid file".to_string()));
    }

    let stored = state.uploads.save(&file.name, &file.bytes).await?;

    let report = tokio::task::spawn_blocking(move || -> Result<QuickReport, CoreError> {
        let capture = read_capture_file(&stored.path)?;
        tracing::debug!("Read {} packets from {}", capture.len(), stored.filename);
        Ok(analyzer.quick_scan(&capture))
    })
    .await?
    .map_err(capture_error)?;

    Ok(Json(report))
}
