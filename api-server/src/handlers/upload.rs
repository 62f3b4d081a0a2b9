//! Capture upload handler

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::multipart_error;
use crate::storage::allowed_file;
use crate::{AppError, AppResult, AppState};

/// Multipart field carrying the capture
pub const FILE_FIELD: &str = "file";

/// File part of a multipart request
pub struct UploadedFile {
    /// Client-side name; empty when none was sent
    pub name: String,
    pub bytes: Bytes,
}

#[derive(Serialize)]
pub struct UploadResponse {
    message: &'static str,
    filename: String,
    filepath: String,
}

/// Read the `file` field, skipping any other parts
pub async fn read_file_field(multipart: &mut Multipart, limit_mb: usize) -> AppResult<Option<UploadedFile>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit_mb))?;
        return Ok(Some(UploadedFile { name, bytes }));
    }
    Ok(None)
}

/// Non-multipart bodies carry no file at all
pub fn require_multipart(multipart: Result<Multipart, MultipartRejection>) -> AppResult<Multipart> {
    multipart.map_err(|e| {
        tracing::debug!("Rejected multipart body: {}", e.body_text());
        AppError::ValidationError("No file provided".to_string())
    })
}

/// Store a capture for later analysis
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut multipart = require_multipart(multipart)?;
    let file = read_file_field(&mut multipart, state.config.max_upload_mb())
        .await?
        .ok_or_else(|| AppError::ValidationError("No file provided".to_string()))?;

    if file.name.is_empty() {
        return Err(AppError::ValidationError("No file selected".to_string()));
    }
    if !allowed_file(&file.name) {
        return Err(AppError::ValidationError(
            "Invalid file type. Allowed: pcap, pcapng, cap".to_string(),
        ));
    }

    let stored = state.uploads.save(&file.name, &file.bytes).await?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully",
        filename: stored.filename,
        filepath: stored.path.display().to_string(),
    }))
}
