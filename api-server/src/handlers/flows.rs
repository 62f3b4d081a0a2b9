//! Flow service handlers (`/api/v1/flows`)

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use pulse_core::analysis::{FlowMetadata, FlowPrediction};
use pulse_core::features::FlowRecord;

use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct PredictRequest {
    #[validate(length(min = 1, message = "records must not be empty"))]
    pub records: Vec<FlowRecord>,
}

#[derive(Serialize)]
pub struct FlowHealth {
    status: &'static str,
    model: String,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "CICIDS2017 intrusion-detection backend is running" }))
}

pub async fn health(State(state): State<AppState>) -> AppResult<Json<FlowHealth>> {
    let predictor = state.flows()?;
    Ok(Json(FlowHealth { status: "ok", model: predictor.model_name().to_string() }))
}

pub async fn metadata(State(state): State<AppState>) -> AppResult<Json<FlowMetadata>> {
    Ok(Json(state.flows()?.metadata()))
}

pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<FlowPrediction>> {
    let predictor = state.flows()?;
    let Json(req) = body.map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(state.config.max_upload_mb()),
        _ => AppError::ValidationError(e.body_text()),
    })?;
    req.validate()?;

    let prediction = predictor.predict(&req.records)?;
    tracing::debug!("Classified {} flow records", prediction.predictions.len());
    Ok(Json(prediction))
}
