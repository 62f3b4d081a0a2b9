//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use pulse_core::model::EngineStatus;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model_loaded: bool,
    flow_model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    engine: Option<EngineStatus>,
    timestamp: String,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model_loaded: state.packets.is_some(),
        flow_model_loaded: state.flows.is_some(),
        engine: state.packets.as_ref().map(|p| p.model().status()),
        timestamp: chrono::Local::now().to_rfc3339(),
    })
}
