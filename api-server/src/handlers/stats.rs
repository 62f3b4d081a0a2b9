//! Upload statistics handler

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use pulse_core::model::LabelSet;

use crate::{AppResult, AppState};

/// Uploads listed in `recent_files`
const RECENT_FILES: usize = 10;

#[derive(Serialize)]
pub struct ModelInfo {
    loaded: bool,
    attack_types: BTreeMap<usize, String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    total_files_uploaded: usize,
    recent_files: Vec<String>,
    model_info: ModelInfo,
}

pub async fn stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let files = state.uploads.list_captures().await?;
    let recent = files[files.len().saturating_sub(RECENT_FILES)..].to_vec();

    let labels = match &state.packets {
        Some(analyzer) => analyzer.labels().clone(),
        None => LabelSet::packet_attacks(),
    };

    Ok(Json(StatsResponse {
        total_files_uploaded: files.len(),
        recent_files: recent,
        model_info: ModelInfo {
            loaded: state.packets.is_some(),
            attack_types: labels.iter().map(String::from).enumerate().collect(),
        },
    }))
}
