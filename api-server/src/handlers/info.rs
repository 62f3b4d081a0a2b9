//! Service description handler

use axum::Json;
use serde_json::{json, Value};

use pulse_core::constants::{APP_NAME, APP_VERSION};

pub async fn index() -> Json<Value> {
    Json(json!({
        "name": format!("{} API", APP_NAME),
        "version": APP_VERSION,
        "description": "Network Security Analysis API for PCAP files",
        "endpoints": {
            "GET /": "API information",
            "GET /health": "Health check",
            "POST /upload": "Upload PCAP file for analysis",
            "POST /analyze": "Analyze uploaded PCAP file",
            "POST /analyze-quick": "Upload and analyze in one call",
            "GET /stats": "Get analysis statistics",
            "GET /api/v1/flows/metadata": "Flow model features and classes",
            "POST /api/v1/flows/predict": "Classify CICIDS2017 flow records"
        }
    }))
}
