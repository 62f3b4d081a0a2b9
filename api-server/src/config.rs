//! Configuration module

use std::env;
use std::path::PathBuf;

use pulse_core::constants::{DEFAULT_MAX_DETAILS, DEFAULT_MAX_UPLOAD_BYTES};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Directory holding uploaded captures
    pub upload_dir: PathBuf,

    /// Request body limit in bytes
    pub max_upload_bytes: usize,

    /// Packet model (tree-ensemble JSON)
    pub packet_model_path: PathBuf,

    /// Flow model (tree-ensemble JSON)
    pub flow_model_path: PathBuf,

    /// Selected-features CSV for the flow model
    pub flow_features_path: PathBuf,

    /// Packets always listed in `packet_details` when a request gives no value
    pub default_max_details: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),

            max_upload_bytes: upload_limit_bytes(env::var("MAX_UPLOAD_MB").ok().as_deref()),

            packet_model_path: env::var("PACKET_MODEL_PATH")
                .unwrap_or_else(|_| "models/packet_model.json".to_string())
                .into(),

            flow_model_path: env::var("FLOW_MODEL_PATH")
                .or_else(|_| env::var("MODEL_PATH"))
                .unwrap_or_else(|_| "model/xgboost.json".to_string())
                .into(),

            flow_features_path: env::var("FLOW_FEATURES_PATH")
                .unwrap_or_else(|_| "results/selected_features.csv".to_string())
                .into(),

            default_max_details: env::var("DEFAULT_MAX_DETAILS")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(DEFAULT_MAX_DETAILS),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Upload limit in whole megabytes, as shown in error messages
    pub fn max_upload_mb(&self) -> usize {
        self.max_upload_bytes / (1024 * 1024)
    }
}

/// `MAX_UPLOAD_MB` in bytes; unparsable or overflowing values fall back to the default
fn upload_limit_bytes(mb: Option<&str>) -> usize {
    mb.and_then(|m| m.trim().parse::<usize>().ok())
        .and_then(|mb| mb.checked_mul(1024 * 1024))
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
}
