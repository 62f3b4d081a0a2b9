//! Error handling

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Capture bytes that are neither pcap nor pcapng, or are truncated
    #[error("Capture error: {0}")]
    Capture(String),

    /// Model file missing, malformed, or structurally invalid
    #[error("Model error: {0}")]
    Model(String),

    #[error("Feature mismatch: model expects {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    /// Feature vector built under a different packet layout
    #[error("Feature layout mismatch: {0}")]
    Layout(String),

    /// Feature list or tabular input problems
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<pcap_file::PcapError> for CoreError {
    fn from(err: pcap_file::PcapError) -> Self {
        CoreError::Capture(err.to_string())
    }
}
