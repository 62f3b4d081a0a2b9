//! Flow Feature Schema
//!
//! Ordered list of CICIDS2017 flow columns a flow model was trained on.
//! The list is produced during feature selection and stored as a CSV with a
//! single `TopFeatures` column.

use std::collections::HashMap;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Column holding feature names in the selected-features CSV
pub const TOP_FEATURES_COLUMN: &str = "TopFeatures";

/// One flow record keyed by column name
pub type FlowRecord = HashMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSchema {
    features: Vec<String>,
}

impl FlowSchema {
    pub fn new(features: Vec<String>) -> Self {
        Self { features }
    }

    /// Load the selected-features CSV
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::Schema(format!(
                "Selected feature list missing at {}",
                path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let column = reader
            .headers()?
            .iter()
            .position(|h| h.trim() == TOP_FEATURES_COLUMN)
            .ok_or_else(|| {
                CoreError::Schema(format!(
                    "selected_features.csv must contain a '{}' column",
                    TOP_FEATURES_COLUMN
                ))
            })?;

        let mut features = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(name) = record.get(column) {
                if !name.is_empty() {
                    features.push(name.to_string());
                }
            }
        }

        log::info!("Loaded {} flow features from {}", features.len(), path.display());
        Ok(Self { features })
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Values in schema order; absent columns become 0.0
    pub fn row(&self, record: &FlowRecord) -> Vec<f32> {
        self.features
            .iter()
            .map(|name| record.get(name).copied().unwrap_or(0.0) as f32)
            .collect()
    }

    /// One row per record
    pub fn matrix(&self, records: &[FlowRecord]) -> Array2<f32> {
        let mut matrix = Array2::<f32>::zeros((records.len(), self.features.len()));
        for (mut out, record) in matrix.rows_mut().into_iter().zip(records) {
            for (slot, value) in out.iter_mut().zip(self.row(record)) {
                *slot = value;
            }
        }
        matrix
    }
}
