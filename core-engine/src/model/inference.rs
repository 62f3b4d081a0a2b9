//! Inference Engine - loaded tree ensemble
//!
//! Wraps a validated `TreeEnsemble` with file metadata and latency counters.
//! Shared across threads behind an `Arc`; counters are atomics so scoring
//! never takes a write lock.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ensemble::TreeEnsemble;
use super::{argmax, Classifier};
use crate::error::{CoreError, CoreResult};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub file_name: String,
    /// "boosted-softmax", "boosted-binary" or "averaged-trees"
    pub model_type: String,
    pub num_trees: usize,
    pub features: usize,
    pub classes: usize,
    /// SHA-256 of the model file, hex
    pub checksum: String,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub model_name: String,
    pub avg_latency_ms: f32,
    pub inference_count: u64,
    pub last_inference_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PredictionResult {
    pub class_id: usize,
    pub probabilities: Vec<f64>,
    /// Highest class probability, 0.0 - 1.0
    pub confidence: f64,
    pub inference_time_us: u64,
}

// ============================================================================
// LOADED MODEL
// ============================================================================

pub struct LoadedModel {
    ensemble: TreeEnsemble,
    metadata: ModelMetadata,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
    last_inference: RwLock<Option<DateTime<Utc>>>,
}

impl LoadedModel {
    /// Load, checksum and validate a model file
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::Model(format!("Model not found: {}", path.display())));
        }

        let bytes = std::fs::read(path)?;
        let checksum = hex::encode(Sha256::digest(&bytes));
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| CoreError::Model(format!("{} is not UTF-8 JSON", path.display())))?;
        let ensemble = TreeEnsemble::from_json(text)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::info!(
            "Loaded model {} ({}, {} trees, {} features, {} classes, sha256 {})",
            file_name,
            ensemble.kind(),
            ensemble.num_trees(),
            ensemble.num_features,
            ensemble.num_classes,
            &checksum[..12]
        );

        Ok(Self::with_metadata(ensemble, path.display().to_string(), file_name, checksum))
    }

    /// Wrap an in-memory ensemble; it is validated first
    pub fn from_ensemble(ensemble: TreeEnsemble) -> CoreResult<Self> {
        ensemble.validate()?;
        let checksum = hex::encode(Sha256::digest(serde_json::to_vec(&ensemble)?));
        let name = ensemble.name.clone().unwrap_or_else(|| "in-memory".to_string());
        Ok(Self::with_metadata(ensemble, String::new(), name, checksum))
    }

    fn with_metadata(ensemble: TreeEnsemble, model_path: String, file_name: String, checksum: String) -> Self {
        let metadata = ModelMetadata {
            model_path,
            file_name,
            model_type: ensemble.kind().to_string(),
            num_trees: ensemble.num_trees(),
            features: ensemble.num_features,
            classes: ensemble.num_classes,
            checksum,
            loaded_at: Utc::now(),
        };
        Self {
            ensemble,
            metadata,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
            last_inference: RwLock::new(None),
        }
    }

    pub fn ensemble(&self) -> &TreeEnsemble {
        &self.ensemble
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn file_name(&self) -> &str {
        &self.metadata.file_name
    }

    /// Labels embedded in the model document, if any
    pub fn class_labels(&self) -> &[String] {
        &self.ensemble.class_labels
    }

    /// Score one feature row and record latency
    pub fn predict_one(&self, x: &[f32]) -> CoreResult<PredictionResult> {
        let start = Instant::now();
        let probabilities = self.ensemble.predict_proba(x)?;
        let elapsed = start.elapsed().as_micros() as u64;

        self.latency_sum_us.fetch_add(elapsed, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        *self.last_inference.write() = Some(Utc::now());

        let class_id = argmax(&probabilities);
        Ok(PredictionResult {
            class_id,
            confidence: probabilities[class_id],
            probabilities,
            inference_time_us: elapsed,
        })
    }

    pub fn status(&self) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        EngineStatus {
            model_loaded: true,
            model_name: self.metadata.file_name.clone(),
            avg_latency_ms: avg,
            inference_count: count,
            last_inference_at: *self.last_inference.read(),
        }
    }
}

impl Classifier for LoadedModel {
    fn num_features(&self) -> usize {
        self.ensemble.num_features
    }

    fn num_classes(&self) -> usize {
        self.ensemble.num_classes
    }

    fn predict_proba(&self, x: &[f32]) -> CoreResult<Vec<f64>> {
        self.predict_one(x).map(|r| r.probabilities)
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel").field("metadata", &self.metadata).finish()
    }
}
