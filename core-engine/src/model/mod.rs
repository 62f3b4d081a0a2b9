//! Model Module - Tree-ensemble inference
//!
//! - `ensemble`: JSON tree-ensemble document and its evaluator
//! - `inference`: loaded model with metadata and latency tracking
//! - `labels`: class name sets

pub mod ensemble;
pub mod inference;
pub mod labels;

pub use ensemble::{predict_proba_batch, Aggregation, Node, SplitRule, Tree, TreeEnsemble};
pub use inference::{EngineStatus, LoadedModel, ModelMetadata, PredictionResult};
pub use labels::LabelSet;

use crate::error::CoreResult;

/// Anything that maps a feature row to class probabilities
pub trait Classifier: Send + Sync {
    fn num_features(&self) -> usize;

    fn num_classes(&self) -> usize;

    /// One probability per class, summing to 1
    fn predict_proba(&self, x: &[f32]) -> CoreResult<Vec<f64>>;

    /// Argmax of `predict_proba`; ties go to the lower class id
    fn predict(&self, x: &[f32]) -> CoreResult<usize> {
        Ok(argmax(&self.predict_proba(x)?))
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::argmax;

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[1.0]), 0);
        assert_eq!(argmax(&[]), 0);
    }
}
