//! Flow Predictor - CICIDS2017 flow classification

use std::sync::Arc;

use serde::Serialize;

use super::report::LabelMap;
use crate::error::{CoreError, CoreResult};
use crate::features::{FlowRecord, FlowSchema};
use crate::model::{argmax, predict_proba_batch, Classifier, LabelSet, LoadedModel};

#[derive(Debug, Clone, Serialize)]
pub struct FlowPrediction {
    pub model: String,
    pub predictions: Vec<String>,
    pub class_probabilities: Vec<LabelMap<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowMetadata {
    pub model_file: String,
    pub num_features: usize,
    pub features: Vec<String>,
    pub class_labels: Vec<String>,
    pub predict_proba: bool,
}

pub struct FlowPredictor {
    model: Arc<LoadedModel>,
    schema: FlowSchema,
    labels: LabelSet,
    model_name: String,
}

impl FlowPredictor {
    pub fn new(model: Arc<LoadedModel>, schema: FlowSchema) -> CoreResult<Self> {
        if model.num_features() != schema.len() {
            return Err(CoreError::FeatureMismatch { expected: model.num_features(), actual: schema.len() });
        }

        let labels = if model.class_labels().is_empty() {
            LabelSet::cicids2017()
        } else {
            LabelSet::new(model.class_labels().to_vec())
        };
        let model_name = model.file_name().to_string();

        log::info!(
            "Flow predictor ready: {} ({} features, {} labels)",
            model_name,
            schema.len(),
            labels.len()
        );
        Ok(Self { model, schema, labels, model_name })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn schema(&self) -> &FlowSchema {
        &self.schema
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Classify a batch of flow records
    pub fn predict(&self, records: &[FlowRecord]) -> CoreResult<FlowPrediction> {
        if records.is_empty() {
            return Err(CoreError::Schema("records must not be empty".to_string()));
        }

        let matrix = self.schema.matrix(records);
        let proba = predict_proba_batch(self.model.as_ref(), matrix.view())?;

        let mut predictions = Vec::with_capacity(records.len());
        let mut class_probabilities = Vec::with_capacity(records.len());
        for row in proba.rows() {
            let row: Vec<f64> = row.to_vec();
            predictions.push(self.labels.name(argmax(&row)));
            class_probabilities.push(
                row.iter()
                    .enumerate()
                    .filter_map(|(i, p)| self.labels.get(i).map(|l| (l.to_string(), *p)))
                    .collect(),
            );
        }

        Ok(FlowPrediction { model: self.model_name.clone(), predictions, class_probabilities })
    }

    pub fn metadata(&self) -> FlowMetadata {
        FlowMetadata {
            model_file: self.model_name.clone(),
            num_features: self.schema.len(),
            features: self.schema.features().to_vec(),
            class_labels: self.labels.names().to_vec(),
            predict_proba: true,
        }
    }
}
