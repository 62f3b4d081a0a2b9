//! Evaluate Module - offline scoring of a model against labeled flows
//!
//! Produces the same figures the training notebook reports (accuracy,
//! macro one-vs-rest ROC AUC, confusion matrix, per-class hit rate) for a
//! model that has already been exported.

pub mod dataset;
pub mod metrics;
pub mod report;


pub use dataset::{LabeledDataset, DEFAULT_LABEL_COLUMN};
pub use report::{write_results_csv, EvaluationReport};

use crate::error::{CoreError, CoreResult};
use crate::model::{argmax, predict_proba_batch, Classifier, LabelSet};

/// Score `dataset` with `model`. Rows whose label is not in `labels` are
/// left out and counted in `skipped_labels`.
pub fn evaluate<C: Classifier + ?Sized>(
    name: &str,
    model: &C,
    labels: &LabelSet,
    dataset: &LabeledDataset,
) -> CoreResult<EvaluationReport> {
    if dataset.features.ncols() != model.num_features() {
        return Err(CoreError::FeatureMismatch {
            expected: model.num_features(),
            actual: dataset.features.ncols(),
        });
    }

    let mut rows = Vec::with_capacity(dataset.len());
    let mut y_true = Vec::with_capacity(dataset.len());
    for (i, label) in dataset.labels.iter().enumerate() {
        match labels.iter().position(|l| l == label.as_str()) {
            Some(id) if id < model.num_classes() => {
                rows.push(i);
                y_true.push(id);
            }
            _ => log::debug!("Row {}: unknown label '{}'", i, label),
        }
    }
    let skipped = dataset.len() - rows.len();
    if skipped > 0 {
        log::warn!("{} rows carry labels unknown to {}", skipped, name);
    }
    if rows.is_empty() {
        return Err(CoreError::Schema("no rows with a known label to evaluate".to_string()));
    }

    let x = dataset.features.select(ndarray::Axis(0), &rows);
    let proba = predict_proba_batch(model, x.view())?;
    let y_pred: Vec<usize> = proba.rows().into_iter().map(|r| argmax(&r.to_vec())).collect();

    let cm = metrics::confusion_matrix(&y_true, &y_pred, model.num_classes());
    let report = EvaluationReport {
        model: name.to_string(),
        samples: rows.len(),
        skipped_labels: skipped,
        accuracy: metrics::accuracy(&y_true, &y_pred),
        roc_auc: metrics::roc_auc_ovr(&y_true, proba.view()),
        per_class: metrics::per_class_stats(&cm, labels),
        binary: metrics::binary_counts(&cm),
        confusion_matrix: cm.rows().into_iter().map(|r| r.to_vec()).collect(),
    };

    log::info!(
        "{}: accuracy {:.4}, ROC AUC {}",
        name,
        report.accuracy,
        report.roc_auc.map_or("n/a".to_string(), |v| format!("{:.4}", v))
    );
    Ok(report)
}
