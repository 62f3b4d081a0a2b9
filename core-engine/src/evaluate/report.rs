//! Evaluation report and the `model_results.csv` writer

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::metrics::{BinaryCounts, ClassStats};
use crate::error::CoreResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model: String,
    pub samples: usize,
    /// Rows whose label is unknown to the model
    pub skipped_labels: usize,
    pub accuracy: f64,
    pub roc_auc: Option<f64>,
    pub confusion_matrix: Vec<Vec<u64>>,
    pub per_class: Vec<ClassStats>,
    pub binary: Option<BinaryCounts>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.model)?;
        writeln!(f, "Samples: {}", self.samples)?;
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        match self.roc_auc {
            Some(auc) => writeln!(f, "ROC AUC: {:.4}", auc)?,
            None => writeln!(f, "ROC AUC: n/a")?,
        }

        writeln!(f, "Confusion matrix:")?;
        for row in &self.confusion_matrix {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(f, "  [{}]", cells.join(" "))?;
        }

        if let Some(b) = &self.binary {
            writeln!(f, "TP: {}  FP: {}  FN: {}  TN: {}", b.tp, b.fp, b.fn_, b.tn)?;
        }

        for s in &self.per_class {
            writeln!(
                f,
                "{}: {}/{} correct = {:.2}% | Misclassified = {:.2}%",
                s.label, s.correct, s.total, s.correct_pct, s.misclassified_pct
            )?;
        }
        Ok(())
    }
}

/// One row per report: `Model, Accuracy, ROC_AUC, <class> Correct %...`.
/// Class columns are the union over all reports in first-seen order.
pub fn write_results_csv<P: AsRef<Path>>(path: P, reports: &[EvaluationReport]) -> CoreResult<()> {
    let mut classes: Vec<&str> = Vec::new();
    for report in reports {
        for stats in &report.per_class {
            if !classes.contains(&stats.label.as_str()) {
                classes.push(&stats.label);
            }
        }
    }

    let mut writer = csv::Writer::from_path(path.as_ref())?;

    let mut header = vec!["Model".to_string(), "Accuracy".to_string(), "ROC_AUC".to_string()];
    header.extend(classes.iter().map(|c| format!("{} Correct %", c)));
    writer.write_record(&header)?;

    for report in reports {
        let mut row = vec![
            report.model.clone(),
            report.accuracy.to_string(),
            report.roc_auc.map(|v| v.to_string()).unwrap_or_default(),
        ];
        for class in &classes {
            let cell = report
                .per_class
                .iter()
                .find(|s| s.label == *class)
                .map(|s| s.correct_pct.to_string())
                .unwrap_or_default();
            row.push(cell);
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    log::info!("Results saved to {}", path.as_ref().display());
    Ok(())
}
