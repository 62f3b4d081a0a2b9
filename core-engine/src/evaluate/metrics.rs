//! Classification metrics

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::model::LabelSet;

pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Rows are true classes, columns predicted classes
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], num_classes: usize) -> Array2<u64> {
    let mut cm = Array2::<u64>::zeros((num_classes, num_classes));
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t < num_classes && p < num_classes {
            cm[[t, p]] += 1;
        }
    }
    cm
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    pub label: String,
    pub correct: u64,
    pub total: u64,
    pub correct_pct: f64,
    pub misclassified_pct: f64,
}

pub fn per_class_stats(cm: &Array2<u64>, labels: &LabelSet) -> Vec<ClassStats> {
    (0..cm.nrows())
        .map(|i| {
            let correct = cm[[i, i]];
            let total: u64 = cm.row(i).sum();
            let rate = if total > 0 { correct as f64 / total as f64 } else { 0.0 };
            ClassStats {
                label: labels.name(i),
                correct,
                total,
                correct_pct: rate * 100.0,
                misclassified_pct: (1.0 - rate) * 100.0,
            }
        })
        .collect()
}

/// Binary outcome counts, class 1 positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryCounts {
    pub tp: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tn: u64,
}

pub fn binary_counts(cm: &Array2<u64>) -> Option<BinaryCounts> {
    if cm.dim() != (2, 2) {
        return None;
    }
    Some(BinaryCounts { tn: cm[[0, 0]], fp: cm[[0, 1]], fn_: cm[[1, 0]], tp: cm[[1, 1]] })
}

/// Area under the ROC curve for one score column (Mann-Whitney with
/// average ranks for ties). `None` without both positives and negatives.
pub fn roc_auc(scores: &[f64], positive: &[bool]) -> Option<f64> {
    let n_pos = positive.iter().filter(|&&p| p).count();
    let n_neg = positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks i+1 ..= j+1 share their mean
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            if positive[k] {
                rank_sum += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Macro one-vs-rest AUC; binary problems score class 1 only
pub fn roc_auc_ovr(y_true: &[usize], proba: ArrayView2<'_, f64>) -> Option<f64> {
    let num_classes = proba.ncols();
    if num_classes == 2 {
        let positive: Vec<bool> = y_true.iter().map(|&t| t == 1).collect();
        return roc_auc(&proba.column(1).to_vec(), &positive);
    }

    let mut total = 0.0;
    for class in 0..num_classes {
        let positive: Vec<bool> = y_true.iter().map(|&t| t == class).collect();
        total += roc_auc(&proba.column(class).to_vec(), &positive)?;
    }
    Some(total / num_classes as f64)
}
