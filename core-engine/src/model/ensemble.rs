//! Tree Ensemble - native evaluation of exported tree models
//!
//! One JSON document describes gradient-boosted trees (XGBoost, LightGBM)
//! and averaged trees (decision tree, random forest) alike:
//!
//! ```json
//! {
//!   "aggregation": "softmax",
//!   "num_features": 78,
//!   "num_classes": 5,
//!   "base_score": [0.5, 0.5, 0.5, 0.5, 0.5],
//!   "split_rule": "less_than",
//!   "trees": [
//!     { "class_index": 0, "nodes": [
//!         { "feature": 4, "threshold": 80.5, "left": 1, "right": 2, "missing_left": true },
//!         { "value": [0.12] },
//!         { "value": [-0.4] }
//!     ]}
//!   ]
//! }
//! ```
//!
//! Node 0 is the root. Children always point forward, which `validate`
//! checks, so every walk terminates.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::error::{CoreError, CoreResult};

// ============================================================================
// DOCUMENT
// ============================================================================

/// How per-tree outputs become class probabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Boosted multi-class: margins summed per class, then softmax
    Softmax,
    /// Boosted binary: one margin, logistic link, two classes
    Sigmoid,
    /// Forest / single tree: leaf class distributions averaged
    Average,
}

/// Comparison used at split nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// `x < threshold` goes left (XGBoost)
    #[default]
    LessThan,
    /// `x <= threshold` goes left (scikit-learn, LightGBM)
    LessEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_missing_left")]
        missing_left: bool,
    },
    Leaf {
        value: Vec<f64>,
    },
}

fn default_missing_left() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Class whose margin this tree adds to (boosted softmax only)
    #[serde(default)]
    pub class_index: usize,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub aggregation: Aggregation,
    pub num_features: usize,
    pub num_classes: usize,
    #[serde(default)]
    pub base_score: Vec<f64>,
    #[serde(default)]
    pub split_rule: SplitRule,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_names: Vec<String>,
    pub trees: Vec<Tree>,
}

// ============================================================================
// LOADING & VALIDATION
// ============================================================================

impl TreeEnsemble {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let ensemble: TreeEnsemble = serde_json::from_str(json)
            .map_err(|e| CoreError::Model(format!("invalid model document: {}", e)))?;
        ensemble.validate()?;
        Ok(ensemble)
    }

    /// Structural checks; a validated ensemble never panics on predict
    pub fn validate(&self) -> CoreResult<()> {
        if self.num_features == 0 {
            return Err(CoreError::Model("num_features must be > 0".to_string()));
        }
        if self.num_classes == 0 {
            return Err(CoreError::Model("num_classes must be > 0".to_string()));
        }
        if self.trees.is_empty() {
            return Err(CoreError::Model("ensemble has no trees".to_string()));
        }
        if !self.class_labels.is_empty() && self.class_labels.len() != self.num_classes {
            return Err(CoreError::Model(format!(
                "{} class labels for {} classes",
                self.class_labels.len(),
                self.num_classes
            )));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.num_features {
            return Err(CoreError::Model(format!(
                "{} feature names for {} features",
                self.feature_names.len(),
                self.num_features
            )));
        }

        let (leaf_width, base_len) = match self.aggregation {
            Aggregation::Softmax => (1, self.num_classes),
            Aggregation::Sigmoid => {
                if self.num_classes != 2 {
                    return Err(CoreError::Model("sigmoid aggregation needs exactly 2 classes".to_string()));
                }
                (1, 1)
            }
            Aggregation::Average => (self.num_classes, 0),
        };

        if !self.base_score.is_empty() && self.base_score.len() != base_len {
            return Err(CoreError::Model(format!(
                "base_score has {} entries, expected {}",
                self.base_score.len(),
                base_len
            )));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(CoreError::Model(format!("tree {} has no nodes", t)));
            }
            if self.aggregation == Aggregation::Softmax && tree.class_index >= self.num_classes {
                return Err(CoreError::Model(format!(
                    "tree {} targets class {} of {}",
                    t, tree.class_index, self.num_classes
                )));
            }

            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Split { feature, left, right, .. } => {
                        if *feature >= self.num_features {
                            return Err(CoreError::Model(format!(
                                "tree {} node {} splits on feature {} of {}",
                                t, n, feature, self.num_features
                            )));
                        }
                        for child in [*left, *right] {
                            if child <= n || child >= tree.nodes.len() {
                                return Err(CoreError::Model(format!(
                                    "tree {} node {} has invalid child {}",
                                    t, n, child
                                )));
                            }
                        }
                    }
                    Node::Leaf { value } => {
                        if value.len() != leaf_width {
                            return Err(CoreError::Model(format!(
                                "tree {} leaf {} has {} values, expected {}",
                                t, n, value.len(), leaf_width
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Short description used in metadata
    pub fn kind(&self) -> &'static str {
        match self.aggregation {
            Aggregation::Softmax => "boosted-softmax",
            Aggregation::Sigmoid => "boosted-binary",
            Aggregation::Average => "averaged-trees",
        }
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

impl Tree {
    /// Walk from the root to a leaf
    fn leaf<'a>(&'a self, x: &[f32], rule: SplitRule) -> &'a [f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split { feature, threshold, left, right, missing_left } => {
                    let v = x[*feature] as f64;
                    let go_left = if v.is_nan() {
                        *missing_left
                    } else {
                        match rule {
                            SplitRule::LessThan => v < *threshold,
                            SplitRule::LessEqual => v <= *threshold,
                        }
                    };
                    index = if go_left { *left } else { *right };
                }
            }
        }
    }
}

fn softmax(margins: &mut [f64]) {
    let max = margins.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for m in margins.iter_mut() {
        *m = (*m - max).exp();
        sum += *m;
    }
    for m in margins.iter_mut() {
        *m /= sum;
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Classifier for TreeEnsemble {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn predict_proba(&self, x: &[f32]) -> CoreResult<Vec<f64>> {
        if x.len() != self.num_features {
            return Err(CoreError::FeatureMismatch { expected: self.num_features, actual: x.len() });
        }

        match self.aggregation {
            Aggregation::Softmax => {
                let mut margins = if self.base_score.is_empty() {
                    vec![0.0; self.num_classes]
                } else {
                    self.base_score.clone()
                };
                for tree in &self.trees {
                    margins[tree.class_index] += tree.leaf(x, self.split_rule)[0];
                }
                softmax(&mut margins);
                Ok(margins)
            }
            Aggregation::Sigmoid => {
                let base = self.base_score.first().copied().unwrap_or(0.0);
                let margin = self
                    .trees
                    .iter()
                    .fold(base, |acc, tree| acc + tree.leaf(x, self.split_rule)[0]);
                let p = sigmoid(margin);
                Ok(vec![1.0 - p, p])
            }
            Aggregation::Average => {
                let mut proba = vec![0.0; self.num_classes];
                for tree in &self.trees {
                    let leaf = tree.leaf(x, self.split_rule);
                    let total: f64 = leaf.iter().sum();
                    if total > 0.0 {
                        for (p, v) in proba.iter_mut().zip(leaf) {
                            *p += v / total;
                        }
                    }
                }
                let n = self.trees.len() as f64;
                proba.iter_mut().for_each(|p| *p /= n);
                Ok(proba)
            }
        }
    }
}

/// Row-wise class probabilities for a batch
pub fn predict_proba_batch<C: Classifier + ?Sized>(model: &C, x: ArrayView2<'_, f32>) -> CoreResult<Array2<f64>> {
    let mut out = Array2::<f64>::zeros((x.nrows(), model.num_classes()));
    for (row, mut target) in x.rows().into_iter().zip(out.rows_mut()) {
        let features: Vec<f32> = row.iter().copied().collect();
        let proba = model.predict_proba(&features)?;
        for (slot, p) in target.iter_mut().zip(proba) {
            *slot = p;
        }
    }
    Ok(out)
}
