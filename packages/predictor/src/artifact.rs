//! On-disk predictor artifact format.
//!
//! An artifact is a single JSON document tagged by `model_type`:
//!
//! ```json
//! { "model_type": "linear_regressor", "weights": [/* 21 */], "intercept": 4.0 }
//! { "model_type": "softmax_classifier", "weights": [[/* 21 */], /* x5 */], "biases": [/* 5 */] }
//! { "model_type": "tree_ensemble_regressor", "trees": [{ "nodes": [
//!     { "split": { "feature": 1, "threshold": 0.3, "left": 1, "right": 2 } },
//!     { "leaf": { "value": 20.0 } },
//!     { "leaf": { "value": 75.0 } }
//! ] }] }
//! ```
//!
//! Regressors may set `"calibrate": true` to stretch medium and high
//! outputs after prediction.

use civic_triage_severity_models::{FEATURE_COUNT, FeatureVector};
use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::PredictorError;

/// Number of severity classes a classifier predicts (Clean..Extreme).
pub const CLASS_COUNT: usize = 5;

/// A trained predictor's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "model_type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Artifact {
    /// `intercept + weights · x`, clipped to 0-100.
    LinearRegressor {
        weights: Vec<f64>,
        intercept: f64,
        #[serde(default)]
        calibrate: bool,
    },
    /// Multinomial logistic regression over the five severity classes.
    SoftmaxClassifier {
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
    },
    /// Mean of several regression trees, clipped to 0-100.
    TreeEnsembleRegressor {
        trees: Vec<Tree>,
        #[serde(default)]
        calibrate: bool,
    },
}

/// One regression tree stored as a flat node list; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`, otherwise `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Raw output of an artifact before score mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Output {
    /// Discrete class index with its probability.
    Class { class: usize, probability: f64 },
    /// Continuous 0-100 estimate.
    Continuous(f64),
}

impl Artifact {
    /// Parses and validates an artifact from JSON.
    ///
    /// # Errors
    ///
    /// * If the JSON is malformed or has an unknown `model_type`
    /// * If any dimension or node reference is inconsistent
    pub fn from_json(json: &str) -> Result<Self, PredictorError> {
        let artifact: Self = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Predictor family name, e.g. `"linear_regressor"`.
    #[must_use]
    pub fn model_type(&self) -> &'static str {
        self.into()
    }

    /// Whether continuous outputs should be calibrated.
    #[must_use]
    pub const fn calibrates(&self) -> bool {
        match self {
            Self::LinearRegressor { calibrate, .. } | Self::TreeEnsembleRegressor { calibrate, .. } => {
                *calibrate
            }
            Self::SoftmaxClassifier { .. } => false,
        }
    }

    /// Checks every dimension against the feature layout.
    ///
    /// # Errors
    ///
    /// * If a weight vector does not have [`FEATURE_COUNT`] entries
    /// * If a classifier does not have [`CLASS_COUNT`] classes
    /// * If any parameter is non-finite
    /// * If a tree is empty or references a node or feature out of range
    pub fn validate(&self) -> Result<(), PredictorError> {
        match self {
            Self::LinearRegressor {
                weights, intercept, ..
            } => {
                check_len("weights", weights.len(), FEATURE_COUNT)?;
                check_finite("weights", weights.iter().chain(std::iter::once(intercept)))
            }
            Self::SoftmaxClassifier { weights, biases } => {
                check_len("weights", weights.len(), CLASS_COUNT)?;
                check_len("biases", biases.len(), CLASS_COUNT)?;
                for row in weights {
                    check_len("weights row", row.len(), FEATURE_COUNT)?;
                }
                check_finite("weights", weights.iter().flatten())?;
                check_finite("biases", biases.iter())
            }
            Self::TreeEnsembleRegressor { trees, .. } => {
                if trees.is_empty() {
                    return Err(PredictorError::Shape {
                        message: "ensemble has no trees".to_string(),
                    });
                }
                for (index, tree) in trees.iter().enumerate() {
                    tree.validate(index)?;
                }
                Ok(())
            }
        }
    }

    /// Evaluates the artifact on a feature vector.
    ///
    /// # Errors
    ///
    /// * If the output is non-finite
    /// * If a tree walk does not reach a leaf
    pub fn evaluate(&self, features: &FeatureVector) -> Result<Output, PredictorError> {
        let x = features.values();
        match self {
            Self::LinearRegressor {
                weights, intercept, ..
            } => {
                let value = dot(weights, x) + intercept;
                finite(value).map(|v| Output::Continuous(v.clamp(0.0, 100.0)))
            }
            Self::SoftmaxClassifier { weights, biases } => {
                let logits: Vec<f64> = weights
                    .iter()
                    .zip(biases)
                    .map(|(row, bias)| dot(row, x) + bias)
                    .collect();
                let (class, probability) = softmax_argmax(&logits)?;
                Ok(Output::Class { class, probability })
            }
            Self::TreeEnsembleRegressor { trees, .. } => {
                let mut sum = 0.0;
                for (index, tree) in trees.iter().enumerate() {
                    sum += tree.evaluate(index, x)?;
                }
                #[allow(clippy::cast_precision_loss)]
                let mean = sum / trees.len() as f64;
                finite(mean).map(|v| Output::Continuous(v.clamp(0.0, 100.0)))
            }
        }
    }
}

impl Tree {
    fn validate(&self, index: usize) -> Result<(), PredictorError> {
        if self.nodes.is_empty() {
            return Err(malformed(index, "tree has no nodes"));
        }
        for node in &self.nodes {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(malformed(index, format!("feature {feature} out of range")));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(malformed(
                            index,
                            format!("child {left}/{right} out of {} nodes", self.nodes.len()),
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(malformed(index, "non-finite threshold"));
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(malformed(index, "non-finite leaf value"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walks from the root. A walk longer than the node count means the
    /// tree has a cycle.
    fn evaluate(&self, index: usize, x: &[f64]) -> Result<f64, PredictorError> {
        let mut current = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(current) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature).copied().unwrap_or(0.0);
                    current = if value <= *threshold { *left } else { *right };
                }
                None => return Err(malformed(index, format!("node {current} missing"))),
            }
        }
        Err(malformed(index, "walk did not reach a leaf"))
    }
}

fn dot(weights: &[f64], x: &[f64]) -> f64 {
    weights.iter().zip(x).map(|(w, v)| w * v).sum()
}

fn finite(value: f64) -> Result<f64, PredictorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictorError::NonFiniteOutput)
    }
}

/// Returns the argmax class and its softmax probability.
fn softmax_argmax(logits: &[f64]) -> Result<(usize, f64), PredictorError> {
    if logits.iter().any(|l| !l.is_finite()) {
        return Err(PredictorError::NonFiniteOutput);
    }
    let (class, max) = logits
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, l)| {
            if l > best.1 { (i, l) } else { best }
        });
    let denominator: f64 = logits.iter().map(|l| (l - max).exp()).sum();
    finite(1.0 / denominator).map(|probability| (class, probability))
}

fn check_len(field: &str, actual: usize, expected: usize) -> Result<(), PredictorError> {
    if actual == expected {
        Ok(())
    } else {
        Err(PredictorError::Shape {
            message: format!("{field} has {actual} entries, expected {expected}"),
        })
    }
}

fn check_finite<'a>(
    field: &str,
    mut values: impl Iterator<Item = &'a f64>,
) -> Result<(), PredictorError> {
    if values.all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PredictorError::Shape {
            message: format!("{field} contains a non-finite value"),
        })
    }
}

fn malformed(tree: usize, message: impl Into<String>) -> PredictorError {
    PredictorError::MalformedTree {
        tree,
        message: message.into(),
    }
}
