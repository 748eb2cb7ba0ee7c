#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Trained severity predictor.
//!
//! A [`ModelPredictor`] wraps a validated [`artifact::Artifact`] loaded
//! from disk. Loading and prediction never fail loudly: a missing or
//! corrupt artifact yields `None` from [`ModelPredictor::load`], and any
//! fault during prediction yields `None` from [`ModelPredictor::predict`],
//! so callers can always fall back to the rule-based formula.

pub mod artifact;

use std::path::{Path, PathBuf};

use civic_triage_severity_models::{FEATURE_COUNT, Feature, FeatureVector, MAX_SCORE};
use serde::Serialize;

use crate::artifact::{Artifact, CLASS_COUNT, Output};

/// Severity score for each classifier output class (Clean..Extreme).
pub const CLASS_SCORES: [u8; CLASS_COUNT] = [20, 40, 60, 80, 100];

/// Confidence reported for continuous (regressor) outputs.
const REGRESSOR_CONFIDENCE: f64 = 0.8;

/// Errors that can occur while loading or evaluating a predictor.
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    /// Artifact file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact is not valid JSON or has an unknown `model_type`.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Artifact dimensions do not match the feature layout.
    #[error("Shape mismatch: {message}")]
    Shape {
        /// Description of what went wrong.
        message: String,
    },

    /// A tree references missing nodes or never reaches a leaf.
    #[error("Malformed tree {tree}: {message}")]
    MalformedTree {
        /// Index of the offending tree.
        tree: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// The predictor produced `NaN` or an infinite value.
    #[error("Predictor produced a non-finite output")]
    NonFiniteOutput,
}

/// A successful trained prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedPrediction {
    /// Final 0-100 score, after class mapping or calibration.
    pub score: u8,
    /// Output before calibration (the class score for classifiers).
    pub raw_score: f64,
    /// Predictor confidence (0-1).
    pub confidence: f64,
    /// Predictor family, e.g. `"linear_regressor"`.
    pub model_type: String,
    /// Whether calibration was applied to a continuous output.
    pub calibrated: bool,
}

/// Something that can turn a feature vector into a severity score.
///
/// [`ModelPredictor`] is the production implementation; tests inject
/// fakes through this trait.
pub trait SeverityPredictor: Send + Sync {
    /// Predicts a severity score, or `None` on any fault.
    fn predict(&self, features: &FeatureVector) -> Option<TrainedPrediction>;

    /// Predictor family name.
    fn model_type(&self) -> &str;
}

/// Metadata about the configured predictor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictorInfo {
    /// Whether an artifact is loaded.
    pub loaded: bool,
    /// Configured artifact path.
    pub path: Option<PathBuf>,
    /// Predictor family, when loaded.
    pub model_type: Option<String>,
    /// Length of the expected feature vector.
    pub feature_count: usize,
    /// Expected feature names, in order.
    pub feature_names: Vec<&'static str>,
}

impl PredictorInfo {
    /// Info for a predictor that could not be loaded.
    #[must_use]
    pub fn unavailable(path: Option<PathBuf>) -> Self {
        Self {
            loaded: false,
            path,
            model_type: None,
            feature_count: FEATURE_COUNT,
            feature_names: Feature::names(),
        }
    }
}

/// A loaded, validated, read-only predictor.
#[derive(Debug, Clone)]
pub struct ModelPredictor {
    artifact: Artifact,
    path: Option<PathBuf>,
}

impl ModelPredictor {
    /// Loads an artifact from `path`.
    ///
    /// Returns `None` (and logs a warning) when the file is missing,
    /// unreadable, malformed, or has the wrong shape.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(predictor) => {
                log::info!(
                    "Loaded {} predictor from {}",
                    predictor.artifact.model_type(),
                    path.display()
                );
                Some(predictor)
            }
            Err(PredictorError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Predictor artifact not found at {}", path.display());
                None
            }
            Err(e) => {
                log::warn!("Failed to load predictor from {}: {e}", path.display());
                None
            }
        }
    }

    /// Loads an artifact from `path`, reporting why it failed.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the contents are not a valid artifact
    pub fn try_load(path: &Path) -> Result<Self, PredictorError> {
        let json = std::fs::read_to_string(path)?;
        let artifact = Artifact::from_json(&json)?;
        Ok(Self {
            artifact,
            path: Some(path.to_path_buf()),
        })
    }

    /// Wraps an in-memory artifact.
    ///
    /// # Errors
    ///
    /// * If the artifact fails validation
    pub fn from_artifact(artifact: Artifact) -> Result<Self, PredictorError> {
        artifact.validate()?;
        Ok(Self {
            artifact,
            path: None,
        })
    }

    /// The underlying artifact.
    #[must_use]
    pub const fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Predicts a severity score, reporting why prediction failed.
    ///
    /// # Errors
    ///
    /// * If the artifact produces a non-finite output
    /// * If a tree walk does not reach a leaf
    pub fn try_predict(&self, features: &FeatureVector) -> Result<TrainedPrediction, PredictorError> {
        let model_type = self.artifact.model_type().to_string();
        match self.artifact.evaluate(features)? {
            Output::Class { class, probability } => {
                let score = class_score(class).ok_or_else(|| PredictorError::Shape {
                    message: format!("class {class} out of range"),
                })?;
                Ok(TrainedPrediction {
                    score,
                    raw_score: f64::from(score),
                    confidence: probability,
                    model_type,
                    calibrated: false,
                })
            }
            Output::Continuous(raw) => {
                let calibrated = self.artifact.calibrates();
                let value = if calibrated { calibrate(raw) } else { raw };
                Ok(TrainedPrediction {
                    score: to_score(value),
                    raw_score: raw,
                    confidence: REGRESSOR_CONFIDENCE,
                    model_type,
                    calibrated,
                })
            }
        }
    }

    /// Predicts a severity score, or `None` on any fault.
    #[must_use]
    pub fn predict(&self, features: &FeatureVector) -> Option<TrainedPrediction> {
        self.try_predict(features)
            .map_err(|e| log::debug!("Prediction failed: {e}"))
            .ok()
    }

    /// Metadata about this predictor.
    #[must_use]
    pub fn info(&self) -> PredictorInfo {
        PredictorInfo {
            loaded: true,
            path: self.path.clone(),
            model_type: Some(self.artifact.model_type().to_string()),
            feature_count: FEATURE_COUNT,
            feature_names: Feature::names(),
        }
    }
}

impl SeverityPredictor for ModelPredictor {
    fn predict(&self, features: &FeatureVector) -> Option<TrainedPrediction> {
        Self::predict(self, features)
    }

    fn model_type(&self) -> &str {
        self.artifact.model_type()
    }
}

/// Maps a classifier output class (0-4) to its severity score.
#[must_use]
pub const fn class_score(class: usize) -> Option<u8> {
    if class < CLASS_COUNT {
        Some(CLASS_SCORES[class])
    } else {
        None
    }
}

/// Stretches medium and high continuous outputs.
///
/// Below 40 unchanged; 40-69 scaled by 1.15; 70 and above scaled by 1.25.
/// The result never exceeds 100.
#[must_use]
pub fn calibrate(score: f64) -> f64 {
    let stretched = if score < 40.0 {
        score
    } else if score < 70.0 {
        score * 1.15
    } else {
        score * 1.25
    };
    stretched.min(f64::from(MAX_SCORE))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
}
