//! Engine configuration.
//!
//! ```toml
//! use_trained_model = true
//! model_path = "models/severity_model.json"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default location of the predictor artifact.
pub const DEFAULT_MODEL_PATH: &str = "models/severity_model.json";

/// Errors in engine configuration, surfaced once at construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config is not valid TOML or contains unknown keys.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Options are individually valid but inconsistent.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Options for a [`crate::SeverityFusionEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Try the trained predictor before falling back to the formula.
    #[serde(default = "default_true")]
    pub use_trained_model: bool,
    /// Predictor artifact location.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
}

const fn default_true() -> bool {
    true
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_trained_model: true,
            model_path: default_model_path(),
        }
    }
}

impl EngineConfig {
    /// Rule-based scoring only; no artifact is ever loaded.
    #[must_use]
    pub fn rule_based() -> Self {
        Self {
            use_trained_model: false,
            ..Self::default()
        }
    }

    /// Trained scoring with the artifact at `model_path`.
    #[must_use]
    pub fn trained(model_path: impl Into<PathBuf>) -> Self {
        Self {
            use_trained_model: true,
            model_path: model_path.into(),
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// * If the TOML is malformed or contains unknown keys
    /// * If the options are inconsistent
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigurationError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read
    /// * If the contents are not a valid config
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Checks option consistency.
    ///
    /// # Errors
    ///
    /// * If the trained model is enabled with an empty model path
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.use_trained_model && self.model_path.as_os_str().is_empty() {
            return Err(ConfigurationError::Invalid {
                message: "use_trained_model is enabled but model_path is empty".to_string(),
            });
        }
        Ok(())
    }
}
