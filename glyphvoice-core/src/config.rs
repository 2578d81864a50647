//! Tunable scoring thresholds
//!
//! All values have working defaults; a TOML file can override any
//! subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_grace_ms() -> u64 {
    300
}

fn default_revision_threshold() -> f64 {
    65.0
}

fn default_resample_points() -> usize {
    50
}

fn default_shape_tolerance() -> f64 {
    0.35
}

/// Scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// How long to wait for speech after pen-up before scoring without it
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,

    /// Shape score below which a stroke is classified as needing revision
    #[serde(default = "default_revision_threshold")]
    pub revision_threshold: f64,

    /// Fixed point count both paths are resampled to before comparison
    #[serde(default = "default_resample_points")]
    pub resample_points: usize,

    /// Tolerance factor applied to the average nearest-point distance
    #[serde(default = "default_shape_tolerance")]
    pub shape_tolerance: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            grace_ms: default_grace_ms(),
            revision_threshold: default_revision_threshold(),
            resample_points: default_resample_points(),
            shape_tolerance: default_shape_tolerance(),
        }
    }
}

impl ScoringConfig {
    /// Parse from a TOML string, applying defaults for missing fields
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ScoringConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the scorers cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resample_points < 2 {
            return Err(ConfigError::Invalid(
                "resample_points must be at least 2".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.revision_threshold) {
            return Err(ConfigError::Invalid(format!(
                "revision_threshold must be within [0, 100], got {}",
                self.revision_threshold
            )));
        }
        if self.shape_tolerance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "shape_tolerance must be positive, got {}",
                self.shape_tolerance
            )));
        }
        Ok(())
    }
}
