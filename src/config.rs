//! Pipeline configuration.
//!
//! Read once by the binary (TOML file or defaults) and passed by reference
//! into every stage that needs it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cleaning: CleaningConfig,
    pub split: SplitConfig,
    pub logistic_regression: LogisticRegressionConfig,
    pub random_forest: RandomForestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Records released in or before this year are dropped.
    pub cutoff_year: i64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self { cutoff_year: 1920 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows assigned to the train partition.
    pub train_ratio: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            seed: 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegressionConfig {
    pub max_iterations: u64,
    pub gradient_tolerance: f64,
    /// L2 penalty strength.
    pub alpha: f64,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            gradient_tolerance: 1e-4,
            alpha: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestConfig {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_weight_split: f32,
    pub feature_subset: FeatureSubset,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 20,
            max_depth: 5,
            min_weight_split: 2.0,
            feature_subset: FeatureSubset::Sqrt,
        }
    }
}

/// How many features each forest tree sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSubset {
    All,
    Sqrt,
    Log2,
}

impl FeatureSubset {
    /// Number of features to draw out of `n_features`, at least one.
    pub fn count(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            FeatureSubset::All => n_features,
            FeatureSubset::Sqrt => n.sqrt().ceil() as usize,
            FeatureSubset::Log2 => n.log2().ceil() as usize,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.split.train_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(PipelineError::Config(format!(
                "split.train_ratio must be in (0, 1), got {ratio}"
            )));
        }
        if self.random_forest.num_trees == 0 {
            return Err(PipelineError::Config(
                "random_forest.num_trees must be positive".to_string(),
            ));
        }
        if self.random_forest.max_depth == 0 {
            return Err(PipelineError::Config(
                "random_forest.max_depth must be positive".to_string(),
            ));
        }
        if self.logistic_regression.alpha < 0.0 {
            return Err(PipelineError::Config(
                "logistic_regression.alpha must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
