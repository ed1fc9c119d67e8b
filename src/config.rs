//! Configuration of the local age predicter.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AuthorAgeError, Result};
use crate::ml::predict::AgePredicter;
use crate::ml::vector::Normalizer;

/// Settings of one local prediction run. Every field has a default, so a
/// config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PredictorConfig {
    /// Age classification model.
    pub classify_model: PathBuf,
    /// Age regression model.
    pub regression_model: PathBuf,
    /// Document to score.
    pub document: String,
    /// Tokens per copy of the category feature. Unset keeps the divisor
    /// stored in the regression model.
    pub category_weight_divisor: Option<usize>,
    /// Order of the norm applied to feature vectors.
    pub norm_p: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            classify_model: PathBuf::from("./model/classify-bigram.bin"),
            regression_model: PathBuf::from("./model/regression-global.bin"),
            document: "I am very very old person".to_string(),
            category_weight_divisor: None,
            norm_p: 1.0,
        }
    }
}

impl PredictorConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            AuthorAgeError::invalid_argument(format!(
                "Failed to parse config {}: {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.category_weight_divisor == Some(0) {
            return Err(AuthorAgeError::invalid_argument(
                "category_weight_divisor must be > 0",
            ));
        }
        if self.norm_p.is_nan() || self.norm_p < 1.0 {
            return Err(AuthorAgeError::invalid_argument(format!(
                "norm_p must be >= 1, got {}",
                self.norm_p
            )));
        }
        Ok(())
    }

    /// Apply the run settings to a predicter built from the loaded models.
    pub fn apply(&self, predicter: AgePredicter) -> Result<AgePredicter> {
        let predicter = match self.category_weight_divisor {
            Some(divisor) => predicter.with_category_weight_divisor(divisor)?,
            None => predicter,
        };
        Ok(predicter.with_normalizer(Normalizer::new(self.norm_p)?))
    }
}
