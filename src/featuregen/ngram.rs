//! N-gram feature generator.

use super::FeatureGenerator;
use crate::error::{AuthorAgeError, Result};

/// Emits `ng=<t1>:<t2>:..` for every window of `min..=max` consecutive tokens.
#[derive(Clone, Copy, Debug)]
pub struct NGramFeatureGenerator {
    min: usize,
    max: usize,
}

impl NGramFeatureGenerator {
    /// Create a generator for n-grams of length `min` through `max`.
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min == 0 || min > max {
            return Err(AuthorAgeError::invalid_argument(format!(
                "n-gram range must satisfy 1 <= min <= max, got {min}..{max}"
            )));
        }
        Ok(Self { min, max })
    }
}

impl FeatureGenerator for NGramFeatureGenerator {
    fn extract_features(&self, tokens: &[String]) -> Vec<String> {
        let mut features = Vec::new();
        for n in self.min..=self.max {
            for window in tokens.windows(n) {
                features.push(format!("ng={}", window.join(":")));
            }
        }
        features
    }

    fn name(&self) -> &'static str {
        "ngram"
    }
}
