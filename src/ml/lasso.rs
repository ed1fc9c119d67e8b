//! L1-regularized linear regression (Lasso) trained by stochastic gradient
//! descent.
//!
//! Each iteration takes a gradient step on the least-squares loss of a
//! sampled mini-batch with step size `step_size / sqrt(iteration)`, then
//! applies soft-thresholding with `reg_param * step`. The intercept is never
//! penalized.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{AuthorAgeError, Result};
use crate::ml::vector::SparseVector;

/// Training parameters for [`LassoWithSgd`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LassoParams {
    /// Number of SGD iterations.
    pub iterations: usize,
    /// Initial step size.
    pub step_size: f64,
    /// L1 regularization strength.
    pub reg_param: f64,
    /// Fraction of the data sampled for each iteration.
    pub mini_batch_fraction: f64,
    /// Learn an unpenalized intercept.
    pub fit_intercept: bool,
    /// Seed for mini-batch sampling.
    pub seed: u64,
}

impl Default for LassoParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            step_size: 1.0,
            reg_param: 0.01,
            mini_batch_fraction: 1.0,
            fit_intercept: false,
            seed: 42,
        }
    }
}

/// A trained linear regression model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LassoModel {
    weights: Vec<f64>,
    intercept: f64,
}

impl LassoModel {
    /// Create a model from explicit weights.
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// The weight vector.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Number of features the model expects.
    pub fn num_features(&self) -> usize {
        self.weights.len()
    }

    /// Predict the target value of one feature vector.
    pub fn predict(&self, features: &SparseVector) -> Result<f64> {
        Ok(features.dot(&self.weights)? + self.intercept)
    }
}

/// Trains [`LassoModel`]s.
#[derive(Clone, Debug, Default)]
pub struct LassoWithSgd {
    params: LassoParams,
}

impl LassoWithSgd {
    /// Create a trainer with the given parameters.
    pub fn new(params: LassoParams) -> Self {
        Self { params }
    }

    /// Train on `(label, features)` pairs that all have the same dimension.
    pub fn train(&self, data: &[(f64, SparseVector)]) -> Result<LassoModel> {
        let Some((_, first)) = data.first() else {
            return Err(AuthorAgeError::InsufficientTrainingData {
                min_samples: 1,
                actual: 0,
            });
        };
        let size = first.size();
        if let Some((_, other)) = data.iter().find(|(_, v)| v.size() != size) {
            return Err(AuthorAgeError::invalid_feature_vector(format!(
                "mixed dimensions {size} and {}",
                other.size()
            )));
        }
        if !(self.params.mini_batch_fraction > 0.0 && self.params.mini_batch_fraction <= 1.0) {
            return Err(AuthorAgeError::invalid_argument(format!(
                "mini_batch_fraction must be in (0, 1], got {}",
                self.params.mini_batch_fraction
            )));
        }

        log::info!(
            "training lasso model: {} examples, {} features",
            data.len(),
            size
        );

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut weights = vec![0.0; size];
        let mut intercept = 0.0;
        let mut gradient = vec![0.0; size];

        for iteration in 1..=self.params.iterations {
            gradient.iter_mut().for_each(|g| *g = 0.0);
            let mut intercept_gradient = 0.0;
            let mut batch = 0usize;
            let mut loss = 0.0;

            for (label, features) in data {
                if self.params.mini_batch_fraction < 1.0
                    && !rng.random_bool(self.params.mini_batch_fraction)
                {
                    continue;
                }
                let diff = features.dot(&weights)? + intercept - label;
                for (index, value) in features.iter() {
                    gradient[index] += diff * value;
                }
                intercept_gradient += diff;
                loss += diff * diff / 2.0;
                batch += 1;
            }
            if batch == 0 {
                continue;
            }

            let step = self.params.step_size / (iteration as f64).sqrt();
            let shrinkage = self.params.reg_param * step;
            for (weight, g) in weights.iter_mut().zip(&gradient) {
                let updated = *weight - step * g / batch as f64;
                *weight = updated.signum() * (updated.abs() - shrinkage).max(0.0);
            }
            if self.params.fit_intercept {
                intercept -= step * intercept_gradient / batch as f64;
            }

            if iteration % 10 == 0 || iteration == self.params.iterations {
                log::debug!(
                    "iteration {:>4}: mean loss {:.6}",
                    iteration,
                    loss / batch as f64
                );
            }
        }

        Ok(LassoModel { weights, intercept })
    }
}
