//! Maximum-entropy (multinomial logistic) classifier over string predicates.
//!
//! The model holds one weight per (predicate, outcome) pair. Training is
//! full-batch gradient ascent on the L2-regularized conditional
//! log-likelihood; the data-parallel variant computes the gradient with
//! rayon and produces the same model as the sequential one.

use std::collections::HashMap;

use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AuthorAgeError, Result};

/// Training parameters for [`MaxentTrainer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaxentParams {
    /// Number of gradient iterations.
    pub iterations: usize,
    /// Minimum number of occurrences for a predicate to be kept.
    pub cutoff: usize,
    /// Gradient step size.
    pub learning_rate: f64,
    /// L2 penalty on the weights.
    pub l2: f64,
}

impl Default for MaxentParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            cutoff: 5,
            learning_rate: 1.0,
            l2: 1e-4,
        }
    }
}

/// A trained maximum-entropy model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaxentModel {
    outcomes: Vec<String>,
    predicates: HashMap<String, usize>,
    /// Row-major `predicates x outcomes` weights.
    weights: Vec<f64>,
}

impl MaxentModel {
    /// Outcome labels in index order.
    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    /// Number of outcomes.
    pub fn num_outcomes(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of predicates that survived the cutoff.
    pub fn num_predicates(&self) -> usize {
        self.predicates.len()
    }

    /// Probability of every outcome given the context predicates.
    /// Unknown predicates are ignored; repeated predicates count repeatedly.
    pub fn eval(&self, context: &[String]) -> Vec<f64> {
        let indexed: Vec<(usize, f64)> = context
            .iter()
            .filter_map(|predicate| self.predicates.get(predicate).map(|&p| (p, 1.0)))
            .collect();
        let mut probabilities = vec![0.0; self.outcomes.len()];
        scores(&self.weights, self.outcomes.len(), &indexed, &mut probabilities);
        softmax(&mut probabilities);
        probabilities
    }

    /// Label of the most probable outcome; ties go to the first outcome.
    pub fn best_outcome(&self, probabilities: &[f64]) -> Option<&str> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &probability) in probabilities.iter().enumerate() {
            if best.is_none_or(|(_, max)| probability > max) {
                best = Some((index, probability));
            }
        }
        best.and_then(|(index, _)| self.outcomes.get(index))
            .map(String::as_str)
    }

    /// Index of an outcome label.
    pub fn outcome_index(&self, outcome: &str) -> Option<usize> {
        self.outcomes.iter().position(|o| o == outcome)
    }

    /// Check that the weight table covers every predicate row.
    pub fn validate(&self) -> Result<()> {
        let expected = self
            .predicates
            .len()
            .checked_mul(self.outcomes.len())
            .ok_or_else(|| AuthorAgeError::model("weight table size overflows"))?;
        if self.weights.len() != expected {
            return Err(AuthorAgeError::model(format!(
                "expected {expected} weights for {} predicates and {} outcomes, found {}",
                self.predicates.len(),
                self.outcomes.len(),
                self.weights.len()
            )));
        }
        if let Some((predicate, &row)) = self
            .predicates
            .iter()
            .find(|&(_, &row)| row >= self.predicates.len())
        {
            return Err(AuthorAgeError::model(format!(
                "predicate {predicate} points at row {row} of {}",
                self.predicates.len()
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = weights;
        self
    }
}

/// One training event: an outcome index and its `(predicate, count)` context.
#[derive(Clone, Debug)]
struct Event {
    outcome: usize,
    context: Vec<(usize, f64)>,
}

/// Trains [`MaxentModel`]s.
#[derive(Clone, Debug, Default)]
pub struct MaxentTrainer {
    params: MaxentParams,
    parallel: bool,
}

impl MaxentTrainer {
    /// Create a sequential trainer.
    pub fn new(params: MaxentParams) -> Self {
        Self {
            params,
            parallel: false,
        }
    }

    /// Compute gradients with rayon.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Train on `(outcome, context predicates)` pairs.
    pub fn train(&self, samples: &[(String, Vec<String>)]) -> Result<MaxentModel> {
        if samples.is_empty() {
            return Err(AuthorAgeError::InsufficientTrainingData {
                min_samples: 1,
                actual: 0,
            });
        }

        let mut predicate_counts: AHashMap<&str, usize> = AHashMap::new();
        for (_, context) in samples {
            for predicate in context {
                *predicate_counts.entry(predicate.as_str()).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<&str> = predicate_counts
            .into_iter()
            .filter(|&(_, count)| count >= self.params.cutoff)
            .map(|(predicate, _)| predicate)
            .collect();
        if kept.is_empty() {
            return Err(AuthorAgeError::model(format!(
                "no predicate occurs at least {} times",
                self.params.cutoff
            )));
        }
        kept.sort_unstable();
        let predicates: HashMap<String, usize> = kept
            .into_iter()
            .enumerate()
            .map(|(index, predicate)| (predicate.to_string(), index))
            .collect();

        let mut outcomes: Vec<String> = samples.iter().map(|(outcome, _)| outcome.clone()).collect();
        outcomes.sort_unstable();
        outcomes.dedup();

        let events: Vec<Event> = samples
            .iter()
            .map(|(outcome, context)| {
                let mut counts: AHashMap<usize, f64> = AHashMap::new();
                for predicate in context {
                    if let Some(&index) = predicates.get(predicate) {
                        *counts.entry(index).or_insert(0.0) += 1.0;
                    }
                }
                let mut context: Vec<(usize, f64)> = counts.into_iter().collect();
                context.sort_unstable_by_key(|&(index, _)| index);
                Event {
                    outcome: outcomes.binary_search(outcome).unwrap_or_default(),
                    context,
                }
            })
            .collect();

        log::info!(
            "training maxent model: {} events, {} predicates, {} outcomes",
            events.len(),
            predicates.len(),
            outcomes.len()
        );

        let width = outcomes.len();
        let mut weights = vec![0.0; predicates.len() * width];
        let scale = self.params.learning_rate / events.len() as f64;

        for iteration in 0..self.params.iterations {
            let (gradient, log_likelihood) = if self.parallel {
                parallel_gradient(&events, &weights, width)
            } else {
                sequential_gradient(&events, &weights, width)
            };

            for (weight, g) in weights.iter_mut().zip(gradient) {
                *weight += scale * (g - self.params.l2 * events.len() as f64 * *weight);
            }

            if iteration % 10 == 0 || iteration + 1 == self.params.iterations {
                log::debug!(
                    "iteration {:>4}: log-likelihood {:.6}",
                    iteration + 1,
                    log_likelihood
                );
            }
        }

        Ok(MaxentModel {
            outcomes,
            predicates,
            weights,
        })
    }
}

fn scores(weights: &[f64], width: usize, context: &[(usize, f64)], out: &mut [f64]) {
    for (predicate, count) in context {
        let row = &weights[predicate * width..(predicate + 1) * width];
        for (score, weight) in out.iter_mut().zip(row) {
            *score += count * weight;
        }
    }
}

fn softmax(values: &mut [f64]) {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for value in values.iter_mut() {
        *value = (*value - max).exp();
        sum += *value;
    }
    for value in values.iter_mut() {
        *value /= sum;
    }
}

/// Add one event's contribution to `gradient`, returning its log-likelihood.
fn accumulate(event: &Event, weights: &[f64], width: usize, gradient: &mut [f64]) -> f64 {
    let mut probabilities = vec![0.0; width];
    scores(weights, width, &event.context, &mut probabilities);
    softmax(&mut probabilities);

    for &(predicate, count) in &event.context {
        let row = &mut gradient[predicate * width..(predicate + 1) * width];
        for (outcome, (g, probability)) in row.iter_mut().zip(&probabilities).enumerate() {
            let observed = if outcome == event.outcome { 1.0 } else { 0.0 };
            *g += count * (observed - probability);
        }
    }
    probabilities[event.outcome].max(f64::MIN_POSITIVE).ln()
}

fn sequential_gradient(events: &[Event], weights: &[f64], width: usize) -> (Vec<f64>, f64) {
    let mut gradient = vec![0.0; weights.len()];
    let mut log_likelihood = 0.0;
    for event in events {
        log_likelihood += accumulate(event, weights, width, &mut gradient);
    }
    (gradient, log_likelihood)
}

fn parallel_gradient(events: &[Event], weights: &[f64], width: usize) -> (Vec<f64>, f64) {
    events
        .par_iter()
        .fold(
            || (vec![0.0; weights.len()], 0.0),
            |(mut gradient, log_likelihood), event| {
                let ll = accumulate(event, weights, width, &mut gradient);
                (gradient, log_likelihood + ll)
            },
        )
        .reduce(
            || (vec![0.0; weights.len()], 0.0),
            |(mut left, ll_left), (right, ll_right)| {
                for (l, r) in left.iter_mut().zip(right) {
                    *l += r;
                }
                (left, ll_left + ll_right)
            },
        )
}
