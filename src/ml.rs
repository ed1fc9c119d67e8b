//! Models for estimating an author's age.
//!
//! - [`classify`]: maximum-entropy age bracket classification
//! - [`predict`]: Lasso regression of the numeric age
//! - [`evaluation`]: accuracy and error metrics for both
//!
//! The numeric building blocks ([`maxent`], [`lasso`], [`vector`],
//! [`vectorizer`]) are usable on their own.

pub mod classify;
pub mod evaluation;
pub mod lasso;
pub mod maxent;
pub mod models;
pub mod predict;
pub mod vector;
pub mod vectorizer;

pub use classify::{AgeClassifyContext, AgeClassifyME, AgeClassifyModel, Categorization};
pub use evaluation::{ClassificationMetrics, RegressionMetrics};
pub use predict::{AgePrediction, AgePredictModel, AgePredictParams, AgePredictTrainer, AgePredicter};
