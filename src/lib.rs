//! # authorage
//!
//! Author age classification and prediction from text.
//!
//! ## Features
//!
//! - Maximum-entropy classification into age brackets
//! - Lasso regression of the numeric age, optionally weighted by the
//!   predicted bracket
//! - Pluggable tokenizers, feature generators and sample formats
//! - A tool registry and router behind the `authorage` command line
//! - Data-parallel training and evaluation with rayon

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod featuregen;
pub mod formats;
pub mod ml;

pub mod prelude {
    pub use crate::error::{AuthorAgeError, Result};
    pub use crate::formats::{AgeBrackets, AuthorAgeSample};
    pub use crate::ml::{AgeClassifyME, AgePredicter, AgePredictModel};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
