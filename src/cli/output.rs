//! Output formatting for tool results.

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::cli::TerminateTool;
use crate::cli::args::{OutputFormat, OutputParams};
use crate::ml::evaluation::Misclassification;

/// Summary printed after training a model.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub model_path: String,
    pub model_kind: String,
    pub training_examples: usize,
    /// Categories for classifiers, vocabulary terms for regressors.
    pub dimensions: usize,
    pub duration_ms: u64,
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model trained successfully")?;
        writeln!(f, "  Model:      {} ({})", self.model_path, self.model_kind)?;
        writeln!(f, "  Examples:   {}", self.training_examples)?;
        writeln!(f, "  Dimensions: {}", self.dimensions)?;
        write!(f, "  Duration:   {}ms", self.duration_ms)
    }
}

/// Classification of one input document.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<(String, f64)>>,
    pub text: String,
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category)?;
        if let Some(probabilities) = &self.probabilities {
            for (category, probability) in probabilities {
                write!(f, " {category}={probability:.4}")?;
            }
        }
        write!(f, "\t{}", self.text)
    }
}

/// Age prediction of one input document.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResult {
    pub age: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub text: String,
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.age)?;
        if let Some(category) = &self.category {
            write!(f, "\t{category}")?;
        }
        write!(f, "\t{}", self.text)
    }
}

/// Misclassified samples listing.
pub struct MisclassifiedReport<'a>(pub &'a [Misclassification]);

impl fmt::Display for MisclassifiedReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Misclassified samples: {}", self.0.len())?;
        for sample in self.0 {
            writeln!(
                f,
                "  expected {} got {}: {}",
                sample.expected, sample.predicted, sample.text
            )?;
        }
        Ok(())
    }
}

/// Write one result in the requested format.
pub fn write_result<T: Serialize + fmt::Display>(
    out: &mut dyn Write,
    params: &OutputParams,
    result: &T,
) -> Result<(), TerminateTool> {
    match params.output_format {
        OutputFormat::Human => writeln!(out, "{result}")?,
        OutputFormat::Json => {
            let json = if params.pretty {
                serde_json::to_string_pretty(result)
            } else {
                serde_json::to_string(result)
            }
            .map_err(|e| TerminateTool::failed("Failed to encode result as JSON", e))?;
            writeln!(out, "{json}")?;
        }
    }
    Ok(())
}
