//! Evaluation of trained models against held-out samples.

use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::formats::AuthorAgeSample;
use crate::ml::classify::AgeClassifyME;
use crate::ml::predict::AgePredicter;

/// Per-category counts of a classification evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryCounts {
    /// Samples whose reference category is this one.
    pub reference: usize,
    /// Samples predicted as this category.
    pub predicted: usize,
    /// Samples both labelled and predicted as this category.
    pub correct: usize,
}

impl CategoryCounts {
    /// Precision of this category, 0 when nothing was predicted.
    pub fn precision(&self) -> f64 {
        ratio(self.correct, self.predicted)
    }

    /// Recall of this category, 0 when no sample carries it.
    pub fn recall(&self) -> f64 {
        ratio(self.correct, self.reference)
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }
}

/// A sample the classifier got wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Misclassification {
    /// The labelled category.
    pub expected: String,
    /// The predicted category.
    pub predicted: String,
    /// The sample text.
    pub text: String,
}

/// Results of evaluating an age classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    /// Number of evaluated samples.
    pub total: usize,
    /// Number of correctly classified samples.
    pub correct: usize,
    /// Counts per category label.
    pub categories: BTreeMap<String, CategoryCounts>,
    /// Every wrong prediction, in sample order.
    pub misclassified: Vec<Misclassification>,
}

impl ClassificationMetrics {
    /// Fraction of correctly classified samples.
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    fn record(&mut self, expected: &str, predicted: &str, text: &str) {
        self.total += 1;
        self.categories.entry(expected.to_string()).or_default().reference += 1;
        self.categories.entry(predicted.to_string()).or_default().predicted += 1;
        if expected == predicted {
            self.correct += 1;
            self.categories.entry(expected.to_string()).or_default().correct += 1;
        } else {
            self.misclassified.push(Misclassification {
                expected: expected.to_string(),
                predicted: predicted.to_string(),
                text: text.to_string(),
            });
        }
    }
}

impl fmt::Display for ClassificationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4} ({}/{})", self.accuracy(), self.correct, self.total)?;
        writeln!(
            f,
            "{:<12} {:>9} {:>9} {:>9} {:>9}",
            "Category", "Precision", "Recall", "F1", "Support"
        )?;
        for (category, counts) in &self.categories {
            writeln!(
                f,
                "{:<12} {:>9.4} {:>9.4} {:>9.4} {:>9}",
                category,
                counts.precision(),
                counts.recall(),
                counts.f1(),
                counts.reference
            )?;
        }
        Ok(())
    }
}

/// Evaluate a classifier on labelled samples.
pub fn evaluate_classifier(
    classifier: &AgeClassifyME,
    samples: &[AuthorAgeSample],
) -> Result<ClassificationMetrics> {
    let mut metrics = ClassificationMetrics::default();
    for sample in samples {
        let predicted = classifier.categorize(&sample.text)?.category;
        metrics.record(&sample.category, &predicted, &sample.text);
    }
    Ok(metrics)
}

/// Data-parallel [`evaluate_classifier`]; the result is identical.
pub fn par_evaluate_classifier(
    classifier: &AgeClassifyME,
    samples: &[AuthorAgeSample],
) -> Result<ClassificationMetrics> {
    let predictions: Vec<String> = samples
        .par_iter()
        .map(|sample| classifier.categorize(&sample.text).map(|c| c.category))
        .collect::<Result<_>>()?;

    let mut metrics = ClassificationMetrics::default();
    for (sample, predicted) in samples.iter().zip(&predictions) {
        metrics.record(&sample.category, predicted, &sample.text);
    }
    Ok(metrics)
}

/// Error statistics of a regression evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Number of evaluated samples.
    pub count: usize,
    /// Mean squared error.
    pub mse: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Coefficient of determination.
    pub r2: f64,
    /// Samples left out for lacking an age or any feature.
    #[serde(default)]
    pub skipped: usize,
}

impl RegressionMetrics {
    /// Compute metrics from `(actual, predicted)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        if pairs.is_empty() {
            return Self::default();
        }
        let n = pairs.len() as f64;
        let mean = pairs.iter().map(|(actual, _)| actual).sum::<f64>() / n;
        let mut squared = 0.0;
        let mut absolute = 0.0;
        let mut total = 0.0;
        for (actual, predicted) in pairs {
            let error = predicted - actual;
            squared += error * error;
            absolute += error.abs();
            total += (actual - mean).powi(2);
        }
        let mse = squared / n;
        Self {
            count: pairs.len(),
            mse,
            rmse: mse.sqrt(),
            mae: absolute / n,
            r2: if total == 0.0 { 0.0 } else { 1.0 - squared / total },
            skipped: 0,
        }
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples: {}", self.count)?;
        writeln!(f, "MSE:     {:.4}", self.mse)?;
        writeln!(f, "RMSE:    {:.4}", self.rmse)?;
        writeln!(f, "MAE:     {:.4}", self.mae)?;
        writeln!(f, "R2:      {:.4}", self.r2)?;
        if self.skipped > 0 {
            writeln!(f, "Skipped: {}", self.skipped)?;
        }
        Ok(())
    }
}

/// Evaluate an age predicter on samples with a known age. Samples without
/// an age or without features are skipped, as in training.
pub fn evaluate_predicter(
    predicter: &AgePredicter,
    samples: &[AuthorAgeSample],
) -> Result<RegressionMetrics> {
    let mut pairs = Vec::with_capacity(samples.len());
    let mut skipped = 0usize;
    for sample in samples {
        let Some(age) = sample.age else {
            skipped += 1;
            continue;
        };
        let (features, _, _) = predicter.extract_features(&sample.text)?;
        if features.is_empty() {
            skipped += 1;
            continue;
        }
        let vector = predicter.vectorize(&features)?;
        let predicted = predicter.model().regression().predict(&vector)?;
        pairs.push((f64::from(age), predicted));
    }
    if skipped > 0 {
        log::warn!("skipped {skipped} samples without an age or without features");
    }

    let mut metrics = RegressionMetrics::from_pairs(&pairs);
    metrics.skipped = skipped;
    Ok(metrics)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tokenizer::TokenizerKind;
    use crate::formats::AgeBrackets;
    use crate::ml::classify::AgeClassifyContext;
    use crate::ml::classify::tests::{test_params, training_samples};
    use crate::ml::predict::{AgePredictContext, AgePredictParams, AgePredictTrainer};

    fn classifier() -> AgeClassifyME {
        let model = AgeClassifyME::train(
            "en",
            &training_samples(),
            AgeClassifyContext::default(),
            &test_params(),
            false,
        )
        .unwrap();
        AgeClassifyME::new(model).unwrap()
    }

    #[test]
    fn test_classification_metrics() {
        let samples = vec![
            AuthorAgeSample::with_category("18-24", "lol party"),
            AuthorAgeSample::with_category("65-xx", "pension and grandchildren"),
            AuthorAgeSample::with_category("65-xx", "lol exams party"),
        ];
        let metrics = evaluate_classifier(&classifier(), &samples).unwrap();
        assert_eq!(metrics.total, 3);
        assert_eq!(metrics.correct, 2);
        assert!((metrics.accuracy() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(metrics.misclassified.len(), 1);
        assert_eq!(metrics.misclassified[0].predicted, "18-24");

        let young = &metrics.categories["18-24"];
        assert_eq!((young.reference, young.predicted, young.correct), (1, 2, 1));
        assert_eq!(young.precision(), 0.5);
        assert_eq!(young.recall(), 1.0);

        let report = metrics.to_string();
        assert!(report.starts_with("Accuracy: 0.6667 (2/3)"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let classifier = classifier();
        let samples = training_samples();
        assert_eq!(
            evaluate_classifier(&classifier, &samples).unwrap(),
            par_evaluate_classifier(&classifier, &samples).unwrap()
        );
    }

    #[test]
    fn test_regression_metrics() {
        let metrics = RegressionMetrics::from_pairs(&[(20.0, 22.0), (40.0, 38.0), (60.0, 60.0)]);
        assert_eq!(metrics.count, 3);
        assert!((metrics.mse - 8.0 / 3.0).abs() < 1e-12);
        assert!((metrics.mae - 4.0 / 3.0).abs() < 1e-12);
        assert!((metrics.rmse - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((metrics.r2 - (1.0 - 8.0 / 800.0)).abs() < 1e-12);

        assert_eq!(RegressionMetrics::from_pairs(&[]), RegressionMetrics::default());
    }

    #[test]
    fn test_predicter_skips_samples_without_features() {
        let brackets = AgeBrackets::default();
        let params = AgePredictParams {
            context: AgePredictContext {
                tokenizer: TokenizerKind::UnicodeWord,
                ..AgePredictContext::default()
            },
            ..AgePredictParams::default()
        };
        let training = vec![
            AuthorAgeSample::with_age(20, "lol the party", &brackets),
            AuthorAgeSample::with_age(70, "my garden and grandchildren", &brackets),
        ];
        let model = AgePredictTrainer::new(None, params)
            .train("en", &training)
            .unwrap();
        let predicter = AgePredicter::new(None, model).unwrap();

        let samples = vec![
            AuthorAgeSample::with_age(22, "the party", &brackets),
            AuthorAgeSample::with_age(30, "!!!", &brackets),
            AuthorAgeSample::with_category("65-xx", "my garden"),
            AuthorAgeSample::with_age(68, "my garden", &brackets),
        ];
        let metrics = evaluate_predicter(&predicter, &samples).unwrap();
        assert_eq!(metrics.count, 2);
        assert_eq!(metrics.skipped, 2);
        assert!(metrics.to_string().contains("Skipped: 2"));
    }
}
