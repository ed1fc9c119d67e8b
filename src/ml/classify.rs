//! Age bracket classification.
//!
//! [`AgeClassifyModel`] is the persisted artifact; [`AgeClassifyME`] wraps a
//! loaded model together with the tokenizer and feature generators it was
//! trained with.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::{Tokenizer, TokenizerKind};
use crate::error::{AuthorAgeError, Result};
use crate::featuregen::{self, FeatureGenerator, FeatureGeneratorKind};
use crate::formats::AuthorAgeSample;
use crate::ml::maxent::{MaxentModel, MaxentParams, MaxentTrainer};
use crate::ml::models::{self, ModelMetadata};

/// Model kind written in the file header.
pub const MODEL_KIND: &str = "age-classify";

/// How documents are turned into predicates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgeClassifyContext {
    /// Tokenizer applied to raw text.
    pub tokenizer: TokenizerKind,
    /// Feature generators applied to the tokens.
    pub feature_generators: Vec<FeatureGeneratorKind>,
}

impl Default for AgeClassifyContext {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerKind::default(),
            feature_generators: FeatureGeneratorKind::default_set(),
        }
    }
}

/// A trained, persistable age classification model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgeClassifyModel {
    metadata: ModelMetadata,
    context: AgeClassifyContext,
    maxent: MaxentModel,
}

impl AgeClassifyModel {
    /// Read a model from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let model: Self = models::read_model(path, MODEL_KIND)?;
        model
            .maxent
            .validate()
            .map_err(|e| AuthorAgeError::model_load(path, e.to_string()))?;
        Ok(model)
    }

    /// Write the model to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        models::write_model(path, MODEL_KIND, self)
    }

    /// Training metadata.
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// The analysis context.
    pub fn context(&self) -> &AgeClassifyContext {
        &self.context
    }

    /// Category labels known to the model.
    pub fn categories(&self) -> &[String] {
        self.maxent.outcomes()
    }
}

/// Classifier built around a loaded [`AgeClassifyModel`].
pub struct AgeClassifyME {
    model: AgeClassifyModel,
    tokenizer: Arc<dyn Tokenizer>,
    generators: Vec<Arc<dyn FeatureGenerator>>,
}

impl std::fmt::Debug for AgeClassifyME {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgeClassifyME")
            .field("categories", &self.model.categories())
            .field("tokenizer", &self.tokenizer.name())
            .field("generators", &self.generators.len())
            .finish()
    }
}

impl AgeClassifyME {
    /// Wrap a model.
    pub fn new(model: AgeClassifyModel) -> Result<Self> {
        let tokenizer = model.context.tokenizer.build()?;
        let generators = featuregen::build_all(&model.context.feature_generators)?;
        Ok(Self {
            model,
            tokenizer,
            generators,
        })
    }

    /// Load a model file and wrap it.
    pub fn load(path: &Path) -> Result<Self> {
        Self::new(AgeClassifyModel::load(path)?)
    }

    /// Train a model from labelled samples.
    pub fn train(
        language: &str,
        samples: &[AuthorAgeSample],
        context: AgeClassifyContext,
        params: &MaxentParams,
        parallel: bool,
    ) -> Result<AgeClassifyModel> {
        let tokenizer = context.tokenizer.build()?;
        let generators = featuregen::build_all(&context.feature_generators)?;

        let to_event = |sample: &AuthorAgeSample| -> Result<(String, Vec<String>)> {
            let tokens = tokenizer.tokenize_to_strings(&sample.text)?;
            Ok((
                sample.category.clone(),
                featuregen::extract_all(&generators, &tokens),
            ))
        };
        let events: Vec<(String, Vec<String>)> = if parallel {
            samples.par_iter().map(to_event).collect::<Result<_>>()?
        } else {
            samples.iter().map(to_event).collect::<Result<_>>()?
        };

        let maxent = MaxentTrainer::new(params.clone())
            .parallel(parallel)
            .train(&events)?;

        let mut metadata = ModelMetadata::new("maxent", language)
            .with_hyperparameter("iterations", params.iterations as f64)
            .with_hyperparameter("cutoff", params.cutoff as f64)
            .with_hyperparameter("learning_rate", params.learning_rate)
            .with_hyperparameter("l2", params.l2);
        metadata.training_examples = samples.len();

        Ok(AgeClassifyModel {
            metadata,
            context,
            maxent,
        })
    }

    /// The wrapped model.
    pub fn model(&self) -> &AgeClassifyModel {
        &self.model
    }

    /// The tokenizer the model was trained with.
    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Probability of every category given already tokenized text.
    pub fn probabilities(&self, tokens: &[String]) -> Vec<f64> {
        let context = featuregen::extract_all(&self.generators, tokens);
        self.model.maxent.eval(&context)
    }

    /// The most probable category of a distribution returned by
    /// [`probabilities`](Self::probabilities).
    pub fn best_category(&self, probabilities: &[f64]) -> Option<&str> {
        self.model.maxent.best_outcome(probabilities)
    }

    /// Tokenize and classify raw text.
    pub fn categorize(&self, text: &str) -> Result<Categorization> {
        let tokens = self.tokenizer.tokenize_to_strings(text)?;
        let probabilities = self.probabilities(&tokens);
        let category = self
            .best_category(&probabilities)
            .ok_or_else(|| AuthorAgeError::model("model has no categories"))?
            .to_string();
        Ok(Categorization {
            category,
            probabilities,
        })
    }

    /// Probabilities paired with their category labels.
    pub fn scored_categories<'a>(&'a self, probabilities: &[f64]) -> Vec<(&'a str, f64)> {
        self.model
            .categories()
            .iter()
            .map(String::as_str)
            .zip(probabilities.iter().copied())
            .collect()
    }
}

/// Result of classifying one document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Categorization {
    /// The best category.
    pub category: String,
    /// Probability of every category, in model order.
    pub probabilities: Vec<f64>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn training_samples() -> Vec<AuthorAgeSample> {
        let young = [
            "lol exams tomorrow and the party tonight",
            "omg the party was lit lol",
            "studying for exams all night lol",
            "party with friends after exams",
        ];
        let old = [
            "my grandchildren visited the garden today",
            "pension plans and the garden need attention",
            "the grandchildren love my garden",
            "retired life with pension and grandchildren",
        ];
        young
            .iter()
            .map(|text| AuthorAgeSample::with_category("18-24", *text))
            .chain(
                old.iter()
                    .map(|text| AuthorAgeSample::with_category("65-xx", *text)),
            )
            .collect()
    }

    pub(crate) fn test_params() -> MaxentParams {
        MaxentParams {
            iterations: 100,
            cutoff: 1,
            ..MaxentParams::default()
        }
    }

    #[test]
    fn test_train_and_categorize() {
        let model = AgeClassifyME::train(
            "en",
            &training_samples(),
            AgeClassifyContext::default(),
            &test_params(),
            false,
        )
        .unwrap();
        assert_eq!(model.categories(), &["18-24", "65-xx"]);
        assert_eq!(model.metadata().training_examples, 8);

        let classifier = AgeClassifyME::new(model).unwrap();
        assert_eq!(
            classifier.categorize("lol party").unwrap().category,
            "18-24"
        );
        assert_eq!(
            classifier
                .categorize("my garden and grandchildren")
                .unwrap()
                .category,
            "65-xx"
        );
    }

    #[test]
    fn test_save_and_load() {
        let model = AgeClassifyME::train(
            "en",
            &training_samples(),
            AgeClassifyContext::default(),
            &test_params(),
            true,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classify.bin");
        model.save(&path).unwrap();

        let classifier = AgeClassifyME::load(&path).unwrap();
        assert_eq!(classifier.model().context(), model.context());
        let result = classifier.categorize("pension").unwrap();
        assert_eq!(result.category, "65-xx");
        let scored = classifier.scored_categories(&result.probabilities);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[1].0, "65-xx");
    }

    #[test]
    fn test_load_rejects_inconsistent_weights() {
        let mut model = AgeClassifyME::train(
            "en",
            &training_samples(),
            AgeClassifyContext::default(),
            &test_params(),
            false,
        )
        .unwrap();
        model.maxent = model.maxent.with_weights(vec![0.5; 3]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classify.bin");
        model.save(&path).unwrap();

        let err = AgeClassifyME::load(&path).unwrap_err();
        assert!(matches!(err, AuthorAgeError::ModelLoad { .. }));
        assert!(err.to_string().contains("weights"));
    }
}
