//! Numeric age prediction.
//!
//! A document is tokenized, optionally classified into an age bracket,
//! turned into features, vectorized against the model vocabulary,
//! L1-normalized and scored by a Lasso regression model.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::{Tokenizer, TokenizerKind};
use crate::error::{AuthorAgeError, Result};
use crate::featuregen::{self, FeatureGenerator, FeatureGeneratorKind};
use crate::formats::AuthorAgeSample;
use crate::ml::classify::AgeClassifyME;
use crate::ml::lasso::{LassoModel, LassoParams, LassoWithSgd};
use crate::ml::models::{self, ModelMetadata};
use crate::ml::vector::{Normalizer, SparseVector};
use crate::ml::vectorizer::{CountVectorizer, CountVectorizerModel, VectorizerParams};

/// Model kind written in the file header.
pub const MODEL_KIND: &str = "age-predict";

/// Prefix of the synthetic category feature.
pub const CATEGORY_FEATURE_PREFIX: &str = "cat=";

/// Default number of tokens per category feature copy.
pub const DEFAULT_CATEGORY_WEIGHT_DIVISOR: usize = 18;

/// How documents are turned into regression features.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgePredictContext {
    /// Tokenizer applied to raw text.
    pub tokenizer: TokenizerKind,
    /// Feature generators applied to the tokens.
    pub feature_generators: Vec<FeatureGeneratorKind>,
    /// One `cat=<label>` feature is added per this many tokens.
    pub category_weight_divisor: usize,
}

impl Default for AgePredictContext {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerKind::default(),
            feature_generators: FeatureGeneratorKind::default_set(),
            category_weight_divisor: DEFAULT_CATEGORY_WEIGHT_DIVISOR,
        }
    }
}

/// A trained, persistable age regression model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgePredictModel {
    metadata: ModelMetadata,
    context: AgePredictContext,
    vocabulary: CountVectorizerModel,
    model: LassoModel,
}

impl AgePredictModel {
    /// Assemble a model from its parts.
    pub fn new(
        metadata: ModelMetadata,
        context: AgePredictContext,
        vocabulary: CountVectorizerModel,
        model: LassoModel,
    ) -> Result<Self> {
        let model = Self {
            metadata,
            context,
            vocabulary,
            model,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.vocabulary.size() != self.model.num_features() {
            return Err(AuthorAgeError::model(format!(
                "vocabulary has {} terms but the regression model has {} weights",
                self.vocabulary.size(),
                self.model.num_features()
            )));
        }
        Ok(())
    }

    /// Read a model from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let mut model: Self = models::read_model(path, MODEL_KIND)?;
        model
            .validate()
            .map_err(|e| AuthorAgeError::model_load(path, e.to_string()))?;
        model.vocabulary.reindex();
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
    pub fn context(&self) -> &AgePredictContext {
        &self.context
    }

    /// The fixed vectorizer vocabulary.
    pub fn vocabulary(&self) -> &CountVectorizerModel {
        &self.vocabulary
    }

    /// The regression model.
    pub fn regression(&self) -> &LassoModel {
        &self.model
    }
}

/// Builds regression features from tokens.
struct FeatureBuilder {
    tokenizer: Arc<dyn Tokenizer>,
    generators: Vec<Arc<dyn FeatureGenerator>>,
    divisor: usize,
}

impl FeatureBuilder {
    fn new(context: &AgePredictContext) -> Result<Self> {
        if context.category_weight_divisor == 0 {
            return Err(AuthorAgeError::invalid_argument(
                "category weight divisor must be > 0",
            ));
        }
        Ok(Self {
            tokenizer: context.tokenizer.build()?,
            generators: featuregen::build_all(&context.feature_generators)?,
            divisor: context.category_weight_divisor,
        })
    }

    fn features(&self, tokens: &[String], category: Option<&str>) -> Vec<String> {
        let mut features = featuregen::extract_all(&self.generators, tokens);
        if let Some(category) = category {
            let copies = tokens.len() / self.divisor;
            features.extend(
                std::iter::repeat_n(format!("{CATEGORY_FEATURE_PREFIX}{category}"), copies),
            );
        }
        features
    }
}

/// Result of predicting one document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgePrediction {
    /// Predicted age.
    pub age: f64,
    /// Age bracket chosen by the classifier, if one was used.
    pub category: Option<String>,
    /// Number of tokens in the document.
    pub token_count: usize,
}

/// Everything needed to predict ages: both models, the tokenizer, the
/// feature generators and the vocabulary.
pub struct AgePredicter {
    classifier: Option<AgeClassifyME>,
    model: AgePredictModel,
    features: FeatureBuilder,
    normalizer: Normalizer,
}

impl std::fmt::Debug for AgePredicter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgePredicter")
            .field("classifier", &self.classifier)
            .field("vocabulary_size", &self.model.vocabulary.size())
            .field("normalizer", &self.normalizer)
            .finish()
    }
}

impl AgePredicter {
    /// Create a predicter; the classifier is optional.
    pub fn new(classifier: Option<AgeClassifyME>, model: AgePredictModel) -> Result<Self> {
        let features = FeatureBuilder::new(&model.context)?;
        Ok(Self {
            classifier,
            model,
            features,
            normalizer: Normalizer::l1(),
        })
    }

    /// Use a different normalizer.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Override the category weighting the model was trained with.
    pub fn with_category_weight_divisor(mut self, divisor: usize) -> Result<Self> {
        if divisor == 0 {
            return Err(AuthorAgeError::invalid_argument(
                "category weight divisor must be > 0",
            ));
        }
        self.features.divisor = divisor;
        Ok(self)
    }

    /// Divisor applied to the token count when weighting the category feature.
    pub fn category_weight_divisor(&self) -> usize {
        self.features.divisor
    }

    /// Load both models from disk.
    pub fn load(classify_model: Option<&Path>, regression_model: &Path) -> Result<Self> {
        let classifier = classify_model.map(AgeClassifyME::load).transpose()?;
        Self::new(classifier, AgePredictModel::load(regression_model)?)
    }

    /// The regression model.
    pub fn model(&self) -> &AgePredictModel {
        &self.model
    }

    /// Feature strings for one document, before vectorization.
    pub fn extract_features(&self, document: &str) -> Result<(Vec<String>, Option<String>, usize)> {
        let tokens = self.features.tokenizer.tokenize_to_strings(document)?;
        let category = self.classifier.as_ref().and_then(|classifier| {
            let probabilities = classifier.probabilities(&tokens);
            classifier.best_category(&probabilities).map(str::to_string)
        });
        let features = self.features.features(&tokens, category.as_deref());
        Ok((features, category, tokens.len()))
    }

    /// Normalized feature vector for one document.
    pub fn vectorize(&self, features: &[String]) -> Result<SparseVector> {
        if features.is_empty() {
            return Err(AuthorAgeError::analysis("no features extracted"));
        }
        let counts = self.model.vocabulary.transform(features)?;
        Ok(self.normalizer.transform(&counts))
    }

    /// Predict the age of the author of `document`.
    pub fn predict(&self, document: &str) -> Result<AgePrediction> {
        let (features, category, token_count) = self.extract_features(document)?;
        let vector = self.vectorize(&features)?;
        log::debug!(
            "{} features, {} in vocabulary, category {:?}",
            features.len(),
            vector.nnz(),
            category
        );

        Ok(AgePrediction {
            age: self.model.model.predict(&vector)?,
            category,
            token_count,
        })
    }
}

/// Parameters for [`AgePredictTrainer`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgePredictParams {
    /// Feature extraction settings.
    pub context: AgePredictContext,
    /// Vocabulary settings.
    pub vectorizer: VectorizerParams,
    /// Regression settings.
    pub lasso: LassoParams,
}

/// Trains [`AgePredictModel`]s.
pub struct AgePredictTrainer<'a> {
    classifier: Option<&'a AgeClassifyME>,
    params: AgePredictParams,
}

impl<'a> AgePredictTrainer<'a> {
    /// Create a trainer; with a classifier, every document also receives the
    /// weighted category feature.
    pub fn new(classifier: Option<&'a AgeClassifyME>, params: AgePredictParams) -> Self {
        Self { classifier, params }
    }

    /// Train on samples; samples without an age are skipped.
    pub fn train(&self, language: &str, samples: &[AuthorAgeSample]) -> Result<AgePredictModel> {
        let builder = FeatureBuilder::new(&self.params.context)?;

        let mut documents = Vec::new();
        let mut labels = Vec::new();
        let mut skipped = 0usize;
        for sample in samples {
            let Some(age) = sample.age else {
                skipped += 1;
                continue;
            };
            let tokens = builder.tokenizer.tokenize_to_strings(&sample.text)?;
            let category = self.classifier.and_then(|classifier| {
                let probabilities = classifier.probabilities(&tokens);
                classifier.best_category(&probabilities).map(str::to_string)
            });
            let features = builder.features(&tokens, category.as_deref());
            if features.is_empty() {
                skipped += 1;
                continue;
            }
            documents.push(features);
            labels.push(f64::from(age));
        }
        if skipped > 0 {
            log::warn!("skipped {skipped} samples without an age or without features");
        }
        if documents.is_empty() {
            return Err(AuthorAgeError::InsufficientTrainingData {
                min_samples: 1,
                actual: 0,
            });
        }

        let vocabulary = CountVectorizer::new(self.params.vectorizer.clone()).fit(&documents)?;
        let normalizer = Normalizer::l1();
        let data = documents
            .iter()
            .zip(labels)
            .map(|(features, label)| {
                let counts = vocabulary.transform(features)?;
                Ok((label, normalizer.transform(&counts)))
            })
            .collect::<Result<Vec<_>>>()?;

        let model = LassoWithSgd::new(self.params.lasso.clone()).train(&data)?;

        let lasso = &self.params.lasso;
        let mut metadata = ModelMetadata::new("lasso", language)
            .with_hyperparameter("iterations", lasso.iterations as f64)
            .with_hyperparameter("step_size", lasso.step_size)
            .with_hyperparameter("reg_param", lasso.reg_param)
            .with_hyperparameter("mini_batch_fraction", lasso.mini_batch_fraction)
            .with_hyperparameter("vocab_size", vocabulary.size() as f64);
        metadata.training_examples = data.len();

        AgePredictModel::new(metadata, self.params.context.clone(), vocabulary, model)
    }
}
