//! Feature generators turning token sequences into string predicates.
//!
//! Every generator is called once per document; the resulting feature lists
//! are concatenated in generator order. Both the classifier and the
//! regression vectorizer consume these strings.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AuthorAgeError, Result};

pub mod bag_of_words;
pub mod ngram;

pub use bag_of_words::BagOfWordsFeatureGenerator;
pub use ngram::NGramFeatureGenerator;

/// Trait for feature generators.
pub trait FeatureGenerator: Send + Sync {
    /// Extract features from the tokens of one document.
    fn extract_features(&self, tokens: &[String]) -> Vec<String>;

    /// Get the name of this generator (for debugging and logging).
    fn name(&self) -> &'static str;
}

/// Serializable feature generator description stored inside trained models.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureGeneratorKind {
    /// `bow=<token>` for every token.
    BagOfWords,
    /// `ng=<t1>:<t2>..` for every n-gram with `min <= n <= max`.
    NGram { min: usize, max: usize },
}

impl FeatureGeneratorKind {
    /// Instantiate the generator.
    pub fn build(&self) -> Result<Arc<dyn FeatureGenerator>> {
        Ok(match self {
            FeatureGeneratorKind::BagOfWords => Arc::new(BagOfWordsFeatureGenerator),
            FeatureGeneratorKind::NGram { min, max } => {
                Arc::new(NGramFeatureGenerator::new(*min, *max)?)
            }
        })
    }

    /// Parse a comma separated list such as `bow,ngram:2:2`.
    ///
    /// `ngram` alone means bigrams.
    pub fn parse_list(spec: &str) -> Result<Vec<FeatureGeneratorKind>> {
        let mut kinds = Vec::new();
        for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let mut parts = item.split(':');
            let kind = match parts.next() {
                Some("bow") => FeatureGeneratorKind::BagOfWords,
                Some("ngram") => {
                    let min = parse_bound(parts.next(), 2, item)?;
                    let max = parse_bound(parts.next(), min, item)?;
                    if min == 0 || min > max {
                        return Err(AuthorAgeError::analysis(format!(
                            "Invalid n-gram range in '{item}'"
                        )));
                    }
                    FeatureGeneratorKind::NGram { min, max }
                }
                _ => {
                    return Err(AuthorAgeError::analysis(format!(
                        "Unknown feature generator: {item}"
                    )));
                }
            };
            kinds.push(kind);
        }

        if kinds.is_empty() {
            return Err(AuthorAgeError::analysis(
                "At least one feature generator is required",
            ));
        }
        Ok(kinds)
    }

    /// The default generator set: bag of words plus bigrams.
    pub fn default_set() -> Vec<FeatureGeneratorKind> {
        vec![
            FeatureGeneratorKind::BagOfWords,
            FeatureGeneratorKind::NGram { min: 2, max: 2 },
        ]
    }
}

fn parse_bound(part: Option<&str>, default: usize, item: &str) -> Result<usize> {
    match part {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            AuthorAgeError::analysis(format!("Invalid n-gram size in '{item}'"))
        }),
    }
}

/// Build every generator of a kind list.
pub fn build_all(kinds: &[FeatureGeneratorKind]) -> Result<Vec<Arc<dyn FeatureGenerator>>> {
    kinds.iter().map(FeatureGeneratorKind::build).collect()
}

/// Run every generator over `tokens` and concatenate the results.
pub fn extract_all(generators: &[Arc<dyn FeatureGenerator>], tokens: &[String]) -> Vec<String> {
    let mut features = Vec::new();
    for generator in generators {
        features.extend(generator.extract_features(tokens));
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let kinds = FeatureGeneratorKind::parse_list("bow, ngram:1:3").unwrap();
        assert_eq!(
            kinds,
            vec![
                FeatureGeneratorKind::BagOfWords,
                FeatureGeneratorKind::NGram { min: 1, max: 3 },
            ]
        );

        let kinds = FeatureGeneratorKind::parse_list("ngram").unwrap();
        assert_eq!(kinds, vec![FeatureGeneratorKind::NGram { min: 2, max: 2 }]);
    }

    #[test]
    fn test_parse_list_errors() {
        assert!(FeatureGeneratorKind::parse_list("").is_err());
        assert!(FeatureGeneratorKind::parse_list("pos").is_err());
        assert!(FeatureGeneratorKind::parse_list("ngram:x").is_err());
        assert!(FeatureGeneratorKind::parse_list("ngram:3:2").is_err());
    }

    #[test]
    fn test_extract_all_keeps_generator_order() {
        let generators = build_all(&FeatureGeneratorKind::default_set()).unwrap();
        let tokens = vec!["very".to_string(), "old".to_string()];
        let features = extract_all(&generators, &tokens);
        assert_eq!(features, vec!["bow=very", "bow=old", "ng=very:old"]);
    }
}
