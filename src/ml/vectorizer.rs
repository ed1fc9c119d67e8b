//! Term-count vectorization against a fixed vocabulary.

use std::collections::HashMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AuthorAgeError, Result};
use crate::ml::vector::SparseVector;

/// Parameters for fitting a vocabulary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorizerParams {
    /// Maximum vocabulary size; the most frequent terms are kept.
    pub vocab_size: usize,
    /// Minimum number of documents a term must appear in. Values below 1.0
    /// are a fraction of the document count.
    pub min_df: f64,
    /// Minimum count of a term within a document to be counted. Values
    /// below 1.0 are a fraction of the document's term count.
    pub min_tf: f64,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            vocab_size: 1 << 18,
            min_df: 1.0,
            min_tf: 1.0,
        }
    }
}

/// Fits a [`CountVectorizerModel`] from feature documents.
#[derive(Clone, Debug, Default)]
pub struct CountVectorizer {
    params: VectorizerParams,
}

impl CountVectorizer {
    /// Create a vectorizer with the given parameters.
    pub fn new(params: VectorizerParams) -> Self {
        Self { params }
    }

    /// Build the vocabulary: terms ordered by descending document frequency,
    /// ties broken alphabetically.
    pub fn fit<D: AsRef<[String]>>(&self, documents: &[D]) -> Result<CountVectorizerModel> {
        if self.params.vocab_size == 0 {
            return Err(AuthorAgeError::invalid_argument("vocab_size must be > 0"));
        }

        let mut document_frequency: AHashMap<&str, usize> = AHashMap::new();
        for document in documents {
            let mut seen: Vec<&str> = document.as_ref().iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let min_df = if self.params.min_df >= 1.0 {
            self.params.min_df
        } else {
            self.params.min_df * documents.len() as f64
        };

        let mut terms: Vec<(&str, usize)> = document_frequency
            .into_iter()
            .filter(|&(_, df)| df as f64 >= min_df)
            .collect();
        terms.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(self.params.vocab_size);

        if terms.is_empty() {
            return Err(AuthorAgeError::model(
                "vocabulary is empty: no term reached the minimum document frequency",
            ));
        }

        let vocabulary = terms.into_iter().map(|(term, _)| term.to_string()).collect();
        Ok(CountVectorizerModel::new(vocabulary).with_min_tf(self.params.min_tf))
    }
}

/// Maps feature occurrences to term counts over a fixed vocabulary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CountVectorizerModel {
    vocabulary: Vec<String>,
    min_tf: f64,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl PartialEq for CountVectorizerModel {
    fn eq(&self, other: &Self) -> bool {
        self.vocabulary == other.vocabulary && self.min_tf == other.min_tf
    }
}

impl CountVectorizerModel {
    /// Create a model from a vocabulary; position in the list is the index.
    pub fn new(vocabulary: Vec<String>) -> Self {
        let index = Self::build_index(&vocabulary);
        Self {
            vocabulary,
            min_tf: 1.0,
            index,
        }
    }

    /// Set the minimum term frequency filter.
    pub fn with_min_tf(mut self, min_tf: f64) -> Self {
        self.min_tf = min_tf;
        self
    }

    fn build_index(vocabulary: &[String]) -> HashMap<String, usize> {
        vocabulary
            .iter()
            .enumerate()
            .map(|(position, term)| (term.clone(), position))
            .collect()
    }

    /// Rebuild the lookup table after deserialization.
    pub(crate) fn reindex(&mut self) {
        self.index = Self::build_index(&self.vocabulary);
    }

    /// The vocabulary in index order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Number of terms in the vocabulary.
    pub fn size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Count the occurrences of vocabulary terms in `features`; unknown
    /// terms are ignored.
    pub fn transform(&self, features: &[String]) -> Result<SparseVector> {
        let mut counts: AHashMap<usize, f64> = AHashMap::new();
        for feature in features {
            if let Some(&position) = self.index.get(feature) {
                *counts.entry(position).or_insert(0.0) += 1.0;
            }
        }

        let min_tf = if self.min_tf >= 1.0 {
            self.min_tf
        } else {
            self.min_tf * features.len() as f64
        };

        let pairs = counts
            .into_iter()
            .filter(|&(_, count)| count >= min_tf)
            .collect();
        SparseVector::from_pairs(self.vocabulary.len(), pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_orders_by_document_frequency() {
        let documents = vec![doc(&["b", "a", "a"]), doc(&["a", "c"]), doc(&["c", "a"])];
        let model = CountVectorizer::default().fit(&documents).unwrap();
        assert_eq!(model.vocabulary(), &["a", "c", "b"]);
    }

    #[test]
    fn test_fit_min_df_and_vocab_size() {
        let documents = vec![doc(&["a", "b"]), doc(&["a", "c"]), doc(&["a", "c"])];
        let params = VectorizerParams {
            min_df: 2.0,
            ..VectorizerParams::default()
        };
        let model = CountVectorizer::new(params).fit(&documents).unwrap();
        assert_eq!(model.vocabulary(), &["a", "c"]);

        let params = VectorizerParams {
            vocab_size: 1,
            ..VectorizerParams::default()
        };
        let model = CountVectorizer::new(params).fit(&documents).unwrap();
        assert_eq!(model.vocabulary(), &["a"]);

        let params = VectorizerParams {
            min_df: 0.5,
            ..VectorizerParams::default()
        };
        let model = CountVectorizer::new(params).fit(&documents).unwrap();
        assert_eq!(model.size(), 2);
    }

    #[test]
    fn test_fit_empty_vocabulary() {
        let documents = vec![doc(&["a"])];
        let params = VectorizerParams {
            min_df: 2.0,
            ..VectorizerParams::default()
        };
        assert!(CountVectorizer::new(params).fit(&documents).is_err());
    }

    #[test]
    fn test_transform_counts_occurrences() {
        let model = CountVectorizerModel::new(doc(&["bow=old", "bow=very", "cat=65-xx"]));
        let vector = model
            .transform(&doc(&["bow=very", "bow=very", "bow=old", "bow=unknown"]))
            .unwrap();
        assert_eq!(vector.size(), 3);
        assert_eq!(vector.indices(), &[0, 1]);
        assert_eq!(vector.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_transform_min_tf() {
        let model = CountVectorizerModel::new(doc(&["a", "b"])).with_min_tf(2.0);
        let vector = model.transform(&doc(&["a", "a", "b"])).unwrap();
        assert_eq!(vector.indices(), &[0]);
    }

    #[test]
    fn test_reindex_after_deserialize() {
        let model = CountVectorizerModel::new(doc(&["a", "b"]));
        let bytes = bincode::serialize(&model).unwrap();
        let mut restored: CountVectorizerModel = bincode::deserialize(&bytes).unwrap();
        restored.reindex();
        assert_eq!(restored, model);
        assert_eq!(restored.transform(&doc(&["b"])).unwrap().indices(), &[1]);
    }
}
