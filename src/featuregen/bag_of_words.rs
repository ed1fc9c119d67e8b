//! Bag-of-words feature generator.

use super::FeatureGenerator;

/// Emits `bow=<token>` for every token, duplicates included.
#[derive(Clone, Copy, Debug, Default)]
pub struct BagOfWordsFeatureGenerator;

impl FeatureGenerator for BagOfWordsFeatureGenerator {
    fn extract_features(&self, tokens: &[String]) -> Vec<String> {
        tokens.iter().map(|token| format!("bow={token}")).collect()
    }

    fn name(&self) -> &'static str {
        "bow"
    }
}
