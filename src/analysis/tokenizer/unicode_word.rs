//! Unicode word tokenizer implementation.
//!
//! Splits text using the Unicode word boundary rules (UAX #29) and keeps only
//! segments that contain an alphanumeric character.
//!
//! # Examples
//!
//! ```
//! use authorage::analysis::tokenizer::Tokenizer;
//! use authorage::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let texts = tokenizer.tokenize_to_strings("Hello, world!").unwrap();
//! assert_eq!(texts, vec!["Hello", "world"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer.
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .split_word_bound_indices()
            .filter(|(_, word)| word.chars().any(char::is_alphanumeric))
            .enumerate()
            .map(|(position, (start, word))| {
                Token::with_offsets(word, position, start, start + word.len())
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode-word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_word_tokenizer() {
        let tokenizer = UnicodeWordTokenizer::new();
        let tokens: Vec<Token> = tokenizer.tokenize("café résumé, ok?").unwrap().collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "café");
        assert_eq!(tokens[1].text, "résumé");
        assert_eq!(tokens[2].text, "ok");
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn test_contractions_stay_whole() {
        let tokenizer = UnicodeWordTokenizer::new();
        let texts = tokenizer.tokenize_to_strings("I can't stop").unwrap();
        assert_eq!(texts, vec!["I", "can't", "stop"]);
    }
}
