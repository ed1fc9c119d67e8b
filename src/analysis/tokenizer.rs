//! Tokenizer implementations for text analysis.
//!
//! Tokenizers are the first step of both the classification and the
//! regression pipelines. The tokenizer used to train a model is recorded in
//! the model as a [`TokenizerKind`] so prediction splits text the same way.
//!
//! # Available Tokenizers
//!
//! - [`whitespace::WhitespaceTokenizer`] - Splits on whitespace characters
//! - [`regex::RegexTokenizer`] - Words and single punctuation marks
//! - [`unicode_word::UnicodeWordTokenizer`] - Uses Unicode word boundaries
//!
//! # Examples
//!
//! ```
//! use authorage::analysis::tokenizer::Tokenizer;
//! use authorage::analysis::tokenizer::whitespace::WhitespaceTokenizer;
//!
//! let tokenizer = WhitespaceTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello world").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! ```

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::token::{TokenStream, token_texts};
use crate::error::{AuthorAgeError, Result};

pub mod regex;
pub mod unicode_word;
pub mod whitespace;

pub use self::regex::RegexTokenizer;
pub use self::unicode_word::UnicodeWordTokenizer;
pub use self::whitespace::WhitespaceTokenizer;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so tokenizers can be shared by the
/// data-parallel trainers.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Tokenize and keep only the token texts.
    fn tokenize_to_strings(&self, text: &str) -> Result<Vec<String>> {
        Ok(token_texts(self.tokenize(text)?))
    }
}

/// Serializable tokenizer selection stored inside trained models.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenizerKind {
    /// Split on whitespace only.
    #[default]
    Whitespace,
    /// Words plus single punctuation characters.
    Simple,
    /// Unicode word boundaries (UAX #29), punctuation dropped.
    UnicodeWord,
}

impl TokenizerKind {
    /// Instantiate the tokenizer.
    pub fn build(self) -> Result<Arc<dyn Tokenizer>> {
        Ok(match self {
            TokenizerKind::Whitespace => Arc::new(WhitespaceTokenizer::new()),
            TokenizerKind::Simple => Arc::new(RegexTokenizer::simple()?),
            TokenizerKind::UnicodeWord => Arc::new(UnicodeWordTokenizer::new()),
        })
    }

    /// The name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenizerKind::Whitespace => "whitespace",
            TokenizerKind::Simple => "simple",
            TokenizerKind::UnicodeWord => "unicode-word",
        }
    }
}

impl FromStr for TokenizerKind {
    type Err = AuthorAgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "whitespace" => Ok(TokenizerKind::Whitespace),
            "simple" => Ok(TokenizerKind::Simple),
            "unicode-word" | "unicode_word" => Ok(TokenizerKind::UnicodeWord),
            other => Err(AuthorAgeError::analysis(format!(
                "Unknown tokenizer: {other}"
            ))),
        }
    }
}
