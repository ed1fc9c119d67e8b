//! Text analysis: tokens and tokenizers.

pub mod token;
pub mod tokenizer;

pub use token::{Token, TokenStream};
pub use tokenizer::{
    RegexTokenizer, Tokenizer, TokenizerKind, UnicodeWordTokenizer, WhitespaceTokenizer,
};
