//! Trivial Tokenizer - returns the input unchanged.

use std::{borrow::Cow, iter};

use super::{DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Token, Tokenizer, truncate_str};
use crate::tokenizers::TokenizerKind;

/// Trivial Tokenizer - the whole input is one token.
///
/// The base form is the input itself, truncated to the maximum length but
/// otherwise not normalized, so lookups must match byte for byte. Inputs
/// shorter than the minimum length produce no token. Suited to documents that
/// are themselves identifiers.
pub struct TrivialTokenizer {
    max_term_length: usize,
    min_term_length: usize,
}

impl TrivialTokenizer {
    pub fn with_lengths(max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            max_term_length,
            min_term_length,
        }
    }

    pub fn new() -> Self {
        Self::with_lengths(DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH)
    }
}

impl Default for TrivialTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for TrivialTokenizer {
    type TokenIter<'a> = iter::Flatten<iter::Once<Option<Token<'a>>>>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        let token = (!input.is_empty() && input.len() >= self.min_term_length).then(|| Token {
            offset: 0,
            surface: input,
            base: Cow::Borrowed(truncate_str(input, self.max_term_length)),
            feature: "text",
        });
        iter::once(token).flatten()
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Trivial
    }

    fn max_term_length(&self) -> usize {
        self.max_term_length
    }

    fn min_term_length(&self) -> usize {
        self.min_term_length
    }
}
