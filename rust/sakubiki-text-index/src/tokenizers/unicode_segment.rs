//! Unicode Segment Tokenizer - words by the Unicode word boundary rules.

use unicode_segmentation::{UnicodeSegmentation, UnicodeWordIndices};

use super::{
    DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Token, Tokenizer, normalize, word_feature,
};
use crate::tokenizers::TokenizerKind;

/// Segment Tokenizer - splits text at UAX #29 word boundaries.
///
/// Unlike the unicode-word tokenizer, inner punctuation that belongs to a
/// word is kept ("can't", "32.3"), katakana runs stay together and every
/// ideograph becomes its own word. Segments without any alphanumeric
/// character are dropped. Base forms are lowercased.
pub struct UnicodeSegmentTokenizer {
    max_term_length: usize,
    min_term_length: usize,
}

impl UnicodeSegmentTokenizer {
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

impl Default for UnicodeSegmentTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SegmentTokenIterator<'a> {
    words: UnicodeWordIndices<'a>,
    max_term_length: usize,
    min_term_length: usize,
}

impl<'a> Iterator for SegmentTokenIterator<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.words
            .by_ref()
            .find(|(_, word)| word.len() >= self.min_term_length)
            .map(|(offset, surface)| Token {
                offset,
                surface,
                base: normalize(surface, self.max_term_length),
                feature: word_feature(surface),
            })
    }
}

impl Tokenizer for UnicodeSegmentTokenizer {
    type TokenIter<'a> = SegmentTokenIterator<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        SegmentTokenIterator {
            words: input.unicode_word_indices(),
            max_term_length: self.max_term_length,
            min_term_length: self.min_term_length,
        }
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::UnicodeSegment
    }

    fn max_term_length(&self) -> usize {
        self.max_term_length
    }

    fn min_term_length(&self) -> usize {
        self.min_term_length
    }
}
