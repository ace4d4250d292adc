//! Unicode Word Tokenizer - extracts alphanumeric words using Unicode properties.

use std::str::CharIndices;

use super::{
    DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Token, Tokenizer, normalize, word_feature,
};
use crate::tokenizers::TokenizerKind;

/// Word Tokenizer - extracts alphanumeric words from text.
///
/// A word is a longest continuous run of alphanumeric characters; everything
/// else separates words and is never indexed. Base forms are lowercased.
/// Scripts written without spaces (Chinese, Japanese) come out as one word per
/// run between punctuation.
pub struct UnicodeWordTokenizer {
    max_term_length: usize,
    min_term_length: usize,
}

impl UnicodeWordTokenizer {
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

impl Default for UnicodeWordTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that yields word tokens from a string input.
pub struct WordTokenIterator<'a> {
    input: &'a str,
    char_indices: CharIndices<'a>,
    max_term_length: usize,
    min_term_length: usize,
}

impl<'a> WordTokenIterator<'a> {
    pub fn new(input: &'a str, max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            input,
            char_indices: input.char_indices(),
            max_term_length,
            min_term_length,
        }
    }

    /// Next alphanumeric span as `(start, end)` byte positions.
    fn next_span(&mut self) -> Option<(usize, usize)> {
        let mut word_start = None;
        for (pos, ch) in self.char_indices.by_ref() {
            if ch.is_alphanumeric() {
                if word_start.is_none() {
                    word_start = Some(pos);
                }
            } else if let Some(start) = word_start {
                return Some((start, pos));
            }
        }
        word_start.map(|start| (start, self.input.len()))
    }
}

impl<'a> Iterator for WordTokenIterator<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (start, end) = self.next_span()?;
            let surface = &self.input[start..end];
            if surface.len() < self.min_term_length {
                continue;
            }
            return Some(Token {
                offset: start,
                surface,
                base: normalize(surface, self.max_term_length),
                feature: word_feature(surface),
            });
        }
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    type TokenIter<'a> = WordTokenIterator<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        WordTokenIterator::new(input, self.max_term_length, self.min_term_length)
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::UnicodeWord
    }

    fn max_term_length(&self) -> usize {
        self.max_term_length
    }

    fn min_term_length(&self) -> usize {
        self.min_term_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bases(tokenizer: &UnicodeWordTokenizer, input: &str) -> Vec<String> {
        tokenizer
            .tokenize(input)
            .map(|t| t.base.into_owned())
            .collect()
    }

    #[test]
    fn test_unicode_word_tokenizer() {
        let tokenizer = UnicodeWordTokenizer::new();
        assert_eq!(
            bases(&tokenizer, "Typically 3-4 levels deep,"),
            vec!["typically", "3", "4", "levels", "deep"]
        );
        assert!(bases(&tokenizer, "").is_empty());
        assert!(bases(&tokenizer, "!@#$%^&*()").is_empty());
        assert_eq!(
            bases(&tokenizer, "Café naïve résumé"),
            vec!["café", "naïve", "résumé"]
        );
        assert_eq!(tokenizer.name(), "unicode-word");
    }

    #[test]
    fn test_offsets_and_surfaces() {
        let tokenizer = UnicodeWordTokenizer::new();
        let input = "A B A";
        let tokens: Vec<_> = tokenizer.tokenize(input).collect();
        let spans: Vec<(usize, &str)> = tokens.iter().map(|t| (t.offset, t.surface)).collect();
        assert_eq!(spans, vec![(0, "A"), (2, "B"), (4, "A")]);
        assert!(tokens.iter().all(|t| &input[t.offset..t.end()] == t.surface));
        assert_eq!(tokens[0].base, "a");
    }

    #[test]
    fn test_word_length_limits() {
        let tokenizer = UnicodeWordTokenizer::with_lengths(3, 1);
        assert_eq!(
            bases(&tokenizer, "cat dog elephant mouse"),
            vec!["cat", "dog", "ele", "mou"]
        );
        assert_eq!(bases(&tokenizer, "café"), vec!["caf"]);

        let tokenizer = UnicodeWordTokenizer::with_lengths(128, 3);
        assert_eq!(
            bases(&tokenizer, "a bb cat dog elephant"),
            vec!["cat", "dog", "elephant"]
        );
    }

    #[test]
    fn test_many_short_words_are_skipped_iteratively() {
        let tokenizer = UnicodeWordTokenizer::with_lengths(128, 2);
        let input = "a ".repeat(200_000) + "end";
        assert_eq!(bases(&tokenizer, &input), vec!["end"]);
    }

    #[test]
    fn test_cjk_text_tokenization() {
        let tokenizer = UnicodeWordTokenizer::new();
        let tokens: Vec<_> = tokenizer.tokenize("你好，世界！これはテスト。").collect();
        let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface).collect();
        assert_eq!(surfaces, vec!["你好", "世界", "これはテスト"]);
        assert_eq!(tokens[1].offset, "你好，".len());

        let bases = bases(&tokenizer, "2024年 2024");
        assert_eq!(bases, vec!["2024年", "2024"]);
        let features: Vec<_> = tokenizer.tokenize("2024年 2024").map(|t| t.feature).collect();
        assert_eq!(features, vec!["word", "number"]);
    }

    #[test]
    fn test_emoji_separates_words() {
        let tokenizer = UnicodeWordTokenizer::new();
        assert_eq!(
            bases(&tokenizer, "Hello 👋 world 🌍 test 测试 😀 2024"),
            vec!["hello", "world", "test", "测试", "2024"]
        );
    }
}
