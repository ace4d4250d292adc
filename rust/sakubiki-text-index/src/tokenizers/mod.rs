//! Tokenizers turning document text into indexable words.
//!
//! A tokenizer yields a lazy, finite sequence of [`Token`]s for one input.
//! Each token carries the byte offset and the surface text of its span in the
//! input, plus the normalized base form under which the word is indexed. The
//! index consumes only the offset and the base form.
//!
//! Tokenizers are selected by name, so an index can record which one it was
//! built with in its configuration.

pub mod trivial;
pub mod unicode_log;
pub mod unicode_segment;
pub mod unicode_word;

use std::borrow::Cow;

use sakubiki_common::{Result, error::Error};
use sakubiki_store::MAX_KEY_SIZE;
pub use trivial::TrivialTokenizer;
pub use unicode_log::UnicodeLogTokenizer;
pub use unicode_segment::UnicodeSegmentTokenizer;
pub use unicode_word::UnicodeWordTokenizer;

/// Default maximum length of a base form in bytes before truncation.
///
/// Keeps word keys well below the storage engine's key size limit.
pub const DEFAULT_MAX_TERM_LENGTH: usize = 128;

/// Default minimum length of a token's surface in bytes.
pub const DEFAULT_MIN_TERM_LENGTH: usize = 1;

/// One word found in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Byte offset of `surface` within the tokenized input.
    pub offset: usize,
    /// The span of the input the token was read from.
    pub surface: &'a str,
    /// Normalized form the token is indexed under.
    pub base: Cow<'a, str>,
    /// Coarse class of the token, such as `"word"` or `"number"`.
    pub feature: &'static str,
}

impl Token<'_> {
    /// Byte offset just past the surface span.
    pub fn end(&self) -> usize {
        self.offset + self.surface.len()
    }
}

/// A tokenizer extracts tokens from a text value for indexing.
///
/// Surfaces shorter than the minimum length are skipped; base forms longer
/// than the maximum length are truncated at a UTF-8 character boundary.
pub trait Tokenizer: Send + Sync {
    /// The iterator type returned by tokenize.
    type TokenIter<'a>: Iterator<Item = Token<'a>>
    where
        Self: 'a;

    /// Extracts tokens from `input`. Every call starts from the beginning.
    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a>;

    fn kind(&self) -> TokenizerKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn max_term_length(&self) -> usize;

    fn min_term_length(&self) -> usize;
}

/// Creates a tokenizer by name with the given term length limits.
///
/// # Errors
///
/// [`sakubiki_common::error::ErrorKind::TokenizerInit`] if the name is not
/// recognized, the limits are inconsistent, or `max_term_length` exceeds
/// [`MAX_KEY_SIZE`], the longest word the word table can store.
pub fn create_tokenizer(
    name: &str,
    max_term_length: usize,
    min_term_length: usize,
) -> Result<TokenizerType> {
    let kind = TokenizerKind::try_from(name)?;
    if max_term_length == 0 || min_term_length > max_term_length {
        return Err(Error::tokenizer_init(
            name,
            format!("invalid term length limits {min_term_length}..={max_term_length}"),
        ));
    }
    if max_term_length > MAX_KEY_SIZE {
        return Err(Error::tokenizer_init(
            name,
            format!("max term length {max_term_length} exceeds the {MAX_KEY_SIZE} byte key limit"),
        ));
    }
    let (max, min) = (max_term_length, min_term_length);
    Ok(match kind {
        TokenizerKind::Trivial => TokenizerType::Trivial(TrivialTokenizer::with_lengths(max, min)),
        TokenizerKind::UnicodeWord => {
            TokenizerType::UnicodeWord(UnicodeWordTokenizer::with_lengths(max, min))
        }
        TokenizerKind::UnicodeLog => {
            TokenizerType::UnicodeLog(UnicodeLogTokenizer::with_lengths(max, min))
        }
        TokenizerKind::UnicodeSegment => {
            TokenizerType::UnicodeSegment(UnicodeSegmentTokenizer::with_lengths(max, min))
        }
    })
}

/// Truncate a string slice to the maximum allowed length at a codepoint boundary.
pub(crate) fn truncate_str(input: &str, max_term_length: usize) -> &str {
    if input.len() <= max_term_length {
        return input;
    }
    let mut boundary = max_term_length;
    while boundary > 0 && !input.is_char_boundary(boundary) {
        boundary -= 1;
    }
    &input[..boundary]
}

/// Lowercases and truncates a surface into a base form, borrowing when the
/// surface is already normalized.
pub(crate) fn normalize(surface: &str, max_term_length: usize) -> Cow<'_, str> {
    if surface.chars().any(char::is_uppercase) {
        let lower = surface.to_lowercase();
        Cow::Owned(truncate_str(&lower, max_term_length).to_string())
    } else {
        Cow::Borrowed(truncate_str(surface, max_term_length))
    }
}

/// Feature label of a word-like span.
pub(crate) fn word_feature(surface: &str) -> &'static str {
    if surface.chars().all(|c| c.is_numeric()) {
        "number"
    } else {
        "word"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    /// The whole input is a single token, indexed as-is.
    Trivial,
    /// Maximal runs of alphanumeric characters, lowercased.
    UnicodeWord,
    /// Like `UnicodeWord`, and additionally IPv4 addresses as single tokens.
    UnicodeLog,
    /// Words by the Unicode word segmentation rules (UAX #29), lowercased.
    UnicodeSegment,
}

impl TryFrom<&str> for TokenizerKind {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "trivial" => Ok(TokenizerKind::Trivial),
            "unicode-word" => Ok(TokenizerKind::UnicodeWord),
            "unicode-log" => Ok(TokenizerKind::UnicodeLog),
            "unicode-segment" => Ok(TokenizerKind::UnicodeSegment),
            _ => Err(Error::tokenizer_init(name, "unrecognized tokenizer")),
        }
    }
}

impl TokenizerKind {
    pub const ALL: [TokenizerKind; 4] = [
        TokenizerKind::Trivial,
        TokenizerKind::UnicodeWord,
        TokenizerKind::UnicodeLog,
        TokenizerKind::UnicodeSegment,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            TokenizerKind::Trivial => "trivial",
            TokenizerKind::UnicodeWord => "unicode-word",
            TokenizerKind::UnicodeLog => "unicode-log",
            TokenizerKind::UnicodeSegment => "unicode-segment",
        }
    }
}

/// Enum that holds all available tokenizer types.
pub enum TokenizerType {
    Trivial(TrivialTokenizer),
    UnicodeWord(UnicodeWordTokenizer),
    UnicodeLog(UnicodeLogTokenizer),
    UnicodeSegment(UnicodeSegmentTokenizer),
}

impl Tokenizer for TokenizerType {
    type TokenIter<'a> = Box<dyn Iterator<Item = Token<'a>> + 'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        match self {
            TokenizerType::Trivial(tokenizer) => Box::new(tokenizer.tokenize(input)),
            TokenizerType::UnicodeWord(tokenizer) => Box::new(tokenizer.tokenize(input)),
            TokenizerType::UnicodeLog(tokenizer) => Box::new(tokenizer.tokenize(input)),
            TokenizerType::UnicodeSegment(tokenizer) => Box::new(tokenizer.tokenize(input)),
        }
    }

    fn kind(&self) -> TokenizerKind {
        match self {
            TokenizerType::Trivial(tokenizer) => tokenizer.kind(),
            TokenizerType::UnicodeWord(tokenizer) => tokenizer.kind(),
            TokenizerType::UnicodeLog(tokenizer) => tokenizer.kind(),
            TokenizerType::UnicodeSegment(tokenizer) => tokenizer.kind(),
        }
    }

    fn max_term_length(&self) -> usize {
        match self {
            TokenizerType::Trivial(tokenizer) => tokenizer.max_term_length(),
            TokenizerType::UnicodeWord(tokenizer) => tokenizer.max_term_length(),
            TokenizerType::UnicodeLog(tokenizer) => tokenizer.max_term_length(),
            TokenizerType::UnicodeSegment(tokenizer) => tokenizer.max_term_length(),
        }
    }

    fn min_term_length(&self) -> usize {
        match self {
            TokenizerType::Trivial(tokenizer) => tokenizer.min_term_length(),
            TokenizerType::UnicodeWord(tokenizer) => tokenizer.min_term_length(),
            TokenizerType::UnicodeLog(tokenizer) => tokenizer.min_term_length(),
            TokenizerType::UnicodeSegment(tokenizer) => tokenizer.min_term_length(),
        }
    }
}

impl std::fmt::Debug for TokenizerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerType")
            .field("kind", &self.kind())
            .field("max_term_length", &self.max_term_length())
            .field("min_term_length", &self.min_term_length())
            .finish()
    }
}
