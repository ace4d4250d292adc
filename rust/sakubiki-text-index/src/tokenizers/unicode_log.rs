//! Unicode Log Tokenizer - extends word tokenizer with IPv4 address recognition.

use std::borrow::Cow;

use super::{
    DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH, Token, Tokenizer,
    unicode_word::WordTokenIterator,
};
use crate::tokenizers::TokenizerKind;

/// Log Tokenizer - extends word tokenizer with IPv4 address recognition.
///
/// IPv4 addresses bounded by non-alphanumeric characters are emitted as
/// single tokens, followed by every word of the input as the unicode-word
/// tokenizer would produce it. Tokens may therefore overlap:
/// "192.168.1.1" yields the full address and the numbers "192", "168", "1"
/// and "1". Offsets are not monotonic across the two phases.
pub struct UnicodeLogTokenizer {
    max_term_length: usize,
    min_term_length: usize,
}

/// Iterator that yields both IPv4 addresses and word tokens from a string input.
pub struct LogTokenIterator<'a> {
    input: &'a str,
    word_iterator: WordTokenIterator<'a>,
    current_phase: LogTokenPhase,
    max_term_length: usize,
    min_term_length: usize,
    ipv4_search_pos: usize,
}

/// The log tokenizer first extracts all IPv4 addresses, then all words.
#[derive(Debug, PartialEq)]
enum LogTokenPhase {
    IPv4,
    Words,
}

impl<'a> LogTokenIterator<'a> {
    fn new(input: &'a str, max_term_length: usize, min_term_length: usize) -> Self {
        Self {
            input,
            word_iterator: WordTokenIterator::new(input, max_term_length, min_term_length),
            current_phase: LogTokenPhase::IPv4,
            max_term_length,
            min_term_length,
            ipv4_search_pos: 0,
        }
    }

    /// Finds the next bounded IPv4 address, returning its start offset.
    ///
    /// Addresses that would not fit the maximum term length are skipped
    /// rather than truncated into something that is no longer an address.
    fn find_next_ipv4(&mut self) -> Option<(usize, &'a str)> {
        let bytes = self.input.as_bytes();

        while self.ipv4_search_pos < bytes.len() {
            let start = self.ipv4_search_pos;
            if bytes[start].is_ascii_digit()
                && (start == 0 || !bytes[start - 1].is_ascii_alphanumeric())
            {
                let (end_pos, is_valid) = parse_ipv4_at_position(self.input, start);
                if is_valid && (end_pos >= bytes.len() || !bytes[end_pos].is_ascii_alphanumeric())
                {
                    self.ipv4_search_pos = end_pos;
                    let ipv4 = &self.input[start..end_pos];
                    if ipv4.len() > self.max_term_length {
                        continue;
                    }
                    return Some((start, ipv4));
                }
            }
            self.ipv4_search_pos += 1;
        }
        None
    }
}

impl<'a> Iterator for LogTokenIterator<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current_phase == LogTokenPhase::IPv4 {
            match self.find_next_ipv4() {
                Some((offset, ip)) if ip.len() >= self.min_term_length => {
                    return Some(Token {
                        offset,
                        surface: ip,
                        base: Cow::Borrowed(ip),
                        feature: "ipv4",
                    });
                }
                Some(_) => continue,
                None => self.current_phase = LogTokenPhase::Words,
            }
        }
        self.word_iterator.next()
    }
}

impl UnicodeLogTokenizer {
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

impl Default for UnicodeLogTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for UnicodeLogTokenizer {
    type TokenIter<'a> = LogTokenIterator<'a>;

    fn tokenize<'a>(&'a self, input: &'a str) -> Self::TokenIter<'a> {
        LogTokenIterator::new(input, self.max_term_length, self.min_term_length)
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::UnicodeLog
    }

    fn max_term_length(&self) -> usize {
        self.max_term_length
    }

    fn min_term_length(&self) -> usize {
        self.min_term_length
    }
}

/// Parses four dot-separated decimal octets (0-255) starting at `start`.
///
/// Returns the end position and whether a complete address was found; on
/// failure the end position is `start`.
fn parse_ipv4_at_position(text: &str, start: usize) -> (usize, bool) {
    let bytes = text.as_bytes();
    let mut pos = start;
    let mut octet_count = 0;

    while pos < bytes.len() && octet_count < 4 {
        let mut octet_value = 0u32;
        let mut digit_count = 0;

        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            octet_value = octet_value * 10 + (bytes[pos] - b'0') as u32;
            digit_count += 1;
            pos += 1;
            if digit_count > 3 || octet_value > 255 {
                return (start, false);
            }
        }
        if digit_count == 0 {
            return (start, false);
        }

        octet_count += 1;
        if octet_count < 4 {
            if pos >= bytes.len() || bytes[pos] != b'.' {
                return (start, false);
            }
            pos += 1;
        }
    }

    if octet_count == 4 {
        (pos, true)
    } else {
        (start, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bases(input: &str) -> Vec<String> {
        UnicodeLogTokenizer::new()
            .tokenize(input)
            .map(|t| t.base.into_owned())
            .collect()
    }

    #[test]
    fn test_unicode_log_tokenizer() {
        let terms = bases("10.0.0.1|192.168.1.1,,8.8.8.8 1.1.1.1");
        for ip in ["10.0.0.1", "192.168.1.1", "8.8.8.8", "1.1.1.1"] {
            assert!(terms.iter().any(|t| t == ip), "missing {ip}");
        }

        let terms = bases("Error connecting to 192.168.1.1 server");
        assert_eq!(terms[0], "192.168.1.1");
        assert_eq!(
            &terms[1..],
            &["error", "connecting", "to", "192", "168", "1", "1", "server"]
        );
    }

    #[test]
    fn test_ipv4_offsets() {
        let input = "from 10.1.2.3 to 10.1.2.4";
        let tokenizer = UnicodeLogTokenizer::new();
        let ips: Vec<(usize, &str, &str)> = tokenizer
            .tokenize(input)
            .filter(|t| t.feature == "ipv4")
            .map(|t| (t.offset, t.surface, t.feature))
            .collect();
        assert_eq!(ips, vec![(5, "10.1.2.3", "ipv4"), (17, "10.1.2.4", "ipv4")]);
    }

    #[test]
    fn test_ipv4_edge_cases() {
        let terms = bases("999.999.999.999 256.1.1.1");
        assert!(terms.iter().all(|t| !t.contains('.')));
        assert!(terms.iter().any(|t| t == "999"));

        let terms = bases("start192.168.1.1end");
        assert!(terms.iter().all(|t| t != "192.168.1.1"));
        assert!(terms.iter().any(|t| t == "start192"));
        assert!(terms.iter().any(|t| t == "1end"));

        let terms = bases("start 192.168.1.1 end");
        assert!(terms.iter().any(|t| t == "192.168.1.1"));
    }

    #[test]
    fn test_ipv4_longer_than_max_is_skipped() {
        let tokenizer = UnicodeLogTokenizer::with_lengths(8, 1);
        let terms: Vec<_> = tokenizer
            .tokenize("192.168.100.200 1.2.3.4")
            .map(|t| t.base.into_owned())
            .collect();
        assert_eq!(terms[0], "1.2.3.4");
        assert!(terms.iter().all(|t| t != "192.168."));
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4_at_position("1.2.3.4", 0), (7, true));
        assert_eq!(parse_ipv4_at_position("1.2.3", 0), (0, false));
        assert_eq!(parse_ipv4_at_position("x 1.2.3.4x", 2), (9, true));
        assert_eq!(parse_ipv4_at_position("1234.1.1.1", 0), (0, false));
    }
}
