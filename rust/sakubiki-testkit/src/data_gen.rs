//! Data generation utilities for testing.
//!
//! Documents are built from a small fixed vocabulary by a seeded generator, so
//! the same parameters always produce the same text, and word frequencies are
//! known to the test that asked for them.

use std::collections::BTreeMap;

/// Vocabulary of generated documents. Every entry is a single lowercase word,
/// so it is its own base form under the word tokenizers.
pub const VOCABULARY: [&str; 24] = [
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliett",
    "kilo", "lima", "mike", "november", "oscar", "papa", "quebec", "romeo", "sierra", "tango",
    "uniform", "victor", "whiskey", "xray",
];

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 0x5a6b_7c8d;

/// A generated document together with its expected word counts.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub name: String,
    pub text: String,
    /// Number of occurrences of each vocabulary word in `text`.
    pub word_counts: BTreeMap<&'static str, usize>,
}

/// Generates `count` documents of `words_per_document` words each.
///
/// Words are separated by single spaces, with a line break after every tenth
/// word.
pub fn generate_documents(
    count: usize,
    words_per_document: usize,
    seed: u64,
) -> Vec<GeneratedDocument> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..count)
        .map(|i| generate_document(&mut rng, format!("doc-{i:04}.txt"), words_per_document))
        .collect()
}

fn generate_document(rng: &mut fastrand::Rng, name: String, words: usize) -> GeneratedDocument {
    let mut text = String::new();
    let mut word_counts = BTreeMap::new();
    for i in 0..words {
        if i > 0 {
            text.push(if i % 10 == 0 { '\n' } else { ' ' });
        }
        let word = VOCABULARY[rng.usize(..VOCABULARY.len())];
        text.push_str(word);
        *word_counts.entry(word).or_insert(0) += 1;
    }
    GeneratedDocument {
        name,
        text,
        word_counts,
    }
}

/// Sums the word counts of several documents.
pub fn total_word_counts(docs: &[GeneratedDocument]) -> BTreeMap<&'static str, usize> {
    let mut totals = BTreeMap::new();
    for doc in docs {
        for (word, count) in &doc.word_counts {
            *totals.entry(*word).or_insert(0) += count;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_documents(3, 50, DEFAULT_SEED);
        let b = generate_documents(3, 50, DEFAULT_SEED);
        assert_eq!(a.len(), 3);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.text, y.text);
        }
        assert_eq!(a[0].name, "doc-0000.txt");
    }

    #[test]
    fn test_word_counts_match_text() {
        let docs = generate_documents(2, 37, 7);
        for doc in &docs {
            assert_eq!(doc.word_counts.values().sum::<usize>(), 37);
            assert_eq!(doc.text.split_whitespace().count(), 37);
        }
        let totals = total_word_counts(&docs);
        assert_eq!(totals.values().sum::<usize>(), 74);
    }
}
