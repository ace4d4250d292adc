//! Document ingestion.
//!
//! Ingestion runs in two write transactions. The first stores the document
//! name and content under the document identifier and is where duplicates are
//! rejected, before any tokenization happens. The second appends the
//! document's occurrence records to the word table, one multi-value put per
//! distinct word.

use std::collections::{BTreeMap, btree_map};

use crate::word_idx::{DocumentId, WordIdx};

mod ingest;
mod occurrences;

pub use occurrences::collect_occurrences;

/// Result of [`FullTextIndex::add_document`](crate::FullTextIndex::add_document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The document was stored and indexed.
    Added {
        id: DocumentId,
        /// Number of occurrence records written.
        occurrences: usize,
        /// Number of distinct words the document contributed to.
        words: usize,
    },
    /// A document with the same name is already present. Nothing was written.
    Duplicate { id: DocumentId },
    /// A different document already owns the identifier this name hashes to.
    /// Nothing was written.
    Collision { id: DocumentId, existing_name: String },
}

impl AddOutcome {
    pub fn id(&self) -> DocumentId {
        match self {
            AddOutcome::Added { id, .. }
            | AddOutcome::Duplicate { id }
            | AddOutcome::Collision { id, .. } => *id,
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added { .. })
    }
}

/// Occurrence records of one document grouped by base form, in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordOccurrenceMap {
    words: BTreeMap<String, Vec<WordIdx>>,
    occurrences: usize,
}

impl WordOccurrenceMap {
    pub fn new() -> WordOccurrenceMap {
        Default::default()
    }

    pub fn push(&mut self, base: &str, idx: WordIdx) {
        match self.words.get_mut(base) {
            Some(records) => records.push(idx),
            None => {
                self.words.insert(base.to_string(), vec![idx]);
            }
        }
        self.occurrences += 1;
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Total number of records across all words.
    pub fn occurrences(&self) -> usize {
        self.occurrences
    }

    pub fn get(&self, base: &str) -> Option<&[WordIdx]> {
        self.words.get(base).map(Vec::as_slice)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<WordIdx>> {
        self.words.iter()
    }
}

impl<'a> IntoIterator for &'a WordOccurrenceMap {
    type Item = (&'a String, &'a Vec<WordIdx>);
    type IntoIter = btree_map::Iter<'a, String, Vec<WordIdx>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
