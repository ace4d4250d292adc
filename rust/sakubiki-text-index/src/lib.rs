//! Embedded full-text index over a memory-mapped transactional store.
//!
//! Documents are stored by a 32-bit identifier derived from their name, and
//! every word of their content is recorded as an 8-byte [`WordIdx`]
//! (document identifier, byte offset) under the word's base form.
//!
//! # Overview
//!
//! - [`FullTextIndex`] opens or creates an index directory and ingests
//!   documents with [`FullTextIndex::add_document`].
//! - Queries stream occurrences ([`FullTextIndex::word_occurrences`]), count
//!   them ([`FullTextIndex::word_occurrence_count`]) and look up documents by
//!   identifier or name.
//! - [`IndexReader`] runs several queries against one consistent snapshot.
//! - [`tokenizers`] turn text into the base forms the index is keyed by.
//!
//! # Quick Start
//!
//! ```no_run
//! use sakubiki_text_index::{FullTextIndex, IndexConfig};
//!
//! let index = FullTextIndex::open("notes.mdb", IndexConfig::default())?;
//! index.add_document("todo.txt", "Buy milk. Buy bread.".as_bytes())?;
//! assert_eq!(index.word_occurrence_count("buy")?, 2);
//! # Ok::<(), sakubiki_common::error::Error>(())
//! ```

mod config;
mod index;
pub mod read;
pub mod tokenizers;
mod word_idx;
pub mod write;

pub use config::{DEFAULT_STOPWORDS, IndexConfig};
pub use index::{FullTextIndex, IndexStats};
pub use read::{DocumentList, DocumentView, IndexReader, Occurrences, Snippet, WordList};
pub use tokenizers::{Token, Tokenizer, TokenizerKind, TokenizerType, create_tokenizer};
pub use word_idx::{DocumentId, WordIdx};
pub use write::{AddOutcome, WordOccurrenceMap, collect_occurrences};
