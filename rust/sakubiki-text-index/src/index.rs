//! The full-text index: one storage environment holding three tables.
//!
//! | table | key | value |
//! |---|---|---|
//! | `document_info` | document identifier (4 bytes, big-endian) | document name |
//! | `document_content` | document identifier | raw content |
//! | `word_idx` | base form (UTF-8) | one [`WordIdx`](crate::WordIdx) per occurrence, duplicate-sorted, fixed width |

use std::path::Path;

use sakubiki_common::{Result, error::Error};
use sakubiki_store::{
    Database, DatabaseFlags, Environment, EnvironmentOptions, RoTransaction, Transaction,
};

use crate::{
    config::IndexConfig,
    read::{DocumentList, DocumentView, IndexReader, Occurrences, WordList},
    tokenizers::{TokenizerType, create_tokenizer},
    word_idx::DocumentId,
};

pub(crate) const DOCUMENT_INFO: &str = "document_info";
pub(crate) const DOCUMENT_CONTENT: &str = "document_content";
pub(crate) const WORD_IDX: &str = "word_idx";

/// Handles of the index tables, opened once per environment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tables {
    pub document_info: Database,
    pub document_content: Database,
    pub word_idx: Database,
}

/// Document and occurrence counts of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub documents: usize,
    /// Total occurrence records across all words.
    pub occurrences: usize,
    /// Ceiling of the storage map.
    pub map_size: usize,
    /// Bytes of the map in use.
    pub used_bytes: usize,
}

/// An embedded full-text index stored in a directory.
///
/// Queries may run from any number of threads while one thread ingests;
/// each query sees the documents committed before it started.
pub struct FullTextIndex {
    env: Environment,
    tables: Tables,
    tokenizer: TokenizerType,
    config: IndexConfig,
}

impl FullTextIndex {
    /// Opens the index at `path`, creating the directory and tables on first
    /// use.
    ///
    /// The tokenizer is created before the storage is touched, so a bad
    /// tokenizer configuration fails without writing anything.
    pub fn open(path: impl AsRef<Path>, config: IndexConfig) -> Result<FullTextIndex> {
        let tokenizer = create_tokenizer(
            &config.tokenizer,
            config.max_term_length,
            config.min_term_length,
        )?;
        let options = EnvironmentOptions::default()
            .with_max_dbs(3)
            .with_map_size(config.map_size);
        let env = Environment::open(path, &options)?;
        let tables = env.write(|txn| {
            Ok(Tables {
                document_info: txn.create_db(Some(DOCUMENT_INFO), DatabaseFlags::empty())?,
                document_content: txn.create_db(Some(DOCUMENT_CONTENT), DatabaseFlags::empty())?,
                word_idx: txn.create_db(
                    Some(WORD_IDX),
                    DatabaseFlags::DUP_SORT | DatabaseFlags::DUP_FIXED,
                )?,
            })
        })?;
        log::debug!(
            "opened index at {} with tokenizer {}",
            env.path().display(),
            config.tokenizer
        );
        Ok(FullTextIndex {
            env,
            tables,
            tokenizer,
            config,
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The tokenizer documents are ingested with. Query words should be
    /// normalized with it too.
    pub fn tokenizer(&self) -> &TokenizerType {
        &self.tokenizer
    }

    pub fn path(&self) -> &Path {
        self.env.path()
    }

    /// Starts a reader over the current state of the index.
    pub fn reader(&self) -> Result<IndexReader<'_>> {
        Ok(IndexReader::new(self.env.begin_ro_txn()?, self.tables))
    }

    /// Streams the occurrences of `word`, which must already be a base form.
    /// The sequence owns its snapshot.
    pub fn word_occurrences(&self, word: &str) -> Result<Occurrences<RoTransaction<'_>>> {
        Occurrences::new(self.env.begin_ro_txn()?, self.tables.word_idx, word)
    }

    /// Number of occurrences of `word`, 0 if it was never seen.
    pub fn word_occurrence_count(&self, word: &str) -> Result<usize> {
        self.reader()?.word_occurrence_count(word)
    }

    /// Name of the document `id`; a `NotFound` error if there is none.
    pub fn document_info(&self, id: DocumentId) -> Result<String> {
        self.reader()?.document_info(id).map(str::to_string)
    }

    pub fn find_document(&self, name: &str) -> Result<Option<DocumentId>> {
        self.reader()?.find_document(name)
    }

    /// Content of the document `id` without copying it out of storage.
    pub fn view_document(&self, id: DocumentId) -> Result<DocumentView<'_>> {
        let txn = self.env.begin_ro_txn()?;
        match txn.into_view(self.tables.document_content, &id.to_key())? {
            Some(value) => Ok(DocumentView::new(id, value)),
            None => Err(Error::not_found(format!("document {id}"))),
        }
    }

    /// Content of the document called `name`.
    pub fn view_document_by_name(&self, name: &str) -> Result<DocumentView<'_>> {
        match self.find_document(name)? {
            Some(id) => self.view_document(id),
            None => Err(Error::not_found(format!("document '{name}'"))),
        }
    }

    pub fn word_list(&self) -> Result<WordList<RoTransaction<'_>>> {
        WordList::new(self.env.begin_ro_txn()?, self.tables.word_idx)
    }

    pub fn document_list(&self) -> Result<DocumentList<RoTransaction<'_>>> {
        DocumentList::new(self.env.begin_ro_txn()?, self.tables.document_info)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let txn = self.env.begin_ro_txn()?;
        let documents = txn.db_stat(self.tables.document_info)?.entries;
        let occurrences = txn.db_stat(self.tables.word_idx)?.entries;
        let info = self.env.info()?;
        let page_size = self.env.stat()?.page_size as usize;
        Ok(IndexStats {
            documents,
            occurrences,
            map_size: info.map_size,
            used_bytes: (info.last_page + 1) * page_size,
        })
    }

    /// Flushes committed data to disk.
    pub fn sync(&self) -> Result<()> {
        self.env.sync(true)
    }

    pub(crate) fn env(&self) -> &Environment {
        &self.env
    }

    pub(crate) fn tables(&self) -> Tables {
        self.tables
    }
}

impl std::fmt::Debug for FullTextIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullTextIndex")
            .field("path", &self.env.path())
            .field("tokenizer", &self.tokenizer)
            .finish()
    }
}
