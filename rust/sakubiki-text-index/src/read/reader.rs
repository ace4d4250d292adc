use sakubiki_common::{Result, error::Error, verify_data};
use sakubiki_store::{RoTransaction, Transaction};

use crate::{
    index::Tables,
    read::{DocumentList, Occurrences, WordList},
    word_idx::{DocumentId, WordIdx},
};

/// A consistent read-only view of the index.
///
/// All queries issued through one reader see the same snapshot, regardless
/// of documents added after the reader was created. Content and names are
/// borrowed straight from the snapshot.
pub struct IndexReader<'env> {
    txn: RoTransaction<'env>,
    tables: Tables,
}

impl<'env> IndexReader<'env> {
    pub(crate) fn new(txn: RoTransaction<'env>, tables: Tables) -> IndexReader<'env> {
        IndexReader { txn, tables }
    }

    pub fn word_occurrences(&self, word: &str) -> Result<Occurrences<&RoTransaction<'env>>> {
        Occurrences::new(&self.txn, self.tables.word_idx, word)
    }

    /// Number of occurrences of `word`, 0 for a word never seen.
    pub fn word_occurrence_count(&self, word: &str) -> Result<usize> {
        self.word_occurrences(word)?.count_remaining()
    }

    /// Name of the document `id`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotFound`](sakubiki_common::error::ErrorKind::NotFound) if
    /// there is no such document.
    pub fn document_info(&self, id: DocumentId) -> Result<&str> {
        let name = self
            .txn
            .get(self.tables.document_info, &id.to_key())?
            .ok_or_else(|| Error::not_found(format!("document {id}")))?;
        std::str::from_utf8(name).map_err(|_| Error::invalid_format("document_info value"))
    }

    /// Content of the document `id`.
    pub fn document_content(&self, id: DocumentId) -> Result<&[u8]> {
        self.txn
            .get(self.tables.document_content, &id.to_key())?
            .ok_or_else(|| Error::not_found(format!("document {id}")))
    }

    /// Identifier of the document called `name`, if it was ingested.
    ///
    /// A document whose name merely hashes to the same identifier does not
    /// match.
    pub fn find_document(&self, name: &str) -> Result<Option<DocumentId>> {
        let id = DocumentId::from_name(name);
        let stored = self.txn.get(self.tables.document_info, &id.to_key())?;
        Ok(stored.filter(|stored| *stored == name.as_bytes()).map(|_| id))
    }

    pub fn word_list(&self) -> Result<WordList<&RoTransaction<'env>>> {
        WordList::new(&self.txn, self.tables.word_idx)
    }

    pub fn document_list(&self) -> Result<DocumentList<&RoTransaction<'env>>> {
        DocumentList::new(&self.txn, self.tables.document_info)
    }

    /// Text around an occurrence: up to `radius` bytes on each side of its
    /// offset, widened to the nearest character boundaries.
    ///
    /// The snippet never leaves the valid UTF-8 run the occurrence lies in,
    /// so documents with invalid bytes still yield context.
    pub fn context(&self, idx: WordIdx, radius: usize) -> Result<Snippet<'_>> {
        let content = self.document_content(idx.document())?;
        let offset = idx.offset as usize;
        let Some((run_start, text)) = valid_run_at(content, offset) else {
            return Err(Error::invalid_format("word_idx offset"));
        };
        let offset = offset - run_start;
        verify_data!(offset, text.is_char_boundary(offset));

        let mut start = offset.saturating_sub(radius);
        while !text.is_char_boundary(start) {
            start -= 1;
        }
        let mut end = offset.saturating_add(radius).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        Ok(Snippet {
            before: &text[start..offset],
            after: &text[offset..end],
            start: run_start + start,
        })
    }
}

/// The valid UTF-8 run of `content` containing `offset`, with its start.
fn valid_run_at(content: &[u8], offset: usize) -> Option<(usize, &str)> {
    let mut run_start = 0;
    for chunk in content.utf8_chunks() {
        if offset < run_start {
            return None;
        }
        let text = chunk.valid();
        let run_end = run_start + text.len();
        if offset < run_end || (offset == run_end && chunk.invalid().is_empty()) {
            return Some((run_start, text));
        }
        run_start = run_end + chunk.invalid().len();
    }
    (offset == 0).then_some((0, ""))
}

impl std::fmt::Debug for IndexReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexReader")
            .field("tables", &self.tables)
            .finish()
    }
}

/// The text surrounding one occurrence, split at the occurrence offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snippet<'a> {
    /// Text preceding the occurrence.
    pub before: &'a str,
    /// Text starting at the occurrence.
    pub after: &'a str,
    /// Byte offset of `before` within the document.
    pub start: usize,
}

impl std::fmt::Display for Snippet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.before, self.after)
    }
}
