//! Index queries.
//!
//! Every query runs against a read-only snapshot. The sequences in this module
//! are generic over the owner of that snapshot: the methods on
//! [`FullTextIndex`](crate::FullTextIndex) hand each sequence its own
//! transaction, while an [`IndexReader`] lends one snapshot to many queries.
//! Records are decoded as they are consumed, so an occurrence list is never
//! loaded into memory as a whole.

use sakubiki_common::{Result, error::Error, try_or_ret_some_err};
use sakubiki_store::{
    Database, KeyIter, KeyValueIter, MultipleValueIter, Transaction, ValueView,
};

use crate::word_idx::{DocumentId, WordIdx};

pub(crate) mod reader;

pub use reader::{IndexReader, Snippet};

/// The occurrences of one word, in the order of their encoded records.
///
/// An unknown word yields nothing.
pub struct Occurrences<T: Transaction> {
    inner: MultipleValueIter<T, WordIdx>,
}

impl<T: Transaction> Occurrences<T> {
    pub(crate) fn new(txn: T, word_idx: Database, word: &str) -> Result<Occurrences<T>> {
        Ok(Occurrences {
            inner: MultipleValueIter::new(txn, word_idx, word.as_bytes())?,
        })
    }

    /// Counts the occurrences not yet yielded, page by page and without
    /// decoding them.
    pub fn count_remaining(self) -> Result<usize> {
        self.inner.count_remaining()
    }
}

impl<T: Transaction> Iterator for Occurrences<T> {
    type Item = Result<WordIdx>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// All distinct words of the index in byte order.
pub struct WordList<T: Transaction> {
    inner: KeyIter<T>,
}

impl<T: Transaction> WordList<T> {
    pub(crate) fn new(txn: T, word_idx: Database) -> Result<WordList<T>> {
        Ok(WordList {
            inner: KeyIter::new(txn, word_idx)?,
        })
    }
}

impl<T: Transaction> Iterator for WordList<T> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = try_or_ret_some_err!(self.inner.next()?);
        Some(String::from_utf8(key).map_err(|_| Error::invalid_format("word_idx key")))
    }
}

/// All documents of the index with their names, in identifier order.
pub struct DocumentList<T: Transaction> {
    inner: KeyValueIter<T>,
}

impl<T: Transaction> DocumentList<T> {
    pub(crate) fn new(txn: T, document_info: Database) -> Result<DocumentList<T>> {
        Ok(DocumentList {
            inner: KeyValueIter::new(txn, document_info)?,
        })
    }
}

impl<T: Transaction> Iterator for DocumentList<T> {
    type Item = Result<(DocumentId, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = try_or_ret_some_err!(self.inner.next()?);
        Some(decode_document_entry(&key, value))
    }
}

fn decode_document_entry(key: &[u8], name: Vec<u8>) -> Result<(DocumentId, String)> {
    let id = DocumentId::from_key(key).ok_or_else(|| Error::invalid_format("document_info key"))?;
    let name = String::from_utf8(name).map_err(|_| Error::invalid_format("document_info value"))?;
    Ok((id, name))
}

/// The stored content of one document, read without copying.
///
/// Holds its own snapshot open for as long as it is alive.
pub struct DocumentView<'env> {
    id: DocumentId,
    value: ValueView<'env>,
}

impl<'env> DocumentView<'env> {
    pub(crate) fn new(id: DocumentId, value: ValueView<'env>) -> DocumentView<'env> {
        DocumentView { id, value }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }

    /// The content as text.
    ///
    /// Content is stored verbatim, so this fails with
    /// [`ErrorKind::InvalidFormat`](sakubiki_common::error::ErrorKind::InvalidFormat)
    /// for documents that are not entirely UTF-8.
    pub fn to_str(&self) -> Result<&str> {
        std::str::from_utf8(self.as_bytes()).map_err(|_| Error::invalid_format("document_content"))
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl std::ops::Deref for DocumentView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for DocumentView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentView")
            .field("id", &self.id)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_document_entry() {
        let (id, name) =
            decode_document_entry(&DocumentId(42).to_key(), b"notes.txt".to_vec()).unwrap();
        assert_eq!(id, DocumentId(42));
        assert_eq!(name, "notes.txt");

        assert!(decode_document_entry(b"toolong", b"x".to_vec()).is_err());
        assert!(decode_document_entry(&DocumentId(1).to_key(), vec![0xff, 0xfe]).is_err());
    }
}
