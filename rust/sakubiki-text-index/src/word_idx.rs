//! Fixed-width records and identifiers stored in the index tables.

use bytemuck::{Pod, Zeroable};
use xxhash_rust::xxh3::xxh3_64;

/// Identifier of an ingested document: the low 32 bits of the XXH3 hash of
/// its name.
///
/// Distinct names may share an identifier. The index keeps the first
/// document written under an identifier and reports later names as
/// collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub u32);

impl DocumentId {
    pub fn from_name(name: &str) -> DocumentId {
        DocumentId(xxh3_64(name.as_bytes()) as u32)
    }

    /// Key of the document in the metadata and content tables. Big-endian, so
    /// the tables iterate in identifier order.
    pub fn to_key(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn from_key(key: &[u8]) -> Option<DocumentId> {
        let bytes: [u8; 4] = key.try_into().ok()?;
        Some(DocumentId(u32::from_be_bytes(bytes)))
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DocumentId {
    fn from(id: u32) -> Self {
        DocumentId(id)
    }
}

/// One occurrence of a word: the document it appears in and the byte offset
/// of its surface form within the document content.
///
/// Stored as the raw 8-byte struct in native byte order, one duplicate value
/// per occurrence under the word's key.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct WordIdx {
    pub doc_id: u32,
    pub offset: u32,
}

impl WordIdx {
    pub fn new(doc_id: DocumentId, offset: u32) -> WordIdx {
        WordIdx {
            doc_id: doc_id.0,
            offset,
        }
    }

    pub fn document(&self) -> DocumentId {
        DocumentId(self.doc_id)
    }
}
