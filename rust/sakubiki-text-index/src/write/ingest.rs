use std::path::Path;

use sakubiki_common::{Result, verify_arg};
use sakubiki_io::MappedFile;
use sakubiki_store::{Transaction, WriteFlags};

use crate::{FullTextIndex, word_idx::DocumentId};

use super::{AddOutcome, WordOccurrenceMap, collect_occurrences};

impl FullTextIndex {
    /// Stores and indexes the document `name` with the given content.
    ///
    /// The content is stored verbatim and may be at most 4 GiB; the size is
    /// checked before anything is written. Only its valid UTF-8 runs are
    /// tokenized. If the identifier of `name` is already taken the index is
    /// left untouched and the outcome says by whom.
    pub fn add_document(&self, name: &str, content: &[u8]) -> Result<AddOutcome> {
        verify_arg!(content, content.len() <= u32::MAX as usize);
        let id = DocumentId::from_name(name);

        if let Some(existing_name) = self.store_document(id, name, content)? {
            return Ok(if existing_name == name {
                log::warn!("document '{name}' ({id}) is already indexed");
                AddOutcome::Duplicate { id }
            } else {
                log::warn!("document '{name}' collides with '{existing_name}' on identifier {id}");
                AddOutcome::Collision { id, existing_name }
            });
        }

        let occurrences = self.collect_occurrences(id, content)?;
        let written = self.append_occurrences(&occurrences)?;
        log::info!(
            "indexed document '{name}' ({id}): {} bytes, {} words, {written} occurrences",
            content.len(),
            occurrences.len(),
        );
        Ok(AddOutcome::Added {
            id,
            occurrences: written,
            words: occurrences.len(),
        })
    }

    /// Maps the file at `path` and ingests its content as the document
    /// `name`.
    pub fn add_document_file(&self, name: &str, path: impl AsRef<Path>) -> Result<AddOutcome> {
        let file = MappedFile::open(path)?;
        self.add_document(name, file.as_bytes())
    }

    /// Groups the occurrences in `content` by base form with this index's
    /// tokenizer and stopwords, without writing anything.
    pub fn collect_occurrences(&self, id: DocumentId, content: &[u8]) -> Result<WordOccurrenceMap> {
        collect_occurrences(self.tokenizer(), &self.config().stopwords, id, content)
    }

    /// Writes the name and content of a new document in one transaction.
    /// Returns the name already stored under `id` instead if there is one.
    fn store_document(&self, id: DocumentId, name: &str, content: &[u8]) -> Result<Option<String>> {
        let tables = self.tables();
        let key = id.to_key();
        let txn = self.env().begin_rw_txn()?;
        match txn.put(
            tables.document_info,
            &key,
            name.as_bytes(),
            WriteFlags::NO_OVERWRITE,
        ) {
            Ok(()) => {}
            Err(e) if e.is_key_exists() => {
                let existing = txn
                    .get(tables.document_info, &key)?
                    .map(|stored| String::from_utf8_lossy(stored).into_owned())
                    .unwrap_or_default();
                txn.abort();
                return Ok(Some(existing));
            }
            Err(e) => return Err(e),
        }
        txn.put(tables.document_content, &key, content, WriteFlags::empty())?;
        txn.commit()?;
        Ok(None)
    }

    /// Appends every word's records with one multi-value put per word.
    fn append_occurrences(&self, occurrences: &WordOccurrenceMap) -> Result<usize> {
        let txn = self.env().begin_rw_txn()?;
        let mut written = 0;
        {
            let mut cursor = txn.open_rw_cursor(self.tables().word_idx)?;
            for (word, records) in occurrences {
                written += cursor.put_multiple(word.as_bytes(), records, WriteFlags::empty())?;
            }
        }
        txn.commit()?;
        log::debug!(
            "appended {written} occurrences under {} words",
            occurrences.len()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use sakubiki_common::error::ErrorKind;
    use sakubiki_store::MAX_KEY_SIZE;

    use crate::{AddOutcome, FullTextIndex, IndexConfig, WordIdx, word_idx::DocumentId};

    fn open(dir: &tempfile::TempDir) -> FullTextIndex {
        FullTextIndex::open(dir.path(), IndexConfig::default().with_map_size(1 << 24)).unwrap()
    }

    #[test]
    fn test_add_a_b_a() {
        let dir = tempfile::TempDir::new().unwrap();
        let index = open(&dir);
        let outcome = index.add_document("abc", b"A B A").unwrap();
        let id = DocumentId::from_name("abc");
        assert_eq!(
            outcome,
            AddOutcome::Added {
                id,
                occurrences: 3,
                words: 2
            }
        );

        let mut a = index
            .word_occurrences("a")
            .unwrap()
            .collect::<sakubiki_common::Result<Vec<_>>>()
            .unwrap();
        a.sort_by_key(|idx| idx.offset);
        assert_eq!(a, vec![WordIdx::new(id, 0), WordIdx::new(id, 4)]);
        assert_eq!(index.word_occurrence_count("b").unwrap(), 1);
        assert_eq!(index.document_info(id).unwrap(), "abc");
        assert_eq!(index.view_document(id).unwrap().as_bytes(), b"A B A");
    }

    #[test]
    fn test_duplicate_leaves_index_unchanged() {
        let dir = tempfile::TempDir::new().unwrap();
        let index = open(&dir);
        index.add_document("doc", b"alpha beta").unwrap();
        let before = index.stats().unwrap();

        let outcome = index.add_document("doc", b"gamma delta").unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Duplicate {
                id: DocumentId::from_name("doc")
            }
        );
        assert_eq!(index.stats().unwrap().occurrences, before.occurrences);
        assert_eq!(index.word_occurrence_count("gamma").unwrap(), 0);
        let view = index.view_document_by_name("doc").unwrap();
        assert_eq!(view.to_str().unwrap(), "alpha beta");
    }

    #[test]
    fn test_latin1_content_is_stored_and_indexed() {
        let dir = tempfile::TempDir::new().unwrap();
        let index = open(&dir);
        let content = b"caf\xe9 ol\xe9 word";
        let outcome = index.add_document("latin1", content).unwrap();
        let id = DocumentId::from_name("latin1");
        assert_eq!(
            outcome,
            AddOutcome::Added {
                id,
                occurrences: 3,
                words: 3
            }
        );

        let view = index.view_document(id).unwrap();
        assert_eq!(view.as_bytes(), content);
        assert!(matches!(
            view.to_str().unwrap_err().kind(),
            ErrorKind::InvalidFormat { .. }
        ));
        let word = index
            .word_occurrences("word")
            .unwrap()
            .collect::<sakubiki_common::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(word, vec![WordIdx::new(id, 9)]);
        assert_eq!(index.word_occurrence_count("ol").unwrap(), 1);
    }

    #[test]
    fn test_longest_word_fits_the_word_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = IndexConfig::default()
            .with_map_size(1 << 24)
            .with_term_lengths(MAX_KEY_SIZE, 1);
        let index = FullTextIndex::open(dir.path(), config).unwrap();
        let long_word = "w".repeat(2 * MAX_KEY_SIZE);
        let outcome = index
            .add_document("long", format!("{long_word} short").as_bytes())
            .unwrap();
        assert!(outcome.is_added());
        let truncated = &long_word[..MAX_KEY_SIZE];
        assert_eq!(index.word_occurrence_count(truncated).unwrap(), 1);
        assert_eq!(index.word_occurrence_count("short").unwrap(), 1);
    }

    #[test]
    fn test_empty_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let index = open(&dir);
        let outcome = index.add_document("empty", b"").unwrap();
        assert!(matches!(
            outcome,
            AddOutcome::Added {
                occurrences: 0,
                words: 0,
                ..
            }
        ));
        let view = index.view_document_by_name("empty").unwrap();
        assert!(view.is_empty());
    }
}
