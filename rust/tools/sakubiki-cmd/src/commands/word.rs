//! Word commands

use std::path::Path;

use anyhow::Result;

use crate::{
    commands::{open_index, query_base},
    utils::single_line,
};

pub fn indices(db: &Path, config: Option<&Path>, word: &str) -> Result<()> {
    let index = open_index(db, config)?;
    let base = query_base(&index, word)?;
    for idx in index.word_occurrences(&base)? {
        let idx = idx?;
        println!("{}\t{}", idx.doc_id, idx.offset);
    }
    Ok(())
}

pub fn count(db: &Path, config: Option<&Path>, word: &str) -> Result<()> {
    let index = open_index(db, config)?;
    let base = query_base(&index, word)?;
    println!("{}", index.word_occurrence_count(&base)?);
    Ok(())
}

pub fn list(db: &Path, config: Option<&Path>) -> Result<()> {
    let index = open_index(db, config)?;
    for word in index.word_list()? {
        println!("{}", word?);
    }
    Ok(())
}

pub fn examples(
    db: &Path,
    config: Option<&Path>,
    word: &str,
    radius: usize,
    limit: usize,
) -> Result<()> {
    let index = open_index(db, config)?;
    let base = query_base(&index, word)?;
    let reader = index.reader()?;
    for idx in reader.word_occurrences(&base)?.take(limit) {
        let idx = idx?;
        let name = reader.document_info(idx.document())?;
        let snippet = reader.context(idx, radius)?;
        println!(
            "{name}:{}\t{}[{}",
            idx.offset,
            single_line(snippet.before),
            single_line(snippet.after)
        );
    }
    Ok(())
}
