//! Command implementations for sakubiki-cmd

use std::path::Path;

use anyhow::{Context, Result};
use sakubiki_text_index::{FullTextIndex, IndexConfig, Tokenizer};

pub mod doc;
pub mod stats;
pub mod tokenize;
pub mod word;

/// Loads the configuration file if one was given, the defaults otherwise.
pub fn load_config(config: Option<&Path>) -> Result<IndexConfig> {
    match config {
        Some(path) => IndexConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(IndexConfig::default()),
    }
}

pub fn open_index(db: &Path, config: Option<&Path>) -> Result<FullTextIndex> {
    let config = load_config(config)?;
    FullTextIndex::open(db, config)
        .with_context(|| format!("Failed to open index {}", db.display()))
}

/// Normalizes a query word the way the index tokenizer normalized the
/// documents.
pub fn query_base(index: &FullTextIndex, word: &str) -> Result<String> {
    index
        .tokenizer()
        .tokenize(word)
        .next()
        .map(|token| token.base.into_owned())
        .ok_or_else(|| anyhow::anyhow!("'{word}' contains no indexable word"))
}
