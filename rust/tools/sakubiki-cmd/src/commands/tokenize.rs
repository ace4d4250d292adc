//! Tokenize command

use std::path::Path;

use anyhow::{Context, Result};
use sakubiki_text_index::{Tokenizer, create_tokenizer};

use crate::commands::load_config;

pub fn run(config: Option<&Path>, text: &str) -> Result<()> {
    let config = load_config(config)?;
    let tokenizer = create_tokenizer(
        &config.tokenizer,
        config.max_term_length,
        config.min_term_length,
    )
    .with_context(|| format!("Failed to create tokenizer {}", config.tokenizer))?;
    for token in tokenizer.tokenize(text) {
        let skipped = if config.is_stopword(&token.base) {
            "\t(stopword)"
        } else {
            ""
        };
        println!(
            "{}\t{}\t{}\t{}{skipped}",
            token.offset, token.surface, token.base, token.feature
        );
    }
    Ok(())
}
