//! Stats command

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::{commands::open_index, utils::format_size};

#[derive(Serialize)]
struct StatsSummary {
    path: String,
    tokenizer: String,
    documents: usize,
    occurrences: usize,
    map_size: String,
    used: String,
}

pub fn run(db: &Path, config: Option<&Path>) -> Result<()> {
    let index = open_index(db, config)?;
    let stats = index.stats()?;
    let summary = StatsSummary {
        path: index.path().display().to_string(),
        tokenizer: index.config().tokenizer.clone(),
        documents: stats.documents,
        occurrences: stats.occurrences,
        map_size: format_size(stats.map_size as u64),
        used: format_size(stats.used_bytes as u64),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
