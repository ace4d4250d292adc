//! Document commands

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use sakubiki_text_index::{AddOutcome, DocumentId};
use serde::Serialize;

use crate::commands::open_index;

#[derive(Serialize)]
struct DocumentInfo {
    id: u32,
    name: String,
    size: usize,
}

/// Ingests `file` as the document `name`.
pub fn add(db: &Path, config: Option<&Path>, name: &str, file: &Path) -> Result<()> {
    let index = open_index(db, config)?;
    let outcome = index
        .add_document_file(name, file)
        .with_context(|| format!("Failed to add {}", file.display()))?;
    println!("{}", describe_outcome(name, &outcome));
    index.sync()?;
    Ok(())
}

/// Ingests each file as a document named by its path as given.
pub fn add_files(db: &Path, config: Option<&Path>, files: &[PathBuf]) -> Result<()> {
    let index = open_index(db, config)?;
    for file in files {
        let name = file.to_string_lossy();
        let outcome = index
            .add_document_file(&name, file)
            .with_context(|| format!("Failed to add {}", file.display()))?;
        println!("{}", describe_outcome(&name, &outcome));
    }
    index.sync()?;
    Ok(())
}

fn describe_outcome(name: &str, outcome: &AddOutcome) -> String {
    match outcome {
        AddOutcome::Added {
            id,
            occurrences,
            words,
        } => format!("{id}\t{name}\tadded {words} words, {occurrences} occurrences"),
        AddOutcome::Duplicate { id } => format!("{id}\t{name}\talready indexed"),
        AddOutcome::Collision { id, existing_name } => {
            format!("{id}\t{name}\tskipped, identifier taken by {existing_name}")
        }
    }
}

pub fn print(db: &Path, config: Option<&Path>, name: &str) -> Result<()> {
    let index = open_index(db, config)?;
    let view = index
        .view_document_by_name(name)
        .with_context(|| format!("Failed to read document {name}"))?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(view.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

pub fn list(db: &Path, config: Option<&Path>) -> Result<()> {
    let index = open_index(db, config)?;
    for entry in index.document_list()? {
        let (id, name) = entry?;
        println!("{id}\t{name}");
    }
    Ok(())
}

pub fn info(db: &Path, config: Option<&Path>, id: u32) -> Result<()> {
    let index = open_index(db, config)?;
    let id = DocumentId(id);
    let reader = index.reader()?;
    let info = DocumentInfo {
        id: id.0,
        name: reader
            .document_info(id)
            .with_context(|| format!("Failed to look up document {id}"))?
            .to_string(),
        size: reader.document_content(id)?.len(),
    };
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
