//! Temporary directories for test indexes.

use std::path::PathBuf;

/// A temporary directory with the path of an index inside it. The directory
/// and everything in it is removed when the value is dropped.
pub struct TempIndexDir {
    dir: tempfile::TempDir,
    path: PathBuf,
}

impl TempIndexDir {
    /// Path of the index directory. It does not exist until the index is
    /// opened.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// The enclosing temporary directory, for placing other files next to
    /// the index.
    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }
}

/// Creates a fresh temporary directory and returns the index path inside it.
pub fn temp_index_dir() -> anyhow::Result<TempIndexDir> {
    let dir = tempfile::Builder::new().prefix("sakubiki-").tempdir()?;
    let path = dir.path().join("index.mdb");
    Ok(TempIndexDir { dir, path })
}
