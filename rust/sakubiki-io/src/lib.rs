//! File access helpers for document ingestion.

pub mod mapped_file;

pub use mapped_file::MappedFile;
