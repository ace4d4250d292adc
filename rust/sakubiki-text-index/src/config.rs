use std::{collections::BTreeSet, path::Path};

use serde::{Deserialize, Serialize};
use sakubiki_common::{Result, error::Error};
use sakubiki_store::DEFAULT_MAP_SIZE;

use crate::tokenizers::{DEFAULT_MAX_TERM_LENGTH, DEFAULT_MIN_TERM_LENGTH};

/// Base forms skipped during ingestion unless the configuration says otherwise.
pub const DEFAULT_STOPWORDS: [&str; 4] = ["。", "？", "?", "、"];

/// Settings of a full-text index.
///
/// The tokenizer settings are not persisted with the index: reopening an
/// index with a different tokenizer is allowed, but words ingested before and
/// after will not share keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Name of the tokenizer, as accepted by
    /// [`create_tokenizer`](crate::tokenizers::create_tokenizer).
    pub tokenizer: String,
    /// Base forms that are never indexed.
    pub stopwords: BTreeSet<String>,
    /// Ceiling of the storage map in bytes.
    pub map_size: usize,
    pub max_term_length: usize,
    pub min_term_length: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            tokenizer: "unicode-word".to_string(),
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            map_size: DEFAULT_MAP_SIZE,
            max_term_length: DEFAULT_MAX_TERM_LENGTH,
            min_term_length: DEFAULT_MIN_TERM_LENGTH,
        }
    }
}

impl IndexConfig {
    /// Loads a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<IndexConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<IndexConfig> {
        serde_json::from_str(text).map_err(|e| Error::invalid_arg("config", e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::invalid_arg("config", e.to_string()))
    }

    pub fn with_tokenizer(mut self, name: impl Into<String>) -> Self {
        self.tokenizer = name.into();
        self
    }

    pub fn with_stopwords<I, S>(mut self, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = stopwords.into_iter().map(Into::into).collect();
        self
    }

    /// Indexes every token, including the default stopwords.
    pub fn without_stopwords(mut self) -> Self {
        self.stopwords.clear();
        self
    }

    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }

    pub fn with_term_lengths(mut self, max_term_length: usize, min_term_length: usize) -> Self {
        self.max_term_length = max_term_length;
        self.min_term_length = min_term_length;
        self
    }

    pub fn is_stopword(&self, base: &str) -> bool {
        self.stopwords.contains(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.tokenizer, "unicode-word");
        assert!(config.is_stopword("。"));
        assert!(config.is_stopword("?"));
        assert!(!config.is_stopword("word"));
        assert!(!config.without_stopwords().is_stopword("。"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = IndexConfig::from_json(r#"{ "tokenizer": "unicode-segment" }"#).unwrap();
        assert_eq!(config.tokenizer, "unicode-segment");
        assert_eq!(config.stopwords.len(), DEFAULT_STOPWORDS.len());
        assert_eq!(config.max_term_length, DEFAULT_MAX_TERM_LENGTH);

        let config = IndexConfig::from_json(r#"{ "stopwords": ["the", "a"] }"#).unwrap();
        assert!(config.is_stopword("the"));
        assert!(!config.is_stopword("。"));
    }

    #[test]
    fn test_json_round_trip_and_rejects_unknown() {
        let config = IndexConfig::default()
            .with_tokenizer("trivial")
            .with_map_size(1 << 30);
        let text = config.to_json().unwrap();
        assert_eq!(IndexConfig::from_json(&text).unwrap(), config);

        assert!(IndexConfig::from_json(r#"{ "tokeniser": "x" }"#).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, r#"{ "min_term_length": 2 }"#).unwrap();
        assert_eq!(IndexConfig::from_json_file(&path).unwrap().min_term_length, 2);
        assert!(IndexConfig::from_json_file(dir.path().join("absent.json")).is_err());
    }
}
