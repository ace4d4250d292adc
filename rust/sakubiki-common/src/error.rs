use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(name: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: Default::default(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn storage(condition: StorageCondition, code: i32, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Storage {
                condition,
                code,
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn storage_open(path: impl Into<PathBuf>, code: i32, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::StorageOpen {
                path: path.into(),
                code,
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn not_found(element: impl Into<String>) -> Error {
        Error(
            ErrorKind::NotFound {
                element: element.into(),
            }
            .into(),
        )
    }

    pub fn tokenizer_init(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::TokenizerInit {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// Returns the engine condition if this error originated in the storage engine.
    pub fn storage_condition(&self) -> Option<StorageCondition> {
        match self.kind() {
            ErrorKind::Storage { condition, .. } => Some(*condition),
            _ => None,
        }
    }

    /// `true` for both an engine-level "not found" and a failed single-key lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound { .. }
                | ErrorKind::Storage {
                    condition: StorageCondition::NotFound,
                    ..
                }
        )
    }

    pub fn is_key_exists(&self) -> bool {
        self.storage_condition() == Some(StorageCondition::KeyExists)
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("IO error for '{context}': {source}'")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("storage error ({condition}, code {code}): {message}")]
    Storage {
        condition: StorageCondition,
        code: i32,
        message: String,
    },

    #[error("failed to open storage at '{}' (code {code}): {message}", path.display())]
    StorageOpen {
        path: PathBuf,
        code: i32,
        message: String,
    },

    #[error("'{element}' not found")]
    NotFound { element: String },

    #[error("failed to initialize tokenizer '{name}': {message}")]
    TokenizerInit { name: String, message: String },
}

/// The closed set of conditions the storage engine can report.
///
/// Every engine return code maps onto exactly one of these; the raw code is kept
/// alongside it in [`ErrorKind::Storage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageCondition {
    /// The key (or key/value pair) is already present.
    KeyExists,
    /// The key is absent or a cursor ran past the last item.
    NotFound,
    /// The data file is corrupted, a page is missing or the environment panicked.
    Corrupted,
    /// The environment reached its maximum map size.
    MapFull,
    /// No more named tables can be opened.
    DbsFull,
    /// The reader lock table is full.
    ReadersFull,
    /// The data file was written by an incompatible engine version.
    VersionMismatch,
    /// A handle (table, transaction, reader slot) or a file is not valid for the call.
    InvalidHandle,
    /// A per-transaction or per-page resource limit was exceeded.
    ResourceExhausted,
    /// Any code outside the engine's own range, typically an `errno`.
    Other,
}

impl StorageCondition {
    /// Conditions callers treat as control flow rather than failures.
    pub fn is_expected(&self) -> bool {
        matches!(self, StorageCondition::KeyExists | StorageCondition::NotFound)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            StorageCondition::KeyExists => "key-exists",
            StorageCondition::NotFound => "not-found",
            StorageCondition::Corrupted => "corrupted",
            StorageCondition::MapFull => "map-full",
            StorageCondition::DbsFull => "dbs-full",
            StorageCondition::ReadersFull => "readers-full",
            StorageCondition::VersionMismatch => "version-mismatch",
            StorageCondition::InvalidHandle => "invalid-handle",
            StorageCondition::ResourceExhausted => "resource-exhausted",
            StorageCondition::Other => "other",
        }
    }
}

impl std::fmt::Display for StorageCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
