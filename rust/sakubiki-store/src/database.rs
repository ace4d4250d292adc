use lmdb_sys as ffi;

use crate::flags::DatabaseFlags;

/// Handle to a named table inside an [`crate::Environment`].
///
/// Handles are plain values: open a table once (see
/// [`crate::RwTransaction::create_db`] and [`crate::Environment::open_db`]) and
/// copy the handle into every transaction that needs it. The handle stays
/// valid for the lifetime of the environment and is never closed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Database {
    dbi: ffi::MDB_dbi,
    flags: DatabaseFlags,
}

impl Database {
    pub(crate) fn new(dbi: ffi::MDB_dbi, flags: DatabaseFlags) -> Database {
        Database { dbi, flags }
    }

    /// The engine's table slot.
    pub fn dbi(&self) -> ffi::MDB_dbi {
        self.dbi
    }

    /// Behavior flags recorded when the table was opened.
    pub fn flags(&self) -> DatabaseFlags {
        self.flags
    }
}
