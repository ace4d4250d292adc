//! Mapping of engine return codes onto the shared storage taxonomy.

use std::ffi::CStr;

use libc::c_int;
use lmdb_sys as ffi;
use sakubiki_common::{
    Result,
    error::{Error, StorageCondition},
};

/// Converts an engine return code into `Ok(())` or exactly one storage error.
#[inline]
pub fn check(code: c_int) -> Result<()> {
    if code == ffi::MDB_SUCCESS {
        Ok(())
    } else {
        Err(storage_error(code))
    }
}

#[cold]
pub(crate) fn storage_error(code: c_int) -> Error {
    Error::storage(condition_for_code(code), code, strerror(code))
}

/// Classifies a non-zero engine return code.
pub fn condition_for_code(code: c_int) -> StorageCondition {
    match code {
        ffi::MDB_KEYEXIST => StorageCondition::KeyExists,
        ffi::MDB_NOTFOUND => StorageCondition::NotFound,
        ffi::MDB_PAGE_NOTFOUND | ffi::MDB_CORRUPTED | ffi::MDB_PANIC => {
            StorageCondition::Corrupted
        }
        ffi::MDB_MAP_FULL => StorageCondition::MapFull,
        ffi::MDB_DBS_FULL => StorageCondition::DbsFull,
        ffi::MDB_READERS_FULL => StorageCondition::ReadersFull,
        ffi::MDB_VERSION_MISMATCH => StorageCondition::VersionMismatch,
        ffi::MDB_INVALID
        | ffi::MDB_INCOMPATIBLE
        | ffi::MDB_BAD_RSLOT
        | ffi::MDB_BAD_TXN
        | ffi::MDB_BAD_DBI => StorageCondition::InvalidHandle,
        ffi::MDB_TLS_FULL
        | ffi::MDB_TXN_FULL
        | ffi::MDB_CURSOR_FULL
        | ffi::MDB_PAGE_FULL
        | ffi::MDB_MAP_RESIZED
        | ffi::MDB_BAD_VALSIZE => StorageCondition::ResourceExhausted,
        _ => StorageCondition::Other,
    }
}

/// Human-readable message for an engine or `errno` code.
pub fn strerror(code: c_int) -> String {
    // mdb_strerror returns a pointer to a static string (or strerror's buffer
    // for positive codes), never null.
    let msg = unsafe { CStr::from_ptr(ffi::mdb_strerror(code)) };
    msg.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_success() {
        assert!(check(0).is_ok());
    }

    #[test]
    fn test_expected_conditions() {
        let err = check(ffi::MDB_NOTFOUND).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.storage_condition(), Some(StorageCondition::NotFound));

        let err = check(ffi::MDB_KEYEXIST).unwrap_err();
        assert!(err.is_key_exists());
    }

    #[test]
    fn test_fatal_conditions() {
        assert_eq!(
            condition_for_code(ffi::MDB_MAP_FULL),
            StorageCondition::MapFull
        );
        assert_eq!(
            condition_for_code(ffi::MDB_CORRUPTED),
            StorageCondition::Corrupted
        );
        assert_eq!(
            condition_for_code(ffi::MDB_PANIC),
            StorageCondition::Corrupted
        );
        assert_eq!(
            condition_for_code(ffi::MDB_DBS_FULL),
            StorageCondition::DbsFull
        );
        assert_eq!(
            condition_for_code(ffi::MDB_READERS_FULL),
            StorageCondition::ReadersFull
        );
        assert_eq!(
            condition_for_code(ffi::MDB_VERSION_MISMATCH),
            StorageCondition::VersionMismatch
        );
        assert_eq!(
            condition_for_code(ffi::MDB_BAD_DBI),
            StorageCondition::InvalidHandle
        );
        assert_eq!(
            condition_for_code(ffi::MDB_TXN_FULL),
            StorageCondition::ResourceExhausted
        );
        assert_eq!(condition_for_code(libc::EACCES), StorageCondition::Other);
    }

    #[test]
    fn test_error_keeps_code_and_message() {
        let err = check(ffi::MDB_MAP_FULL).unwrap_err();
        match err.kind() {
            sakubiki_common::error::ErrorKind::Storage { code, message, .. } => {
                assert_eq!(*code, ffi::MDB_MAP_FULL);
                assert!(message.contains("MDB_MAP_FULL"));
            }
            other => panic!("unexpected error kind: {other}"),
        }
    }
}
