use std::{ffi::CString, marker::PhantomData, ptr};

use libc::{c_int, c_uint};
use lmdb_sys as ffi;
use sakubiki_common::{Result, error::Error};

use crate::{
    cursor::{RoCursor, RwCursor},
    database::Database,
    environment::{Environment, Stat},
    error::{check, storage_error},
    flags::{DatabaseFlags, WriteFlags},
    val::{ValueView, empty_val, from_val, to_val},
};

/// Operations shared by read-only and read-write transactions.
///
/// Also implemented for `&T`, so iterators and views can either own their
/// transaction or borrow one that is shared with other readers.
pub trait Transaction: Sized {
    /// The raw transaction handle.
    fn txn(&self) -> *mut ffi::MDB_txn;

    /// Reads the value stored under `key`. A missing key is `Ok(None)`.
    ///
    /// For duplicate-sorted tables this returns the first duplicate.
    fn get<'txn>(&'txn self, db: Database, key: &[u8]) -> Result<Option<&'txn [u8]>> {
        let mut key_val = to_val(key);
        let mut data_val = empty_val();
        match unsafe { ffi::mdb_get(self.txn(), db.dbi(), &mut key_val, &mut data_val) } {
            ffi::MDB_SUCCESS => Ok(Some(unsafe { from_val(&data_val) })),
            ffi::MDB_NOTFOUND => Ok(None),
            code => Err(storage_error(code)),
        }
    }

    /// Opens an existing named table and reads back its flags.
    fn open_db(&self, name: Option<&str>) -> Result<Database> {
        open_dbi(self.txn(), name, 0)
    }

    /// Flags the table was created with, as recorded by the engine.
    fn db_flags(&self, db: Database) -> Result<DatabaseFlags> {
        let mut flags: c_uint = 0;
        check(unsafe { ffi::mdb_dbi_flags(self.txn(), db.dbi(), &mut flags) })?;
        Ok(DatabaseFlags::from_bits_truncate(flags))
    }

    fn db_stat(&self, db: Database) -> Result<Stat> {
        let mut stat = std::mem::MaybeUninit::<ffi::MDB_stat>::zeroed();
        check(unsafe { ffi::mdb_stat(self.txn(), db.dbi(), stat.as_mut_ptr()) })?;
        Ok(unsafe { stat.assume_init() }.into())
    }

    /// Opens a read cursor over `db` that borrows this transaction.
    fn open_ro_cursor(&self, db: Database) -> Result<RoCursor<'_>> {
        RoCursor::new(self.txn(), db)
    }
}

impl<T: Transaction> Transaction for &T {
    fn txn(&self) -> *mut ffi::MDB_txn {
        (**self).txn()
    }
}

fn open_dbi(txn: *mut ffi::MDB_txn, name: Option<&str>, flags: c_uint) -> Result<Database> {
    let c_name = name
        .map(CString::new)
        .transpose()
        .map_err(|_| Error::invalid_arg("name", "table name contains a NUL byte"))?;
    let name_ptr = c_name.as_ref().map_or(ptr::null(), |n| n.as_ptr());
    let mut dbi: ffi::MDB_dbi = 0;
    check(unsafe { ffi::mdb_dbi_open(txn, name_ptr, flags, &mut dbi) })?;

    let mut actual: c_uint = 0;
    check(unsafe { ffi::mdb_dbi_flags(txn, dbi, &mut actual) })?;
    Ok(Database::new(dbi, DatabaseFlags::from_bits_truncate(actual)))
}

fn begin(env: &Environment, flags: c_uint) -> Result<*mut ffi::MDB_txn> {
    let mut txn: *mut ffi::MDB_txn = ptr::null_mut();
    check(unsafe { ffi::mdb_txn_begin(env.env(), ptr::null_mut(), flags, &mut txn) })?;
    Ok(txn)
}

/// A read-only snapshot of the environment.
///
/// Readers never block each other or the writer. Dropping the transaction
/// releases its reader slot.
pub struct RoTransaction<'env> {
    txn: *mut ffi::MDB_txn,
    _env: PhantomData<&'env Environment>,
}

impl<'env> RoTransaction<'env> {
    pub(crate) fn new(env: &'env Environment) -> Result<RoTransaction<'env>> {
        Ok(RoTransaction {
            txn: begin(env, ffi::MDB_RDONLY)?,
            _env: PhantomData,
        })
    }

    /// Commits the transaction. For a reader this only matters when it opened
    /// tables: their handles become visible to the rest of the environment.
    pub fn commit(self) -> Result<()> {
        let txn = std::mem::ManuallyDrop::new(self).txn;
        check(unsafe { ffi::mdb_txn_commit(txn) })
    }

    /// Reads `key` and hands ownership of this snapshot to the returned view,
    /// so the value can be used without copying it.
    pub fn into_view(self, db: Database, key: &[u8]) -> Result<Option<ValueView<'env>>> {
        let mut key_val = to_val(key);
        let mut data_val = empty_val();
        match unsafe { ffi::mdb_get(self.txn, db.dbi(), &mut key_val, &mut data_val) } {
            ffi::MDB_SUCCESS => Ok(Some(unsafe { ValueView::new(self, data_val) })),
            ffi::MDB_NOTFOUND => Ok(None),
            code => Err(storage_error(code)),
        }
    }
}

impl Transaction for RoTransaction<'_> {
    fn txn(&self) -> *mut ffi::MDB_txn {
        self.txn
    }
}

impl Drop for RoTransaction<'_> {
    fn drop(&mut self) {
        unsafe { ffi::mdb_txn_abort(self.txn) }
    }
}

/// The single read-write transaction of an environment.
///
/// Dropping it aborts every change, unless auto-commit was requested with
/// [`RwTransaction::set_auto_commit`].
pub struct RwTransaction<'env> {
    txn: *mut ffi::MDB_txn,
    auto_commit: bool,
    _env: PhantomData<&'env Environment>,
}

impl<'env> RwTransaction<'env> {
    pub(crate) fn new(env: &'env Environment) -> Result<RwTransaction<'env>> {
        Ok(RwTransaction {
            txn: begin(env, 0)?,
            auto_commit: false,
            _env: PhantomData,
        })
    }

    /// When set, the transaction commits on drop instead of aborting.
    /// A failed commit in that path is logged, never raised.
    pub fn set_auto_commit(&mut self, auto_commit: bool) {
        self.auto_commit = auto_commit;
    }

    /// Opens the named table, creating it with `flags` if it does not exist.
    pub fn create_db(&self, name: Option<&str>, flags: DatabaseFlags) -> Result<Database> {
        let db = open_dbi(self.txn, name, flags.bits() | ffi::MDB_CREATE)?;
        log::debug!("opened table {:?} ({:?})", name.unwrap_or("<main>"), db.flags());
        Ok(db)
    }

    /// Stores `value` under `key`.
    ///
    /// With [`WriteFlags::NO_OVERWRITE`] an existing key is reported as the
    /// key-exists storage condition and nothing is written.
    pub fn put(&self, db: Database, key: &[u8], value: &[u8], flags: WriteFlags) -> Result<()> {
        let mut key_val = to_val(key);
        let mut data_val = to_val(value);
        check(unsafe {
            ffi::mdb_put(
                self.txn,
                db.dbi(),
                &mut key_val,
                &mut data_val,
                flags.bits() as c_uint,
            )
        })
    }

    /// Deletes `key`, or only the `(key, value)` duplicate when `value` is
    /// given. Returns `false` if nothing matched.
    pub fn del(&self, db: Database, key: &[u8], value: Option<&[u8]>) -> Result<bool> {
        let mut key_val = to_val(key);
        let mut data_val = value.map(to_val);
        let data_ptr = data_val
            .as_mut()
            .map_or(ptr::null_mut(), |v| v as *mut ffi::MDB_val);
        match unsafe { ffi::mdb_del(self.txn, db.dbi(), &mut key_val, data_ptr) } {
            ffi::MDB_SUCCESS => Ok(true),
            ffi::MDB_NOTFOUND => Ok(false),
            code => Err(storage_error(code)),
        }
    }

    /// Opens a write cursor over `db` that borrows this transaction.
    pub fn open_rw_cursor(&self, db: Database) -> Result<RwCursor<'_>> {
        RwCursor::new(self.txn, db)
    }

    /// Makes every change in the transaction durable and visible.
    pub fn commit(self) -> Result<()> {
        let txn = std::mem::ManuallyDrop::new(self).txn;
        check(unsafe { ffi::mdb_txn_commit(txn) })
    }

    /// Discards every change in the transaction.
    pub fn abort(self) {
        let txn = std::mem::ManuallyDrop::new(self).txn;
        unsafe { ffi::mdb_txn_abort(txn) }
    }
}

impl Transaction for RwTransaction<'_> {
    fn txn(&self) -> *mut ffi::MDB_txn {
        self.txn
    }
}

impl Drop for RwTransaction<'_> {
    fn drop(&mut self) {
        if self.auto_commit {
            let rc: c_int = unsafe { ffi::mdb_txn_commit(self.txn) };
            if let Err(e) = check(rc) {
                log::warn!("auto-commit on drop failed: {e}");
            }
        } else {
            unsafe { ffi::mdb_txn_abort(self.txn) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvironmentOptions;

    fn open_env(dir: &tempfile::TempDir) -> Environment {
        Environment::open(dir.path(), &EnvironmentOptions::default().with_map_size(1 << 24))
            .unwrap()
    }

    #[test]
    fn test_put_get_commit() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("t"), DatabaseFlags::empty()).unwrap();

        let txn = env.begin_rw_txn().unwrap();
        txn.put(db, b"k", b"v", WriteFlags::empty()).unwrap();
        assert_eq!(txn.get(db, b"k").unwrap(), Some(&b"v"[..]));
        txn.commit().unwrap();

        let txn = env.begin_ro_txn().unwrap();
        assert_eq!(txn.get(db, b"k").unwrap(), Some(&b"v"[..]));
        assert_eq!(txn.get(db, b"missing").unwrap(), None);
    }

    #[test]
    fn test_drop_aborts() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("t"), DatabaseFlags::empty()).unwrap();
        {
            let txn = env.begin_rw_txn().unwrap();
            txn.put(db, b"k", b"v", WriteFlags::empty()).unwrap();
        }
        {
            let txn = env.begin_rw_txn().unwrap();
            txn.put(db, b"k2", b"v", WriteFlags::empty()).unwrap();
            txn.abort();
        }
        let txn = env.begin_ro_txn().unwrap();
        assert_eq!(txn.get(db, b"k").unwrap(), None);
        assert_eq!(txn.get(db, b"k2").unwrap(), None);
    }

    #[test]
    fn test_auto_commit_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("t"), DatabaseFlags::empty()).unwrap();
        {
            let mut txn = env.begin_rw_txn().unwrap();
            txn.set_auto_commit(true);
            txn.put(db, b"k", b"v", WriteFlags::empty()).unwrap();
        }
        let txn = env.begin_ro_txn().unwrap();
        assert_eq!(txn.get(db, b"k").unwrap(), Some(&b"v"[..]));
    }

    #[test]
    fn test_no_overwrite_reports_key_exists() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("t"), DatabaseFlags::empty()).unwrap();
        let txn = env.begin_rw_txn().unwrap();
        txn.put(db, b"k", b"first", WriteFlags::NO_OVERWRITE).unwrap();
        let err = txn
            .put(db, b"k", b"second", WriteFlags::NO_OVERWRITE)
            .unwrap_err();
        assert!(err.is_key_exists());
        assert_eq!(txn.get(db, b"k").unwrap(), Some(&b"first"[..]));
    }

    #[test]
    fn test_del() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env
            .create_db(Some("d"), DatabaseFlags::DUP_SORT)
            .unwrap();
        let txn = env.begin_rw_txn().unwrap();
        txn.put(db, b"k", b"a", WriteFlags::empty()).unwrap();
        txn.put(db, b"k", b"b", WriteFlags::empty()).unwrap();
        assert!(txn.del(db, b"k", Some(b"a")).unwrap());
        assert_eq!(txn.get(db, b"k").unwrap(), Some(&b"b"[..]));
        assert!(txn.del(db, b"k", None).unwrap());
        assert!(!txn.del(db, b"k", None).unwrap());
    }

    #[test]
    fn test_open_db_reads_flags() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let created = env
            .create_db(Some("w"), DatabaseFlags::DUP_SORT | DatabaseFlags::DUP_FIXED)
            .unwrap();
        let opened = env.open_db(Some("w")).unwrap();
        assert_eq!(created.dbi(), opened.dbi());
        assert!(opened.flags().supports_multiple());

        let err = env.open_db(Some("absent")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_view_of_binary_value_is_not_text() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("t"), DatabaseFlags::empty()).unwrap();
        env.write(|txn| txn.put(db, b"k", b"ol\xe9", WriteFlags::empty()))
            .unwrap();

        let txn = env.begin_ro_txn().unwrap();
        let view = txn.into_view(db, b"k").unwrap().unwrap();
        assert_eq!(view.as_bytes(), b"ol\xe9");
        let err = view.to_str().unwrap_err();
        match err.kind() {
            sakubiki_common::error::ErrorKind::InvalidFormat { element, .. } => {
                assert_eq!(element, "value")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_into_view_outlives_writer() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("t"), DatabaseFlags::empty()).unwrap();
        env.write(|txn| txn.put(db, b"k", b"old", WriteFlags::empty()))
            .unwrap();

        let view = env
            .begin_ro_txn()
            .unwrap()
            .into_view(db, b"k")
            .unwrap()
            .unwrap();
        env.write(|txn| txn.put(db, b"k", b"new", WriteFlags::empty()))
            .unwrap();
        assert_eq!(view.as_bytes(), b"old");
        assert_eq!(view.to_str().unwrap(), "old");

        let missing = env.begin_ro_txn().unwrap().into_view(db, b"x").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_concurrent_readers_same_thread() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("t"), DatabaseFlags::empty()).unwrap();
        let r1 = env.begin_ro_txn().unwrap();
        let r2 = env.begin_ro_txn().unwrap();
        assert_eq!(r1.get(db, b"k").unwrap(), None);
        assert_eq!(r2.get(db, b"k").unwrap(), None);
    }
}
