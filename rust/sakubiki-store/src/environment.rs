//! The storage environment: one memory-mapped database directory and the
//! named tables inside it.

use std::{
    ffi::CString,
    path::{Path, PathBuf},
    ptr,
};

use libc::{c_int, c_uint};
use lmdb_sys as ffi;
use sakubiki_common::{Result, error::Error};

use crate::{
    database::Database,
    error::{check, strerror},
    flags::{DatabaseFlags, EnvironmentFlags},
    transaction::{RoTransaction, RwTransaction, Transaction},
};

/// Upper bound on the size of the memory map, chosen large enough that an
/// index never has to be resized after creation.
#[cfg(target_pointer_width = "64")]
pub const DEFAULT_MAP_SIZE: usize = 1 << 40; // 1 TiB
#[cfg(not(target_pointer_width = "64"))]
pub const DEFAULT_MAP_SIZE: usize = 1 << 30; // 1 GiB

/// Longest key the engine accepts in its default build. Values of a
/// `DUP_SORT` table are bounded by the same limit.
pub const MAX_KEY_SIZE: usize = 511;

/// Options recognized when an environment is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentOptions {
    /// Maximum number of named tables that may be opened.
    pub max_dbs: u32,
    /// Maximum size of the memory map (and therefore of the data file).
    pub map_size: usize,
    /// Maximum number of concurrent read transactions, engine default if `None`.
    pub max_readers: Option<u32>,
    /// Unix permissions for newly created files.
    pub mode: u32,
    pub flags: EnvironmentFlags,
}

impl Default for EnvironmentOptions {
    fn default() -> Self {
        EnvironmentOptions {
            max_dbs: 3,
            map_size: DEFAULT_MAP_SIZE,
            max_readers: None,
            mode: 0o644,
            flags: EnvironmentFlags::NO_TLS,
        }
    }
}

impl EnvironmentOptions {
    pub fn with_max_dbs(mut self, max_dbs: u32) -> Self {
        self.max_dbs = max_dbs;
        self
    }

    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }

    pub fn with_max_readers(mut self, max_readers: u32) -> Self {
        self.max_readers = Some(max_readers);
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_flags(mut self, flags: EnvironmentFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// Page and entry statistics of a table or of the whole environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stat {
    pub page_size: u32,
    pub depth: u32,
    pub branch_pages: usize,
    pub leaf_pages: usize,
    pub overflow_pages: usize,
    /// Number of data items; for duplicate-sorted tables this counts every
    /// duplicate value, not just distinct keys.
    pub entries: usize,
}

impl From<ffi::MDB_stat> for Stat {
    fn from(s: ffi::MDB_stat) -> Self {
        Stat {
            page_size: s.ms_psize as u32,
            depth: s.ms_depth as u32,
            branch_pages: s.ms_branch_pages,
            leaf_pages: s.ms_leaf_pages,
            overflow_pages: s.ms_overflow_pages,
            entries: s.ms_entries,
        }
    }
}

/// Runtime information about an open environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvInfo {
    pub map_size: usize,
    pub last_page: usize,
    pub last_txn_id: usize,
    pub max_readers: u32,
    pub num_readers: u32,
}

/// An open storage environment.
///
/// The environment owns the memory map and every table in it. Transactions
/// borrow the environment, so it cannot be closed while any of them is alive.
/// It may be shared between threads; each transaction stays on the thread
/// that created it.
pub struct Environment {
    env: *mut ffi::MDB_env,
    path: PathBuf,
}

// The engine serializes access to the environment handle internally.
unsafe impl Send for Environment {}
unsafe impl Sync for Environment {}

impl Environment {
    /// Opens the environment at `path`, creating the directory (or, with
    /// [`EnvironmentFlags::NO_SUB_DIR`], the data file) if it does not exist.
    ///
    /// # Errors
    ///
    /// Any failure, from directory creation to the engine rejecting an
    /// existing incompatible file, is reported as
    /// [`sakubiki_common::error::ErrorKind::StorageOpen`].
    pub fn open(path: impl AsRef<Path>, options: &EnvironmentOptions) -> Result<Environment> {
        let path = path.as_ref();
        let open_error = |code: c_int| Error::storage_open(path, code, strerror(code));

        if !options.flags.contains(EnvironmentFlags::NO_SUB_DIR) {
            std::fs::create_dir_all(path).map_err(|e| {
                Error::storage_open(path, e.raw_os_error().unwrap_or(-1), e.to_string())
            })?;
        }
        let c_path = path
            .to_str()
            .and_then(|s| CString::new(s).ok())
            .ok_or_else(|| Error::invalid_arg("path", format!("{}", path.display())))?;

        let mut env: *mut ffi::MDB_env = ptr::null_mut();
        let rc = unsafe { ffi::mdb_env_create(&mut env) };
        if rc != 0 {
            return Err(open_error(rc));
        }
        // From here on the handle is closed by Drop on every exit path.
        let environment = Environment {
            env,
            path: path.to_path_buf(),
        };

        let rc = unsafe { ffi::mdb_env_set_maxdbs(env, options.max_dbs as ffi::MDB_dbi) };
        if rc != 0 {
            return Err(open_error(rc));
        }
        let rc = unsafe { ffi::mdb_env_set_mapsize(env, options.map_size) };
        if rc != 0 {
            return Err(open_error(rc));
        }
        if let Some(max_readers) = options.max_readers {
            let rc = unsafe { ffi::mdb_env_set_maxreaders(env, max_readers as c_uint) };
            if rc != 0 {
                return Err(open_error(rc));
            }
        }
        let rc = unsafe {
            ffi::mdb_env_open(
                env,
                c_path.as_ptr(),
                options.flags.bits() as c_uint,
                options.mode as _,
            )
        };
        if rc != 0 {
            return Err(open_error(rc));
        }

        log::debug!(
            "opened environment at {} (map size {}, max dbs {})",
            path.display(),
            options.map_size,
            options.max_dbs
        );
        Ok(environment)
    }

    /// Path the environment was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Begins a read-only transaction over a snapshot of the current state.
    /// Never blocks.
    pub fn begin_ro_txn(&self) -> Result<RoTransaction<'_>> {
        RoTransaction::new(self)
    }

    /// Begins the read-write transaction. Blocks while another write
    /// transaction is active in this environment.
    pub fn begin_rw_txn(&self) -> Result<RwTransaction<'_>> {
        RwTransaction::new(self)
    }

    /// Runs `f` inside a write transaction, committing if it returns `Ok` and
    /// aborting otherwise.
    pub fn write<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&RwTransaction<'_>) -> Result<R>,
    {
        let txn = self.begin_rw_txn()?;
        let result = f(&txn)?;
        txn.commit()?;
        Ok(result)
    }

    /// Opens (creating it if needed) the table `name` with the given flags.
    ///
    /// Intended to be called once per table when the environment is set up;
    /// the returned handle is then reused for the environment's lifetime.
    pub fn create_db(&self, name: Option<&str>, flags: DatabaseFlags) -> Result<Database> {
        self.write(|txn| txn.create_db(name, flags))
    }

    /// Opens an existing table, reading back the flags it was created with.
    pub fn open_db(&self, name: Option<&str>) -> Result<Database> {
        let txn = self.begin_ro_txn()?;
        let db = txn.open_db(name)?;
        // The handle only outlives the transaction if it is committed.
        txn.commit()?;
        Ok(db)
    }

    /// Flushes buffers to disk. With `force`, flushes even when the
    /// environment was opened with [`EnvironmentFlags::NO_SYNC`].
    pub fn sync(&self, force: bool) -> Result<()> {
        check(unsafe { ffi::mdb_env_sync(self.env, force as c_int) })
    }

    /// Statistics of the environment's main table.
    pub fn stat(&self) -> Result<Stat> {
        let mut stat = std::mem::MaybeUninit::<ffi::MDB_stat>::zeroed();
        check(unsafe { ffi::mdb_env_stat(self.env, stat.as_mut_ptr()) })?;
        Ok(unsafe { stat.assume_init() }.into())
    }

    pub fn info(&self) -> Result<EnvInfo> {
        let mut info = std::mem::MaybeUninit::<ffi::MDB_envinfo>::zeroed();
        check(unsafe { ffi::mdb_env_info(self.env, info.as_mut_ptr()) })?;
        let info = unsafe { info.assume_init() };
        Ok(EnvInfo {
            map_size: info.me_mapsize,
            last_page: info.me_last_pgno,
            last_txn_id: info.me_last_txnid,
            max_readers: info.me_maxreaders as u32,
            num_readers: info.me_numreaders as u32,
        })
    }

    /// Longest key this environment accepts, as reported by the engine.
    pub fn max_key_size(&self) -> usize {
        let size = unsafe { ffi::mdb_env_get_maxkeysize(self.env) };
        usize::try_from(size).unwrap_or(0)
    }

    /// Statistics of one table, read under a fresh snapshot.
    pub fn db_stat(&self, db: Database) -> Result<Stat> {
        self.begin_ro_txn()?.db_stat(db)
    }

    pub(crate) fn env(&self) -> *mut ffi::MDB_env {
        self.env
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        unsafe { ffi::mdb_env_close(self.env) }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::WriteFlags;

    fn small_options() -> EnvironmentOptions {
        EnvironmentOptions::default().with_map_size(1 << 24)
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("env");
        let env = Environment::open(&path, &small_options()).unwrap();
        assert!(path.is_dir());
        assert_eq!(env.path(), path.as_path());
        assert_eq!(env.info().unwrap().map_size, 1 << 24);
    }

    #[test]
    fn test_open_incompatible_path_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("plain-file");
        std::fs::write(&file, b"not a database directory").unwrap();
        let err = Environment::open(&file, &small_options()).unwrap_err();
        assert!(matches!(
            err.kind(),
            sakubiki_common::error::ErrorKind::StorageOpen { .. }
        ));
    }

    #[test]
    fn test_defaults() {
        let options = EnvironmentOptions::default();
        assert_eq!(options.max_dbs, 3);
        assert_eq!(options.map_size, DEFAULT_MAP_SIZE);
        assert!(options.flags.contains(EnvironmentFlags::NO_TLS));
    }

    #[test]
    fn test_table_slots_exhausted() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = Environment::open(dir.path(), &small_options().with_max_dbs(1)).unwrap();
        env.create_db(Some("one"), DatabaseFlags::empty()).unwrap();
        let err = env
            .create_db(Some("two"), DatabaseFlags::empty())
            .unwrap_err();
        assert_eq!(
            err.storage_condition(),
            Some(sakubiki_common::error::StorageCondition::DbsFull)
        );
    }

    #[test]
    fn test_key_size_limit() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = Environment::open(dir.path(), &small_options()).unwrap();
        assert_eq!(env.max_key_size(), MAX_KEY_SIZE);

        let db = env.create_db(Some("keys"), DatabaseFlags::empty()).unwrap();
        let txn = env.begin_rw_txn().unwrap();
        txn.put(db, &[b'k'; MAX_KEY_SIZE], b"v", WriteFlags::empty()).unwrap();
        let err = txn
            .put(db, &[b'k'; MAX_KEY_SIZE + 1], b"v", WriteFlags::empty())
            .unwrap_err();
        assert_eq!(
            err.storage_condition(),
            Some(sakubiki_common::error::StorageCondition::ResourceExhausted)
        );
    }
}
