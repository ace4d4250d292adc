use bitflags::bitflags;
use lmdb_sys as ffi;

bitflags! {
    /// Flags applied when the environment is opened.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EnvironmentFlags: u32 {
        /// The path names the data file itself rather than a directory.
        const NO_SUB_DIR = ffi::MDB_NOSUBDIR;
        /// Open the environment read-only.
        const READ_ONLY = ffi::MDB_RDONLY;
        /// Tie reader slots to transaction objects instead of threads.
        const NO_TLS = ffi::MDB_NOTLS;
        /// Skip the fsync after commit.
        const NO_SYNC = ffi::MDB_NOSYNC;
        /// Skip the fsync of the meta page after commit.
        const NO_META_SYNC = ffi::MDB_NOMETASYNC;
        /// Use a writable memory map.
        const WRITE_MAP = ffi::MDB_WRITEMAP;
        /// Disable OS readahead on the map.
        const NO_READAHEAD = ffi::MDB_NORDAHEAD;
    }
}

bitflags! {
    /// Behavior flags of a named table, fixed when the table is created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DatabaseFlags: u32 {
        /// Compare keys back to front.
        const REVERSE_KEY = ffi::MDB_REVERSEKEY;
        /// One key may hold many values, kept sorted.
        const DUP_SORT = ffi::MDB_DUPSORT;
        /// Keys are native unsigned integers.
        const INTEGER_KEY = ffi::MDB_INTEGERKEY;
        /// All duplicate values share one width; enables the `MULTIPLE` paths.
        const DUP_FIXED = ffi::MDB_DUPFIXED;
        /// Duplicate values are native unsigned integers.
        const INTEGER_DUP = ffi::MDB_INTEGERDUP;
        /// Compare duplicate values back to front.
        const REVERSE_DUP = ffi::MDB_REVERSEDUP;
    }
}

bitflags! {
    /// Per-call flags for puts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WriteFlags: u32 {
        /// Fail with key-exists if the key is already present.
        const NO_OVERWRITE = ffi::MDB_NOOVERWRITE;
        /// Fail with key-exists if the exact key/value pair is already present.
        const NO_DUP_DATA = ffi::MDB_NODUPDATA;
        /// Append at the end of the table; keys must arrive sorted.
        const APPEND = ffi::MDB_APPEND;
        /// Append at the end of a key's duplicates; values must arrive sorted.
        const APPEND_DUP = ffi::MDB_APPENDDUP;
    }
}

impl DatabaseFlags {
    /// `true` if the table keeps several values per key.
    pub fn is_dup_sort(&self) -> bool {
        self.contains(DatabaseFlags::DUP_SORT)
    }

    /// `true` if the table supports the bulk `MULTIPLE` read and write paths.
    pub fn supports_multiple(&self) -> bool {
        self.contains(DatabaseFlags::DUP_SORT | DatabaseFlags::DUP_FIXED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_requires_both_dup_flags() {
        assert!(!DatabaseFlags::empty().supports_multiple());
        assert!(!DatabaseFlags::DUP_SORT.supports_multiple());
        assert!((DatabaseFlags::DUP_SORT | DatabaseFlags::DUP_FIXED).supports_multiple());
        assert!(DatabaseFlags::DUP_SORT.is_dup_sort());
    }

    #[test]
    fn test_flag_bits_are_engine_bits() {
        assert_eq!(DatabaseFlags::DUP_SORT.bits(), 0x04);
        assert_eq!(DatabaseFlags::DUP_FIXED.bits(), 0x10);
        assert_eq!(WriteFlags::NO_OVERWRITE.bits(), 0x10);
    }
}
