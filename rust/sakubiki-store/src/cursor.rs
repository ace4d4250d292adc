use std::{marker::PhantomData, ptr};

use bytemuck::Pod;
use libc::size_t;
use lmdb_sys as ffi;
use sakubiki_common::{Result, verify_arg};

use crate::{
    database::Database,
    error::{check, storage_error},
    flags::WriteFlags,
    val::{empty_val, from_val, to_val},
};

/// Cursor positioning operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorOp {
    /// First key/value item.
    First,
    /// First duplicate of the current key.
    FirstDup,
    /// Exact key and value.
    GetBoth,
    /// Exact key, nearest value at or after the given one.
    GetBothRange,
    /// Item at the current position.
    GetCurrent,
    /// Up to a page of duplicates from the current position (`DUP_FIXED` only).
    GetMultiple,
    Last,
    LastDup,
    Next,
    NextDup,
    /// Next page of duplicates of the current key (`DUP_FIXED` only).
    NextMultiple,
    /// First duplicate of the next distinct key.
    NextNoDup,
    Prev,
    PrevDup,
    PrevNoDup,
    /// Position at the key, returning its first value.
    Set,
    /// Position at the key, returning the key and its first value.
    SetKey,
    /// Position at the first key at or after the given one.
    SetRange,
}

impl CursorOp {
    pub fn to_raw(self) -> ffi::MDB_cursor_op {
        match self {
            CursorOp::First => ffi::MDB_FIRST,
            CursorOp::FirstDup => ffi::MDB_FIRST_DUP,
            CursorOp::GetBoth => ffi::MDB_GET_BOTH,
            CursorOp::GetBothRange => ffi::MDB_GET_BOTH_RANGE,
            CursorOp::GetCurrent => ffi::MDB_GET_CURRENT,
            CursorOp::GetMultiple => ffi::MDB_GET_MULTIPLE,
            CursorOp::Last => ffi::MDB_LAST,
            CursorOp::LastDup => ffi::MDB_LAST_DUP,
            CursorOp::Next => ffi::MDB_NEXT,
            CursorOp::NextDup => ffi::MDB_NEXT_DUP,
            CursorOp::NextMultiple => ffi::MDB_NEXT_MULTIPLE,
            CursorOp::NextNoDup => ffi::MDB_NEXT_NODUP,
            CursorOp::Prev => ffi::MDB_PREV,
            CursorOp::PrevDup => ffi::MDB_PREV_DUP,
            CursorOp::PrevNoDup => ffi::MDB_PREV_NODUP,
            CursorOp::Set => ffi::MDB_SET,
            CursorOp::SetKey => ffi::MDB_SET_KEY,
            CursorOp::SetRange => ffi::MDB_SET_RANGE,
        }
    }
}

/// Owns an engine cursor and closes it on drop.
///
/// Carries no lifetime: whoever holds it must also keep the transaction the
/// cursor was opened in alive, and drop the cursor first.
pub(crate) struct RawCursor {
    cursor: *mut ffi::MDB_cursor,
    db: Database,
}

impl RawCursor {
    pub(crate) fn open(txn: *mut ffi::MDB_txn, db: Database) -> Result<RawCursor> {
        let mut cursor: *mut ffi::MDB_cursor = ptr::null_mut();
        check(unsafe { ffi::mdb_cursor_open(txn, db.dbi(), &mut cursor) })?;
        Ok(RawCursor { cursor, db })
    }

    pub(crate) fn db(&self) -> Database {
        self.db
    }

    pub(crate) fn get_raw(
        &self,
        key: &mut ffi::MDB_val,
        data: &mut ffi::MDB_val,
        op: CursorOp,
    ) -> Result<bool> {
        cursor_get(self.cursor, key, data, op)
    }
}

impl Drop for RawCursor {
    fn drop(&mut self) {
        unsafe { ffi::mdb_cursor_close(self.cursor) }
    }
}

/// Runs one positioning operation. `Ok(false)` is the not-found sentinel:
/// an absent key, or a walk that ran past its last item.
fn cursor_get(
    cursor: *mut ffi::MDB_cursor,
    key: &mut ffi::MDB_val,
    data: &mut ffi::MDB_val,
    op: CursorOp,
) -> Result<bool> {
    match unsafe { ffi::mdb_cursor_get(cursor, key, data, op.to_raw()) } {
        ffi::MDB_SUCCESS => Ok(true),
        ffi::MDB_NOTFOUND => Ok(false),
        code => Err(storage_error(code)),
    }
}

/// Positioning and reading, shared by read-only and read-write cursors.
///
/// Every method that may not find an item returns `Ok(None)` in that case;
/// errors are reserved for engine faults.
pub trait Cursor<'txn> {
    /// The raw cursor handle.
    fn cursor(&self) -> *mut ffi::MDB_cursor;

    /// The table this cursor walks.
    fn db(&self) -> Database;

    /// Runs `op`, seeding the key (and value, for the `GET_BOTH` family)
    /// from the arguments. Returns the key and value at the new position.
    fn get(
        &self,
        key: Option<&[u8]>,
        data: Option<&[u8]>,
        op: CursorOp,
    ) -> Result<Option<(&'txn [u8], &'txn [u8])>> {
        let mut key_val = key.map_or_else(empty_val, to_val);
        let mut data_val = data.map_or_else(empty_val, to_val);
        if !cursor_get(self.cursor(), &mut key_val, &mut data_val, op)? {
            return Ok(None);
        }
        // Results point into the memory map, valid while the transaction is.
        Ok(Some(unsafe { (from_val(&key_val), from_val(&data_val)) }))
    }

    /// Positions at `key`, returning its first value.
    fn set(&self, key: &[u8]) -> Result<Option<&'txn [u8]>> {
        Ok(self.get(Some(key), None, CursorOp::Set)?.map(|(_, v)| v))
    }

    fn first(&self) -> Result<Option<(&'txn [u8], &'txn [u8])>> {
        self.get(None, None, CursorOp::First)
    }

    fn next(&self) -> Result<Option<(&'txn [u8], &'txn [u8])>> {
        self.get(None, None, CursorOp::Next)
    }

    /// Skips the remaining duplicates of the current key.
    fn next_nodup(&self) -> Result<Option<(&'txn [u8], &'txn [u8])>> {
        self.get(None, None, CursorOp::NextNoDup)
    }

    fn last_dup(&self) -> Result<Option<(&'txn [u8], &'txn [u8])>> {
        self.get(None, None, CursorOp::LastDup)
    }

    fn current(&self) -> Result<Option<(&'txn [u8], &'txn [u8])>> {
        self.get(None, None, CursorOp::GetCurrent)
    }

    /// Returns the page of duplicates starting at the current position.
    ///
    /// Keys holding a single value yield a one-record page. Only valid on
    /// `DUP_SORT | DUP_FIXED` tables.
    fn get_multiple(&self) -> Result<Option<&'txn [u8]>> {
        let mut key_val = empty_val();
        let mut data_val = empty_val();
        if !cursor_get(self.cursor(), &mut key_val, &mut data_val, CursorOp::GetCurrent)? {
            return Ok(None);
        }
        // The engine leaves `data_val` untouched when the key has no
        // duplicate subtree, so it still holds the current single value.
        if !cursor_get(self.cursor(), &mut key_val, &mut data_val, CursorOp::GetMultiple)? {
            return Ok(None);
        }
        Ok(Some(unsafe { from_val(&data_val) }))
    }

    /// Advances to the next page of duplicates of the current key. `None`
    /// once the key's duplicates are exhausted.
    fn next_multiple(&self) -> Result<Option<&'txn [u8]>> {
        Ok(self
            .get(None, None, CursorOp::NextMultiple)?
            .map(|(_, page)| page))
    }

    /// Number of duplicates under the current key.
    fn count(&self) -> Result<usize> {
        let mut count: size_t = 0;
        check(unsafe { ffi::mdb_cursor_count(self.cursor(), &mut count) })?;
        Ok(count)
    }
}

/// A read cursor borrowing its transaction.
pub struct RoCursor<'txn> {
    raw: RawCursor,
    _txn: PhantomData<&'txn ()>,
}

impl<'txn> RoCursor<'txn> {
    pub(crate) fn new(txn: *mut ffi::MDB_txn, db: Database) -> Result<RoCursor<'txn>> {
        Ok(RoCursor {
            raw: RawCursor::open(txn, db)?,
            _txn: PhantomData,
        })
    }
}

impl<'txn> Cursor<'txn> for RoCursor<'txn> {
    fn cursor(&self) -> *mut ffi::MDB_cursor {
        self.raw.cursor
    }

    fn db(&self) -> Database {
        self.raw.db()
    }
}

/// A read-write cursor borrowing the write transaction.
pub struct RwCursor<'txn> {
    raw: RawCursor,
    _txn: PhantomData<&'txn ()>,
}

impl<'txn> RwCursor<'txn> {
    pub(crate) fn new(txn: *mut ffi::MDB_txn, db: Database) -> Result<RwCursor<'txn>> {
        Ok(RwCursor {
            raw: RawCursor::open(txn, db)?,
            _txn: PhantomData,
        })
    }

    /// Stores `value` under `key` and leaves the cursor on the new item.
    pub fn put(&mut self, key: &[u8], value: &[u8], flags: WriteFlags) -> Result<()> {
        let mut key_val = to_val(key);
        let mut data_val = to_val(value);
        check(unsafe {
            ffi::mdb_cursor_put(self.raw.cursor, &mut key_val, &mut data_val, flags.bits())
        })
    }

    /// Stores every record of `values` as a duplicate of `key` in one call.
    ///
    /// The table must be `DUP_SORT | DUP_FIXED` and every record must have
    /// the table's value width. Existing duplicates of `key` are kept, so
    /// repeated calls for the same key accumulate. Returns the number of
    /// records written.
    pub fn put_multiple<T: Pod>(
        &mut self,
        key: &[u8],
        values: &[T],
        flags: WriteFlags,
    ) -> Result<usize> {
        verify_arg!(db, self.raw.db().flags().supports_multiple());
        verify_arg!(values, std::mem::size_of::<T>() != 0);
        if values.is_empty() {
            return Ok(0);
        }
        let bytes: &[u8] = bytemuck::cast_slice(values);
        let mut key_val = to_val(key);
        let mut data = [
            ffi::MDB_val {
                mv_size: std::mem::size_of::<T>(),
                mv_data: bytes.as_ptr() as *mut libc::c_void,
            },
            ffi::MDB_val {
                mv_size: values.len(),
                mv_data: ptr::null_mut(),
            },
        ];
        check(unsafe {
            ffi::mdb_cursor_put(
                self.raw.cursor,
                &mut key_val,
                data.as_mut_ptr(),
                flags.bits() | ffi::MDB_MULTIPLE,
            )
        })?;
        // The engine reports back how many records it stored.
        Ok(data[1].mv_size)
    }
}

impl<'txn> Cursor<'txn> for RwCursor<'txn> {
    fn cursor(&self) -> *mut ffi::MDB_cursor {
        self.raw.cursor
    }

    fn db(&self) -> Database {
        self.raw.db()
    }
}
