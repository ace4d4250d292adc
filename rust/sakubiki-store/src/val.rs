//! Byte-range views over values returned by the engine.
//!
//! Values are never decoded eagerly: a view keeps the raw range and the width
//! of its elements, and decoding happens only where a value is consumed. All
//! views borrow from (or own) the transaction that produced them, so they can
//! never outlive the memory map snapshot they point into.

use std::marker::PhantomData;

use bytemuck::Pod;
use lmdb_sys as ffi;
use sakubiki_common::{Result, error::Error, verify_data};

use crate::transaction::RoTransaction;

#[inline]
pub(crate) fn to_val(bytes: &[u8]) -> ffi::MDB_val {
    ffi::MDB_val {
        mv_size: bytes.len(),
        mv_data: bytes.as_ptr() as *mut libc::c_void,
    }
}

#[inline]
pub(crate) fn empty_val() -> ffi::MDB_val {
    ffi::MDB_val {
        mv_size: 0,
        mv_data: std::ptr::null_mut(),
    }
}

/// Reinterprets an engine value as a byte slice.
///
/// # Safety
///
/// `val` must have been filled in by the engine within a transaction that is
/// still alive for `'a`, or must point at memory valid for `'a`.
#[inline]
pub(crate) unsafe fn from_val<'a>(val: &ffi::MDB_val) -> &'a [u8] {
    if val.mv_data.is_null() || val.mv_size == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(val.mv_data as *const u8, val.mv_size) }
    }
}

/// A page of fixed-width values, such as the result of a `GET_MULTIPLE`.
///
/// The page is a contiguous run of `size_of::<T>()`-byte records with no
/// alignment guarantee; records are copied out with
/// [`bytemuck::pod_read_unaligned`] when accessed.
#[derive(Debug, Clone, Copy)]
pub struct FixedPage<'a, T> {
    bytes: &'a [u8],
    _p: PhantomData<T>,
}

impl<'a, T: Pod> FixedPage<'a, T> {
    /// Width of one record in bytes.
    pub const WIDTH: usize = std::mem::size_of::<T>();

    /// Wraps a raw page, checking that it holds a whole number of records.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        verify_data!(page, Self::WIDTH != 0);
        verify_data!(page, bytes.len() % Self::WIDTH == 0);
        Ok(FixedPage {
            bytes,
            _p: PhantomData,
        })
    }

    /// Number of records in the page.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / Self::WIDTH
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the record at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(Self::WIDTH)?;
        let end = start.checked_add(Self::WIDTH)?;
        self.bytes
            .get(start..end)
            .map(bytemuck::pod_read_unaligned::<T>)
    }

    /// Raw bytes of the page.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        self.bytes
            .chunks_exact(Self::WIDTH)
            .map(bytemuck::pod_read_unaligned::<T>)
    }
}

/// A single value read under its own read-only transaction.
///
/// The view owns the snapshot, so the bytes stay valid (and unchanged by later
/// writers) for as long as the view is alive, without copying them out of the
/// memory map.
pub struct ValueView<'env> {
    val: ffi::MDB_val,
    // Keeps the snapshot the value points into alive.
    _txn: RoTransaction<'env>,
}

impl<'env> ValueView<'env> {
    /// # Safety
    ///
    /// `val` must have been returned by a read on `txn`.
    pub(crate) unsafe fn new(txn: RoTransaction<'env>, val: ffi::MDB_val) -> ValueView<'env> {
        ValueView { val, _txn: txn }
    }

    pub fn as_bytes(&self) -> &[u8] {
        // The value lives in pages of the memory map pinned by `_txn`.
        unsafe { from_val(&self.val) }
    }

    pub fn len(&self) -> usize {
        self.val.mv_size
    }

    pub fn is_empty(&self) -> bool {
        self.val.mv_size == 0
    }

    /// The value as UTF-8 text.
    ///
    /// # Errors
    ///
    /// [`sakubiki_common::error::ErrorKind::InvalidFormat`] if the stored
    /// bytes are not valid UTF-8.
    pub fn to_str(&self) -> Result<&str> {
        std::str::from_utf8(self.as_bytes()).map_err(|_| Error::invalid_format("value"))
    }
}

impl std::ops::Deref for ValueView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for ValueView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for ValueView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueView").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_page_decodes_unaligned() {
        let mut raw = vec![0u8];
        for v in [1u64, 2, 0xdead_beef] {
            raw.extend_from_slice(&v.to_ne_bytes());
        }
        // Skip the leading byte so the records start misaligned.
        let page = FixedPage::<u64>::new(&raw[1..]).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page.get(0), Some(1));
        assert_eq!(page.get(2), Some(0xdead_beef));
        assert_eq!(page.get(3), None);
        assert_eq!(page.iter().collect::<Vec<_>>(), vec![1, 2, 0xdead_beef]);
    }

    #[test]
    fn test_fixed_page_rejects_partial_record() {
        let raw = [0u8; 12];
        assert!(FixedPage::<u64>::new(&raw).is_err());
        let page = FixedPage::<u32>::new(&raw).unwrap();
        assert_eq!(page.len(), 3);
    }

    #[test]
    fn test_val_round_trip() {
        let data = b"hello";
        let val = to_val(data);
        assert_eq!(unsafe { from_val(&val) }, data);
        assert!(unsafe { from_val(&empty_val()) }.is_empty());
    }
}
