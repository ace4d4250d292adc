//! Forward-only iterators over tables.
//!
//! Each iterator holds its own cursor together with the transaction it was
//! opened in. The transaction can be owned (the iterator is then the only
//! thing keeping the snapshot alive) or borrowed as `&RoTransaction` when
//! several iterators should share one snapshot. Iterators can be restarted
//! only by creating a new one.

use std::marker::PhantomData;

use bytemuck::Pod;
use lmdb_sys as ffi;
use sakubiki_common::{Result, try_or_ret_some_err, verify_arg};

use crate::{
    cursor::{CursorOp, RawCursor},
    database::Database,
    transaction::Transaction,
    val::{FixedPage, empty_val, from_val, to_val},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Running,
    Done,
}

/// Positions a walk over every distinct key of a table.
struct KeyWalk {
    cursor: RawCursor,
    step: CursorOp,
    state: State,
}

impl KeyWalk {
    fn new(txn: *mut ffi::MDB_txn, db: Database) -> Result<KeyWalk> {
        // Duplicate-sorted tables are walked one key at a time.
        let step = if db.flags().is_dup_sort() {
            CursorOp::NextNoDup
        } else {
            CursorOp::Next
        };
        Ok(KeyWalk {
            cursor: RawCursor::open(txn, db)?,
            step,
            state: State::Start,
        })
    }

    fn advance(&mut self) -> Option<Result<(ffi::MDB_val, ffi::MDB_val)>> {
        let op = match self.state {
            State::Start => CursorOp::First,
            State::Running => self.step,
            State::Done => return None,
        };
        let mut key = empty_val();
        let mut data = empty_val();
        match self.cursor.get_raw(&mut key, &mut data, op) {
            Ok(true) => {
                self.state = State::Running;
                Some(Ok((key, data)))
            }
            Ok(false) => {
                self.state = State::Done;
                None
            }
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}

/// Iterates over the distinct keys of a table in key order.
pub struct KeyIter<T: Transaction> {
    walk: KeyWalk,
    // Declared after the cursor so the cursor is closed first.
    _txn: T,
}

impl<T: Transaction> KeyIter<T> {
    pub fn new(txn: T, db: Database) -> Result<KeyIter<T>> {
        Ok(KeyIter {
            walk: KeyWalk::new(txn.txn(), db)?,
            _txn: txn,
        })
    }
}

impl<T: Transaction> Iterator for KeyIter<T> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, _) = try_or_ret_some_err!(self.walk.advance()?);
        Some(Ok(unsafe { from_val(&key) }.to_vec()))
    }
}

/// Iterates over `(key, first value)` pairs of a table in key order.
///
/// On duplicate-sorted tables only the first duplicate of each key is
/// yielded; use [`MultipleValueIter`] to read all of them.
pub struct KeyValueIter<T: Transaction> {
    walk: KeyWalk,
    _txn: T,
}

impl<T: Transaction> KeyValueIter<T> {
    pub fn new(txn: T, db: Database) -> Result<KeyValueIter<T>> {
        Ok(KeyValueIter {
            walk: KeyWalk::new(txn.txn(), db)?,
            _txn: txn,
        })
    }
}

impl<T: Transaction> Iterator for KeyValueIter<T> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, data) = try_or_ret_some_err!(self.walk.advance()?);
        let (key, data) = unsafe { (from_val(&key), from_val(&data)) };
        Some(Ok((key.to_vec(), data.to_vec())))
    }
}

/// Iterates over every duplicate value of one key of a
/// `DUP_SORT | DUP_FIXED` table, fetching them a page at a time and decoding
/// each record as `V`.
///
/// An absent key yields an empty sequence. Records come out in the table's
/// duplicate order (byte-wise on their encoded form).
pub struct MultipleValueIter<T: Transaction, V> {
    cursor: RawCursor,
    page: ffi::MDB_val,
    pos: usize,
    done: bool,
    _txn: T,
    _p: PhantomData<V>,
}

impl<T: Transaction, V: Pod> MultipleValueIter<T, V> {
    pub fn new(txn: T, db: Database, key: &[u8]) -> Result<MultipleValueIter<T, V>> {
        verify_arg!(db, db.flags().supports_multiple());
        let cursor = RawCursor::open(txn.txn(), db)?;

        let mut key_val = to_val(key);
        let mut page = empty_val();
        let done = !cursor.get_raw(&mut key_val, &mut page, CursorOp::Set)?
            // `page` holds the first value, which is what the engine leaves in
            // place for a key with a single value.
            || !cursor.get_raw(&mut key_val, &mut page, CursorOp::GetMultiple)?;
        if done {
            page = empty_val();
        }
        Ok(MultipleValueIter {
            cursor,
            page,
            pos: 0,
            done,
            _txn: txn,
            _p: PhantomData,
        })
    }

    fn current_page(&self) -> Result<FixedPage<'_, V>> {
        // The page lives in the snapshot pinned by `_txn`.
        FixedPage::new(unsafe { from_val(&self.page) })
    }

    /// Fetches the next page. `Ok(false)` once the key is exhausted.
    fn next_page(&mut self) -> Result<bool> {
        let mut key = empty_val();
        let mut page = empty_val();
        if !self
            .cursor
            .get_raw(&mut key, &mut page, CursorOp::NextMultiple)?
        {
            self.done = true;
            self.page = empty_val();
            return Ok(false);
        }
        self.page = page;
        self.pos = 0;
        Ok(true)
    }

    /// Counts the records not yet yielded without decoding them, summing the
    /// byte lengths of the remaining pages.
    pub fn count_remaining(mut self) -> Result<usize> {
        if self.done {
            return Ok(0);
        }
        let mut count = self.current_page()?.len().saturating_sub(self.pos);
        while self.next_page()? {
            count += self.current_page()?.len();
        }
        Ok(count)
    }
}

impl<T: Transaction, V: Pod> Iterator for MultipleValueIter<T, V> {
    type Item = Result<V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let page = match self.current_page() {
                Ok(page) => page,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            if let Some(value) = page.get(self.pos) {
                self.pos += 1;
                return Some(Ok(value));
            }
            if let Err(e) = self.next_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

impl<T: Transaction, V> std::fmt::Debug for MultipleValueIter<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipleValueIter")
            .field("page_len", &self.page.mv_size)
            .field("pos", &self.pos)
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        environment::{Environment, EnvironmentOptions},
        flags::{DatabaseFlags, WriteFlags},
    };

    fn open_env(dir: &tempfile::TempDir) -> Environment {
        Environment::open(dir.path(), &EnvironmentOptions::default().with_map_size(1 << 24))
            .unwrap()
    }

    #[test]
    fn test_key_iter_skips_duplicates() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("d"), DatabaseFlags::DUP_SORT).unwrap();
        env.write(|txn| {
            for (k, v) in [("b", "1"), ("a", "1"), ("a", "2"), ("c", "9"), ("a", "3")] {
                txn.put(db, k.as_bytes(), v.as_bytes(), WriteFlags::empty())?;
            }
            Ok(())
        })
        .unwrap();

        let keys = KeyIter::new(env.begin_ro_txn().unwrap(), db)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_key_value_iter_on_empty_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("e"), DatabaseFlags::empty()).unwrap();
        let mut iter = KeyValueIter::new(env.begin_ro_txn().unwrap(), db).unwrap();
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_iterators_share_a_borrowed_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("t"), DatabaseFlags::empty()).unwrap();
        env.write(|txn| txn.put(db, b"k", b"v", WriteFlags::empty()))
            .unwrap();

        let txn = env.begin_ro_txn().unwrap();
        let keys = KeyIter::new(&txn, db)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        let pairs = KeyValueIter::new(&txn, db)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(keys, vec![b"k".to_vec()]);
        assert_eq!(pairs, vec![(b"k".to_vec(), b"v".to_vec())]);
    }

    #[test]
    fn test_multiple_value_iter_pages_and_counts() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env
            .create_db(Some("m"), DatabaseFlags::DUP_SORT | DatabaseFlags::DUP_FIXED)
            .unwrap();
        let values: Vec<u32> = (0..3000).collect();
        let txn = env.begin_rw_txn().unwrap();
        txn.open_rw_cursor(db)
            .unwrap()
            .put_multiple(b"w", &values, WriteFlags::empty())
            .unwrap();
        txn.commit().unwrap();

        let txn = env.begin_ro_txn().unwrap();
        let mut seen = MultipleValueIter::<_, u32>::new(&txn, db, b"w")
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        seen.sort_unstable();
        assert_eq!(seen, values);

        let count = MultipleValueIter::<_, u32>::new(&txn, db, b"w")
            .unwrap()
            .count_remaining()
            .unwrap();
        assert_eq!(count, values.len());

        let mut partial = MultipleValueIter::<_, u32>::new(&txn, db, b"w").unwrap();
        partial.next().unwrap().unwrap();
        partial.next().unwrap().unwrap();
        assert_eq!(partial.count_remaining().unwrap(), values.len() - 2);
    }

    #[test]
    fn test_multiple_value_iter_absent_and_single() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env
            .create_db(Some("m"), DatabaseFlags::DUP_SORT | DatabaseFlags::DUP_FIXED)
            .unwrap();
        env.write(|txn| txn.put(db, b"one", &42u32.to_ne_bytes(), WriteFlags::empty()))
            .unwrap();

        let txn = env.begin_ro_txn().unwrap();
        let mut absent = MultipleValueIter::<_, u32>::new(&txn, db, b"zzz").unwrap();
        assert!(absent.next().is_none());
        let absent = MultipleValueIter::<_, u32>::new(&txn, db, b"zzz").unwrap();
        assert_eq!(absent.count_remaining().unwrap(), 0);

        let single = MultipleValueIter::<_, u32>::new(&txn, db, b"one")
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(single, vec![42]);
    }

    #[test]
    fn test_multiple_value_iter_rejects_plain_table() {
        let dir = tempfile::TempDir::new().unwrap();
        let env = open_env(&dir);
        let db = env.create_db(Some("p"), DatabaseFlags::empty()).unwrap();
        let txn = env.begin_ro_txn().unwrap();
        assert!(MultipleValueIter::<_, u32>::new(&txn, db, b"k").is_err());
    }
}
