//! Safe resource wrappers over the LMDB transactional key-value engine.
//!
//! The crate exposes the pieces the full-text index is built from:
//!
//! - [`Environment`]: the open database directory, its map size ceiling and
//!   its set of named tables.
//! - [`RoTransaction`] / [`RwTransaction`]: read-only snapshots and the single
//!   writer. Both release their engine resources on drop; a write transaction
//!   that was not committed is aborted unless it was marked auto-committing.
//! - [`Database`]: a named table handle, opened once and reused.
//! - [`RoCursor`] / [`RwCursor`]: ordered traversal borrowing a transaction,
//!   including the bulk `MULTIPLE` read and write paths for fixed-width
//!   duplicate values.
//! - Byte views ([`FixedPage`], [`ValueView`]) and the iteration protocol
//!   ([`KeyIter`], [`KeyValueIter`], [`MultipleValueIter`]).
//!
//! Engine failures are reported as [`sakubiki_common::error::ErrorKind::Storage`]
//! carrying a [`sakubiki_common::error::StorageCondition`] and the raw code.
//! "Not found" is never an error at this level: positional calls return
//! `Ok(None)` and iterators simply end.

mod cursor;
mod database;
mod environment;
mod error;
mod flags;
mod iter;
mod transaction;
mod val;

pub use cursor::{Cursor, CursorOp, RoCursor, RwCursor};
pub use database::Database;
pub use environment::{
    DEFAULT_MAP_SIZE, EnvInfo, Environment, EnvironmentOptions, MAX_KEY_SIZE, Stat,
};
pub use error::{check, condition_for_code, strerror};
pub use flags::{DatabaseFlags, EnvironmentFlags, WriteFlags};
pub use iter::{KeyIter, KeyValueIter, MultipleValueIter};
pub use transaction::{RoTransaction, RwTransaction, Transaction};
pub use val::{FixedPage, ValueView};
