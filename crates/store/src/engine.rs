//! Engine and iterator traits.
//!
//! Keys and values are opaque byte strings. Iteration order is ascending
//! lexicographic byte order, which the key codec in the state layer relies on
//! for prefix isolation and newest-first index scans.

use std::sync::Arc;

use crate::error::Result;

/// Seekable cursor over an engine's pairs in ascending key order.
///
/// A fresh iterator is unpositioned: [`current`](Self::current) returns `None`
/// until [`seek`](Self::seek) is called. Resources held by an iterator are
/// released when it is dropped.
pub trait KvIterator {
    /// Positions the cursor at the first key greater than or equal to `target`.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the backend read fails.
    fn seek(&mut self, target: &[u8]) -> Result<()>;

    /// Advances to the next key. A no-op once the iterator is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the backend read fails.
    fn next(&mut self) -> Result<()>;

    /// The pair under the cursor, or `None` when unpositioned or exhausted.
    fn current(&self) -> Option<(&[u8], &[u8])>;

    /// Key under the cursor.
    fn key(&self) -> Option<&[u8]> {
        self.current().map(|(key, _)| key)
    }

    /// Value under the cursor.
    fn value(&self) -> Option<&[u8]> {
        self.current().map(|(_, value)| value)
    }

    /// Whether the cursor is on a key that starts with `prefix`.
    fn valid_for_prefix(&self, prefix: &[u8]) -> bool {
        self.key().is_some_and(|key| key.starts_with(prefix))
    }
}

/// Ordered key-value engine with single-key atomic operations.
///
/// Engines are shared between callers through `Arc<dyn KvEngine>`.
pub trait KvEngine: Send + Sync {
    /// Reads the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the read fails.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Stores `value` at `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the write fails.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Opens a new iterator over the whole keyspace.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the iterator cannot be created.
    fn iter(&self) -> Result<Box<dyn KvIterator + '_>>;
}

impl<E: KvEngine + ?Sized> KvEngine for Arc<E> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn iter(&self) -> Result<Box<dyn KvIterator + '_>> {
        (**self).iter()
    }
}
