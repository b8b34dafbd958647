//! Persistent engine backed by a redb database file.
//!
//! All pairs live in a single `kv` table with byte keys and values; the
//! leading table tag written by the state layer keeps entity kinds apart.
//! Every `put` is its own write transaction. Iterators read in batches of
//! `scan_batch_size` pairs, each batch from a short-lived read transaction, so
//! no transaction stays open while a scan callback runs.

use std::collections::VecDeque;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};
use snafu::ResultExt;

use crate::engine::{KvEngine, KvIterator};
use crate::error::{Error, OpenSnafu, Result};

/// The single table holding every pair.
const KV: TableDefinition<'static, &'static [u8], &'static [u8]> = TableDefinition::new("kv");

/// Engine backed by a redb file.
pub struct RedbEngine {
    db: Database,
    path: PathBuf,
    scan_batch_size: usize,
}

impl RedbEngine {
    /// Opens the database at `path`, creating the file and the `kv` table if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] if the file cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>, scan_batch_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let db = Database::create(path)
            .map_err(redb::Error::from)
            .context(OpenSnafu { path: display.clone() })?;

        let txn = db.begin_write().map_err(redb::Error::from).context(OpenSnafu {
            path: display.clone(),
        })?;
        {
            txn.open_table(KV).map_err(redb::Error::from).context(OpenSnafu {
                path: display.clone(),
            })?;
        }
        txn.commit().map_err(redb::Error::from).context(OpenSnafu { path: display })?;

        Ok(Self { db, path: path.to_path_buf(), scan_batch_size: scan_batch_size.max(1) })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads up to `scan_batch_size` pairs starting at `from`.
    fn read_batch(&self, from: Bound<&[u8]>) -> Result<VecDeque<(Vec<u8>, Vec<u8>)>> {
        let txn = self.db.begin_read().map_err(Error::backend)?;
        let table = txn.open_table(KV).map_err(Error::backend)?;

        let mut batch = VecDeque::with_capacity(self.scan_batch_size);
        for item in table.range::<&[u8]>((from, Bound::Unbounded)).map_err(Error::backend)? {
            let (key, value) = item.map_err(Error::backend)?;
            batch.push_back((key.value().to_vec(), value.value().to_vec()));
            if batch.len() == self.scan_batch_size {
                break;
            }
        }
        Ok(batch)
    }
}

impl std::fmt::Debug for RedbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbEngine")
            .field("path", &self.path)
            .field("scan_batch_size", &self.scan_batch_size)
            .finish_non_exhaustive()
    }
}

impl KvEngine for RedbEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(Error::backend)?;
        let table = txn.open_table(KV).map_err(Error::backend)?;
        let value = table.get(key).map_err(Error::backend)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let txn = self.db.begin_write().map_err(Error::backend)?;
        {
            let mut table = txn.open_table(KV).map_err(Error::backend)?;
            table.insert(key, value).map_err(Error::backend)?;
        }
        txn.commit().map_err(Error::backend)
    }

    fn iter(&self) -> Result<Box<dyn KvIterator + '_>> {
        Ok(Box::new(RedbIter {
            engine: self,
            batch: VecDeque::new(),
            current: None,
            exhausted: false,
        }))
    }
}

/// Batched cursor; refills from just past the last key it returned.
struct RedbIter<'a> {
    engine: &'a RedbEngine,
    batch: VecDeque<(Vec<u8>, Vec<u8>)>,
    current: Option<(Vec<u8>, Vec<u8>)>,
    exhausted: bool,
}

impl RedbIter<'_> {
    fn refill(&mut self, from: Bound<&[u8]>) -> Result<()> {
        self.batch = self.engine.read_batch(from)?;
        self.exhausted = self.batch.len() < self.engine.scan_batch_size;
        Ok(())
    }
}

impl KvIterator for RedbIter<'_> {
    fn seek(&mut self, target: &[u8]) -> Result<()> {
        self.current = None;
        self.refill(Bound::Included(target))?;
        self.current = self.batch.pop_front();
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        let Some((last, _)) = self.current.take() else {
            return Ok(());
        };
        if self.batch.is_empty() && !self.exhausted {
            self.refill(Bound::Excluded(last.as_slice()))?;
        }
        self.current = self.batch.pop_front();
        Ok(())
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.current.as_ref().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}
