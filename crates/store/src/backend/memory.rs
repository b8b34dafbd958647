//! In-memory engine for tests and tooling.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::engine::{KvEngine, KvIterator};
use crate::error::Result;

type Pairs = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory engine backed by a `BTreeMap`.
///
/// All data is lost when the engine is dropped. Iterators take the read lock
/// only for the duration of a single step, so a scan callback may write to the
/// same engine without deadlocking.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    data: RwLock<Pairs>,
}

impl InMemoryEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copies every stored pair, in key order.
    pub fn snapshot(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl KvEngine for InMemoryEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn iter(&self) -> Result<Box<dyn KvIterator + '_>> {
        Ok(Box::new(MemoryIter { data: &self.data, current: None }))
    }
}

/// Cursor that re-reads the map from its last key on every step.
struct MemoryIter<'a> {
    data: &'a RwLock<Pairs>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl MemoryIter<'_> {
    fn first_from(&self, from: Bound<&[u8]>) -> Option<(Vec<u8>, Vec<u8>)> {
        self.data
            .read()
            .range::<[u8], _>((from, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }
}

impl KvIterator for MemoryIter<'_> {
    fn seek(&mut self, target: &[u8]) -> Result<()> {
        self.current = self.first_from(Bound::Included(target));
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        if let Some((last, _)) = self.current.take() {
            self.current = self.first_from(Bound::Excluded(last.as_slice()));
        }
        Ok(())
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.current.as_ref().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}
