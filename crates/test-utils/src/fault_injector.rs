//! Fault injection for engine-level failure tests.
//!
//! [`FaultyEngine`] wraps any [`KvEngine`] and, once armed, fails the writes
//! and iterator steps described by its [`Fault`]. It also tracks how many
//! iterators are alive so tests can check that scans release them.
//!
//! ```text
//! store operation ──▶ FaultyEngine ──▶ inner engine
//!                         │
//!                         └─ armed fault matches? ─▶ Error::Unavailable
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use feedarchive_store::{Error, KvEngine, KvIterator, Result};
use parking_lot::Mutex;

/// Which operations an armed [`FaultyEngine`] fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail every `put` whose key starts with these bytes.
    PutWithPrefix(Vec<u8>),
    /// Let this many iterator `next` calls succeed, then fail the rest.
    IterNextAfter(usize),
}

/// Engine wrapper that injects failures on demand.
///
/// Starts disarmed so fixtures can be written through it.
pub struct FaultyEngine<E: ?Sized> {
    fault: Mutex<Option<Fault>>,
    armed: AtomicBool,
    puts: AtomicUsize,
    failed_puts: AtomicUsize,
    next_calls: Arc<AtomicUsize>,
    live_iterators: Arc<AtomicUsize>,
    inner: Arc<E>,
}

impl<E: KvEngine + ?Sized> FaultyEngine<E> {
    /// Wraps `inner`.
    pub fn new(inner: Arc<E>) -> Arc<Self> {
        Arc::new(Self {
            fault: Mutex::new(None),
            armed: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
            failed_puts: AtomicUsize::new(0),
            next_calls: Arc::new(AtomicUsize::new(0)),
            live_iterators: Arc::new(AtomicUsize::new(0)),
            inner,
        })
    }

    /// Arms `fault` and resets the counters.
    pub fn arm(&self, fault: Fault) {
        *self.fault.lock() = Some(fault);
        self.puts.store(0, Ordering::SeqCst);
        self.failed_puts.store(0, Ordering::SeqCst);
        self.next_calls.store(0, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Stops injecting failures.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    /// Number of `put` calls since the last [`arm`](Self::arm), failed ones included.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `put` calls rejected since the last [`arm`](Self::arm).
    pub fn failed_put_count(&self) -> usize {
        self.failed_puts.load(Ordering::SeqCst)
    }

    /// Number of iterators created and not yet dropped.
    pub fn live_iterators(&self) -> usize {
        self.live_iterators.load(Ordering::SeqCst)
    }

    /// The wrapped engine.
    pub fn inner(&self) -> &Arc<E> {
        &self.inner
    }

    fn armed_fault(&self) -> Option<Fault> {
        if self.armed.load(Ordering::SeqCst) { self.fault.lock().clone() } else { None }
    }
}

fn injected(what: &str) -> Error {
    Error::Unavailable { reason: format!("injected {what} failure") }
}

impl<E: KvEngine + ?Sized> KvEngine for FaultyEngine<E> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(Fault::PutWithPrefix(prefix)) = self.armed_fault() {
            if key.starts_with(&prefix) {
                self.failed_puts.fetch_add(1, Ordering::SeqCst);
                return Err(injected("put"));
            }
        }
        self.inner.put(key, value)
    }

    fn iter(&self) -> Result<Box<dyn KvIterator + '_>> {
        let fail_after = match self.armed_fault() {
            Some(Fault::IterNextAfter(n)) => Some(n),
            _ => None,
        };
        let inner = self.inner.iter()?;
        self.live_iterators.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TrackedIter {
            inner,
            fail_after,
            next_calls: Arc::clone(&self.next_calls),
            live: Arc::clone(&self.live_iterators),
        }))
    }
}

struct TrackedIter<'a> {
    inner: Box<dyn KvIterator + 'a>,
    fail_after: Option<usize>,
    next_calls: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl KvIterator for TrackedIter<'_> {
    fn seek(&mut self, target: &[u8]) -> Result<()> {
        self.inner.seek(target)
    }

    fn next(&mut self) -> Result<()> {
        let calls = self.next_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| calls >= limit) {
            return Err(injected("iterator"));
        }
        self.inner.next()
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.inner.current()
    }
}

impl Drop for TrackedIter<'_> {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use feedarchive_store::InMemoryEngine;

    use super::*;

    #[test]
    fn test_starts_disarmed() {
        let engine = FaultyEngine::new(Arc::new(InMemoryEngine::new()));
        engine.put(b"ix", b"v").unwrap();
        assert_eq!(engine.get(b"ix").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_put_prefix_fault() {
        let engine = FaultyEngine::new(Arc::new(InMemoryEngine::new()));
        engine.arm(Fault::PutWithPrefix(b"ix".to_vec()));

        engine.put(b"pk", b"v").unwrap();
        assert!(engine.put(b"ix-1", b"v").is_err());
        assert_eq!(engine.put_count(), 2);
        assert_eq!(engine.failed_put_count(), 1);
        assert!(engine.inner().get(b"ix-1").unwrap().is_none());

        engine.disarm();
        engine.put(b"ix-1", b"v").unwrap();
    }

    #[test]
    fn test_iter_fault_and_tracking() {
        let engine = FaultyEngine::new(Arc::new(InMemoryEngine::new()));
        for key in [b"a", b"b", b"c"] {
            engine.put(key, b"v").unwrap();
        }
        engine.arm(Fault::IterNextAfter(1));

        {
            let mut iter = engine.iter().unwrap();
            assert_eq!(engine.live_iterators(), 1);
            iter.seek(b"").unwrap();
            iter.next().unwrap();
            assert!(iter.next().is_err());
        }
        assert_eq!(engine.live_iterators(), 0);
    }
}
