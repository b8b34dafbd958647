//! feedarchive-store: the ordered key-value engine the archive is written to.
//!
//! The state layer never talks to a concrete database. It sees a [`KvEngine`]
//! with single-key atomic `get`/`put` and a seekable, ordered [`KvIterator`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            feedarchive-state                │
//! │   (key codec, entity stores, scanner)       │
//! └────────────────┬────────────────────────────┘
//!                  │  &dyn KvEngine
//! ┌────────────────▼────────────────────────────┐
//! │         KvEngine / KvIterator               │
//! └───────┬─────────────────────────┬───────────┘
//!         │                         │
//! ┌───────▼────────┐       ┌────────▼───────────┐
//! │ InMemoryEngine │       │    RedbEngine      │
//! │ (BTreeMap)     │       │ (single kv table)  │
//! └────────────────┘       └────────────────────┘
//! ```
//!
//! No multi-key transactions are offered. Each `put` commits on its own.
//!
//! ## Quick Start
//!
//! ```no_run
//! use feedarchive_store::{InMemoryEngine, KvEngine};
//!
//! let engine = InMemoryEngine::new();
//! engine.put(b"key", b"value")?;
//! assert_eq!(engine.get(b"key")?, Some(b"value".to_vec()));
//!
//! let mut iter = engine.iter()?;
//! iter.seek(b"k")?;
//! while iter.valid_for_prefix(b"k") {
//!     iter.next()?;
//! }
//! # Ok::<(), feedarchive_store::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// redb::Error is large; boxing it would only move the allocation
#![allow(clippy::result_large_err)]

pub mod backend;
pub mod engine;
pub mod error;

pub use backend::{InMemoryEngine, RedbEngine, open_engine};
pub use engine::{KvEngine, KvIterator};
pub use error::{Error, Result};
