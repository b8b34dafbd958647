//! Reverse-chronological entry index.
//!
//! For every created entry one pair is written:
//!
//! ```text
//! {ReverseEntryIndex}{owner uuid:16}{reverse flake:8BE}  ->  entry primary key bytes
//! ```
//!
//! The reverse flake is derived from the entry's own creation date, so a
//! forward scan of an owner's prefix lists that owner's entries newest first
//! regardless of the order they were archived in. The forward index table is
//! reserved but not populated.
//!
//! Flakes repeat once the generator's sequence wraps or a generator restarts
//! with the same worker id. A new pair therefore only goes into a free slot:
//! occupied candidates are skipped, up to one full sequence cycle. The check
//! and the write are not atomic, so concurrent creators for the same owner and
//! millisecond can still collide.

use chrono::{DateTime, Utc};
use feedarchive_store::KvEngine;
use feedarchive_types::{FlakeGenerator, snowflake::SEQUENCE_BITS};
use snafu::{IntoError, ResultExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EngineSnafu, IndexSlotsExhaustedSnafu, Result, StoreError};
use crate::keys::{Key, owner_index_prefix};
use crate::scan::{ScanControl, ScanError, forward_scan};
use crate::tables::TableTag;

/// Candidate flakes tried before giving up on a free index slot.
pub const MAX_SLOT_ATTEMPTS: usize = 1 << SEQUENCE_BITS;

/// Maintains and reads the newest-first entry index.
pub struct IndexManager;

impl IndexManager {
    /// Writes the index pair for an entry created at `created_at` and returns
    /// the index key written.
    ///
    /// Never overwrites an existing pair.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Engine` if a read or the write fails, and
    /// `StoreError::IndexSlotsExhausted` if every candidate slot is taken.
    pub fn add_entry<E: KvEngine + ?Sized>(
        engine: &E,
        ids: &FlakeGenerator,
        owner: Uuid,
        created_at: DateTime<Utc>,
        primary_key: &[u8],
    ) -> Result<Key> {
        for attempt in 0..MAX_SLOT_ATTEMPTS {
            let key = Key::reverse_index(owner, ids.reverse_id(created_at));
            let encoded = key.encode();
            if engine.get(&encoded).context(EngineSnafu)?.is_some() {
                continue;
            }
            engine.put(&encoded, primary_key).context(EngineSnafu)?;
            debug!(index_key = %key, skipped = attempt, "Indexed entry");
            return Ok(key);
        }

        warn!(owner = %owner, %created_at, "No free index slot");
        IndexSlotsExhaustedSnafu { owner, attempts: MAX_SLOT_ATTEMPTS }.fail()
    }

    /// Walks `owner`'s entry keys newest first, handing each to `visit`.
    ///
    /// Index values that do not decode as entry keys are skipped with a
    /// warning and never reach `visit`.
    ///
    /// # Errors
    ///
    /// Returns the first error from `visit`, or `StoreError::Engine` if the
    /// scan fails.
    pub fn walk_newest<E, F>(engine: &E, owner: Uuid, mut visit: F) -> Result<usize>
    where
        E: KvEngine + ?Sized,
        F: FnMut(Key) -> Result<ScanControl>,
    {
        forward_scan(engine, &owner_index_prefix(owner), |_, index_key, value| {
            match Key::decode(value) {
                Ok(key) if key.table() == TableTag::Entry => visit(key),
                Ok(other) => {
                    warn!(
                        index_key = ?index_key,
                        points_to = %other,
                        "Index entry points outside the entry table"
                    );
                    Ok(ScanControl::Continue)
                },
                Err(e) => {
                    warn!(index_key = ?index_key, error = %e, "Skipping malformed index entry");
                    Ok(ScanControl::Continue)
                },
            }
        })
        .map_err(flatten_scan_error)
    }

    /// Returns up to `limit` entry primary keys for `owner`, newest first.
    ///
    /// Keys are returned whether or not the entry they point to still exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Engine` if the scan fails.
    pub fn newest_first<E: KvEngine + ?Sized>(
        engine: &E,
        owner: Uuid,
        limit: usize,
    ) -> Result<Vec<Key>> {
        let mut keys = Vec::new();
        if limit == 0 {
            return Ok(keys);
        }
        Self::walk_newest(engine, owner, |key| {
            keys.push(key);
            Ok(if keys.len() == limit { ScanControl::Stop } else { ScanControl::Continue })
        })?;
        Ok(keys)
    }

    /// Number of index pairs stored for `owner`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Engine` if the scan fails.
    pub fn count<E: KvEngine + ?Sized>(engine: &E, owner: Uuid) -> Result<usize> {
        forward_scan(engine, &owner_index_prefix(owner), |_, _, _| {
            Ok::<_, StoreError>(ScanControl::Continue)
        })
        .map_err(flatten_scan_error)
    }
}

/// Folds a scan failure back into the store error it carries.
pub(crate) fn flatten_scan_error(err: ScanError<StoreError>) -> StoreError {
    match err {
        ScanError::Callback { source, .. } => source,
        ScanError::Engine { source, .. } => EngineSnafu.into_error(source),
    }
}
