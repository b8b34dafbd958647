//! Entry storage operations.
//!
//! Entries are created once and then replaced wholesale. Two writers updating
//! the same entry (for example one adding a like while another adds a comment)
//! both read, modify and `put` the full value; the last `put` wins and the
//! other edit is lost. There is no version check.

use feedarchive_store::KvEngine;
use feedarchive_types::{
    Entry, FlakeGenerator, decode, encode, strip_entry_prefix, validation::parse_uuid,
};
use snafu::ResultExt;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::{
    AlreadyExistsSnafu, CodecSnafu, EngineSnafu, InvalidIdentitySnafu, InvalidTimestampSnafu,
    NotFoundSnafu, Result, StoreError,
};
use crate::indexes::IndexManager;
use crate::keys::Key;
use crate::scan::ScanControl;

/// Entry storage operations.
pub struct EntryStore;

impl EntryStore {
    /// Stores an entry and returns its primary key.
    ///
    /// The entry is normalized in place first: the `e/` namespace is stripped
    /// from its id, and the stored value carries the stripped id. Every field is
    /// validated before anything is written.
    ///
    /// - Existing key, `update == false`: `AlreadyExists` with the key; nothing written.
    /// - Existing key, `update == true`: the whole value is replaced.
    /// - New key: the entry is written, then its newest-first index pair.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` for a malformed entry or owner id,
    /// `StoreError::InvalidTimestamp` for an unparseable date,
    /// `StoreError::AlreadyExists` as described above, and
    /// `StoreError::IndexWrite` if the entry was written but its index pair was not.
    pub fn put<E: KvEngine + ?Sized>(
        engine: &E,
        ids: &FlakeGenerator,
        entry: &mut Entry,
        update: bool,
    ) -> Result<Key> {
        let owner = parse_uuid("profile_uuid", &entry.profile_uuid).context(InvalidIdentitySnafu)?;
        let canonical = strip_entry_prefix(&entry.id).to_string();
        let id = parse_uuid("id", &canonical).context(InvalidIdentitySnafu)?;
        let created_at =
            entry.created_at().context(InvalidTimestampSnafu { value: entry.date.clone() })?;

        entry.id = canonical;
        let value = encode(&*entry).context(CodecSnafu)?;
        let key = Key::entry(id);
        let primary = key.encode();

        if engine.get(&primary).context(EngineSnafu)?.is_some() {
            if !update {
                debug!(key = %key, "Entry already exists");
                return AlreadyExistsSnafu { key }.fail();
            }
            engine.put(&primary, &value).context(EngineSnafu)?;
            debug!(key = %key, "Replaced entry");
            return Ok(key);
        }

        engine.put(&primary, &value).context(EngineSnafu)?;
        debug!(key = %key, owner = %owner, "Created entry");

        if let Err(source) = IndexManager::add_entry(engine, ids, owner, created_at, &primary) {
            error!(key = %key, error = %source, "Entry stored but index write failed");
            return Err(StoreError::IndexWrite { key, source: Box::new(source) });
        }
        Ok(key)
    }

    /// Fetches an entry. `id` may carry the `e/` namespace.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` for a malformed id,
    /// `StoreError::NotFound` if nothing is stored, and `StoreError::Codec` if
    /// the stored value does not decode.
    pub fn get<E: KvEngine + ?Sized>(engine: &E, id: &str) -> Result<Entry> {
        let uuid = parse_uuid("id", strip_entry_prefix(id)).context(InvalidIdentitySnafu)?;
        Self::load(engine, uuid)?.ok_or_else(|| {
            NotFoundSnafu { kind: "entry", id: strip_entry_prefix(id) }.build()
        })
    }

    /// Lists up to `limit` entries of `owner`, newest first.
    ///
    /// Index pairs whose entry is missing are skipped with a warning and do
    /// not count toward `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` for a malformed owner, and engine
    /// or codec errors from the scan and the entry reads.
    pub fn list_for_owner<E: KvEngine + ?Sized>(
        engine: &E,
        owner: &str,
        limit: usize,
    ) -> Result<Vec<Entry>> {
        let owner = parse_uuid("profile_uuid", owner).context(InvalidIdentitySnafu)?;
        let mut entries = Vec::new();
        if limit == 0 {
            return Ok(entries);
        }

        IndexManager::walk_newest(engine, owner, |key| {
            let Key::Uuid { id, .. } = key else { return Ok(ScanControl::Continue) };
            match Self::load(engine, id)? {
                Some(entry) => entries.push(entry),
                None => warn!(entry_id = %id, owner = %owner, "Index points to a missing entry"),
            }
            Ok(if entries.len() == limit { ScanControl::Stop } else { ScanControl::Continue })
        })?;
        Ok(entries)
    }

    fn load<E: KvEngine + ?Sized>(engine: &E, id: Uuid) -> Result<Option<Entry>> {
        match engine.get(&Key::entry(id).encode()).context(EngineSnafu)? {
            Some(bytes) => Ok(Some(decode(&bytes).context(CodecSnafu)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use feedarchive_store::InMemoryEngine;
    use feedarchive_types::ErrorCode;

    use super::*;

    const OWNER: &str = "6f1b2f6c-1111-4a4a-8c8c-000000000001";
    const ENTRY: &str = "0b6c3f2e-2222-4b4b-9d9d-000000000002";

    fn entry(id: &str, date: &str) -> Entry {
        Entry {
            id: id.to_string(),
            profile_uuid: OWNER.to_string(),
            date: date.to_string(),
            body: "hello".to_string(),
            ..Entry::default()
        }
    }

    #[test]
    fn test_put_strips_namespace_before_storing() {
        let engine = InMemoryEngine::new();
        let ids = FlakeGenerator::new(1);
        let mut e = entry(&format!("e/{ENTRY}"), "2024-01-01T00:00:00Z");

        EntryStore::put(&engine, &ids, &mut e, false).unwrap();
        assert_eq!(e.id, ENTRY);

        let stored = EntryStore::get(&engine, ENTRY).unwrap();
        assert_eq!(stored.id, ENTRY);
        assert_eq!(stored, e);
        assert_eq!(EntryStore::get(&engine, &format!("e/{ENTRY}")).unwrap(), e);
    }

    #[test]
    fn test_create_writes_primary_and_one_index_pair() {
        let engine = InMemoryEngine::new();
        let ids = FlakeGenerator::new(1);
        let mut e = entry(ENTRY, "2024-01-01T00:00:00Z");
        EntryStore::put(&engine, &ids, &mut e, false).unwrap();
        assert_eq!(engine.len(), 2);

        let owner = Uuid::parse_str(OWNER).unwrap();
        assert_eq!(IndexManager::count(&engine, owner).unwrap(), 1);
    }

    #[test]
    fn test_invalid_input_writes_nothing() {
        let engine = InMemoryEngine::new();
        let ids = FlakeGenerator::new(1);

        let mut bad_id = entry("not-a-uuid", "2024-01-01T00:00:00Z");
        let err = EntryStore::put(&engine, &ids, &mut bad_id, false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidIdentity);

        let mut bad_owner = entry(ENTRY, "2024-01-01T00:00:00Z");
        bad_owner.profile_uuid = String::new();
        assert!(matches!(
            EntryStore::put(&engine, &ids, &mut bad_owner, false),
            Err(StoreError::InvalidIdentity { .. })
        ));

        let mut bad_date = entry(ENTRY, "yesterday");
        assert!(matches!(
            EntryStore::put(&engine, &ids, &mut bad_date, false),
            Err(StoreError::InvalidTimestamp { .. })
        ));

        assert!(engine.is_empty());
    }

    #[test]
    fn test_get_missing_and_malformed() {
        let engine = InMemoryEngine::new();
        assert!(EntryStore::get(&engine, ENTRY).unwrap_err().is_not_found());
        assert!(matches!(
            EntryStore::get(&engine, "e/nope"),
            Err(StoreError::InvalidIdentity { .. })
        ));
    }

    #[test]
    fn test_get_undecodable_value() {
        let engine = InMemoryEngine::new();
        let id = Uuid::parse_str(ENTRY).unwrap();
        engine.put(&Key::entry(id).encode(), &[0xFF; 3]).unwrap();
        assert!(matches!(EntryStore::get(&engine, ENTRY), Err(StoreError::Codec { .. })));
    }

    #[test]
    fn test_list_skips_dangling_index_pairs() {
        let engine = InMemoryEngine::new();
        let ids = FlakeGenerator::new(1);
        let owner = Uuid::parse_str(OWNER).unwrap();
        let mut e = entry(ENTRY, "2024-01-01T00:00:00Z");
        EntryStore::put(&engine, &ids, &mut e, false).unwrap();

        let ghost = Key::entry(Uuid::new_v4());
        let date = e.created_at().unwrap() + chrono::Duration::days(1);
        IndexManager::add_entry(&engine, &ids, owner, date, &ghost.encode()).unwrap();

        let listed = EntryStore::list_for_owner(&engine, OWNER, 10).unwrap();
        assert_eq!(listed, vec![e.clone()]);

        // The newer dangling pair comes first but does not use up the limit.
        let listed = EntryStore::list_for_owner(&engine, OWNER, 1).unwrap();
        assert_eq!(listed, vec![e]);
    }
}
