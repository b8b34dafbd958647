//! Store handle bundling an engine with the shared id generator.

use std::sync::Arc;

use feedarchive_store::{KvEngine, open_engine};
use feedarchive_types::{
    Comment, Entry, Feedinfo, FlakeGenerator, JobHistory, OAuthProvider, OAuthUser, Profile,
    config::StoreConfig,
};
use snafu::ResultExt;
use tracing::info;

use crate::entry::EntryStore;
use crate::error::{ConfigSnafu, EngineSnafu, Result};
use crate::feedinfo::FeedinfoStore;
use crate::indexes::flatten_scan_error;
use crate::interactions::Interactions;
use crate::job_history::JobHistoryStore;
use crate::keys::Key;
use crate::oauth::IdentityBinder;
use crate::profile::ProfileStore;
use crate::scan::{ScanControl, ScanError, forward_scan};

/// A feed archive store.
///
/// Cheap to clone; clones share the engine and the id generator, so index
/// keys written through any clone never collide.
///
/// # Example
///
/// ```
/// use feedarchive_state::FeedStore;
/// use feedarchive_store::InMemoryEngine;
/// use feedarchive_types::Entry;
///
/// let store = FeedStore::new(std::sync::Arc::new(InMemoryEngine::new()));
/// let mut entry = Entry {
///     id: "e/0b6c3f2e-2222-4b4b-9d9d-000000000002".to_string(),
///     profile_uuid: "6f1b2f6c-1111-4a4a-8c8c-000000000001".to_string(),
///     date: "2024-01-01T00:00:00Z".to_string(),
///     ..Entry::default()
/// };
/// store.put_entry(&mut entry, false)?;
/// let listed = store.list_entries("6f1b2f6c-1111-4a4a-8c8c-000000000001", 10)?;
/// assert_eq!(listed, vec![entry]);
/// # Ok::<(), feedarchive_state::StoreError>(())
/// ```
#[derive(Clone)]
pub struct FeedStore {
    engine: Arc<dyn KvEngine>,
    ids: Arc<FlakeGenerator>,
}

impl FeedStore {
    /// Wraps `engine` with an entropy-seeded id generator.
    pub fn new(engine: Arc<dyn KvEngine>) -> Self {
        Self::with_id_generator(engine, Arc::new(FlakeGenerator::from_entropy()))
    }

    /// Wraps `engine` with an existing id generator.
    pub fn with_id_generator(engine: Arc<dyn KvEngine>, ids: Arc<FlakeGenerator>) -> Self {
        Self { engine, ids }
    }

    /// Validates `config` and opens the engine it describes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` for an invalid configuration and
    /// `StoreError::Engine` if the engine cannot be opened.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate().context(ConfigSnafu)?;
        let engine = open_engine(&config.engine).context(EngineSnafu)?;
        let ids = match config.ids.worker_id {
            Some(worker) => FlakeGenerator::new(worker),
            None => FlakeGenerator::from_entropy(),
        };
        info!(
            backend = ?config.engine.backend,
            worker_id = ids.worker_id(),
            "Opened feed store"
        );
        Ok(Self::with_id_generator(engine, Arc::new(ids)))
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<dyn KvEngine> {
        &self.engine
    }

    /// The shared id generator.
    pub fn ids(&self) -> &Arc<FlakeGenerator> {
        &self.ids
    }

    /// See [`EntryStore::put`].
    ///
    /// # Errors
    ///
    /// As [`EntryStore::put`].
    pub fn put_entry(&self, entry: &mut Entry, update: bool) -> Result<Key> {
        EntryStore::put(&*self.engine, &self.ids, entry, update)
    }

    /// See [`EntryStore::get`].
    ///
    /// # Errors
    ///
    /// As [`EntryStore::get`].
    pub fn get_entry(&self, id: &str) -> Result<Entry> {
        EntryStore::get(&*self.engine, id)
    }

    /// See [`EntryStore::list_for_owner`].
    ///
    /// # Errors
    ///
    /// As [`EntryStore::list_for_owner`].
    pub fn list_entries(&self, owner: &str, limit: usize) -> Result<Vec<Entry>> {
        EntryStore::list_for_owner(&*self.engine, owner, limit)
    }

    /// See [`ProfileStore::update`].
    ///
    /// # Errors
    ///
    /// As [`ProfileStore::update`].
    pub fn update_profile(&self, profile: &mut Profile) -> Result<()> {
        ProfileStore::update(&*self.engine, profile)
    }

    /// See [`ProfileStore::get`].
    ///
    /// # Errors
    ///
    /// As [`ProfileStore::get`].
    pub fn get_profile(&self, login: &str) -> Result<Profile> {
        ProfileStore::get(&*self.engine, login)
    }

    /// See [`ProfileStore::get_by_uuid`].
    ///
    /// # Errors
    ///
    /// As [`ProfileStore::get_by_uuid`].
    pub fn get_profile_by_uuid(&self, uuid: &str) -> Result<Profile> {
        ProfileStore::get_by_uuid(&*self.engine, uuid)
    }

    /// See [`FeedinfoStore::save`].
    ///
    /// # Errors
    ///
    /// As [`FeedinfoStore::save`].
    pub fn save_feedinfo(&self, uuid: &str, info: &mut Feedinfo) -> Result<()> {
        FeedinfoStore::save(&*self.engine, uuid, info)
    }

    /// See [`FeedinfoStore::get`].
    ///
    /// # Errors
    ///
    /// As [`FeedinfoStore::get`].
    pub fn get_feedinfo(&self, uuid: &str) -> Result<Feedinfo> {
        FeedinfoStore::get(&*self.engine, uuid)
    }

    /// See [`JobHistoryStore::get`].
    ///
    /// # Errors
    ///
    /// As [`JobHistoryStore::get`].
    pub fn get_archive_history(&self, id: &str) -> Result<JobHistory> {
        JobHistoryStore::get(&*self.engine, id)
    }

    /// See [`JobHistoryStore::save`].
    ///
    /// # Errors
    ///
    /// As [`JobHistoryStore::save`].
    pub fn save_archive_history(&self, job: &JobHistory) -> Result<()> {
        JobHistoryStore::save(&*self.engine, job)
    }

    /// See [`IdentityBinder::provider`].
    ///
    /// # Errors
    ///
    /// As [`IdentityBinder::provider`].
    pub fn provider(&self, name: &str) -> Result<OAuthProvider> {
        IdentityBinder::provider(name)
    }

    /// See [`IdentityBinder::resolve`].
    ///
    /// # Errors
    ///
    /// As [`IdentityBinder::resolve`].
    pub fn resolve_identity(
        &self,
        provider: OAuthProvider,
        user_id: &str,
    ) -> Result<(Key, Option<OAuthUser>)> {
        IdentityBinder::resolve(&*self.engine, provider, user_id)
    }

    /// See [`IdentityBinder::upsert`].
    ///
    /// # Errors
    ///
    /// As [`IdentityBinder::upsert`].
    pub fn upsert_identity(&self, record: &mut OAuthUser) -> Result<Key> {
        IdentityBinder::upsert(&*self.engine, record)
    }

    /// See [`IdentityBinder::bind`].
    ///
    /// # Errors
    ///
    /// As [`IdentityBinder::bind`].
    pub fn bind_identity(&self, record: &OAuthUser) -> Result<OAuthUser> {
        IdentityBinder::bind(&*self.engine, record)
    }

    /// See [`Interactions::like`].
    ///
    /// # Errors
    ///
    /// As [`Interactions::like`].
    pub fn like(&self, profile: &Profile, entry: &mut Entry) -> Result<Option<Key>> {
        Interactions::like(&*self.engine, &self.ids, profile, entry)
    }

    /// See [`Interactions::delete_like`].
    ///
    /// # Errors
    ///
    /// As [`Interactions::delete_like`].
    pub fn delete_like(&self, profile: &Profile, entry: &mut Entry) -> Result<Option<Key>> {
        Interactions::delete_like(&*self.engine, &self.ids, profile, entry)
    }

    /// See [`Interactions::comment`].
    ///
    /// # Errors
    ///
    /// As [`Interactions::comment`].
    pub fn comment(&self, entry: &mut Entry, comment: Comment) -> Result<Key> {
        Interactions::comment(&*self.engine, &self.ids, entry, comment)
    }

    /// See [`Interactions::delete_comment`].
    ///
    /// # Errors
    ///
    /// As [`Interactions::delete_comment`].
    pub fn delete_comment(&self, entry: &mut Entry, comment_id: &str) -> Result<Option<Key>> {
        Interactions::delete_comment(&*self.engine, &self.ids, entry, comment_id)
    }

    /// Runs [`forward_scan`] over this store's engine.
    ///
    /// # Errors
    ///
    /// As [`forward_scan`].
    pub fn scan<F, E>(&self, prefix: &[u8], callback: F) -> std::result::Result<usize, ScanError<E>>
    where
        F: FnMut(usize, &[u8], &[u8]) -> std::result::Result<ScanControl, E>,
        E: std::error::Error + 'static,
    {
        forward_scan(&*self.engine, prefix, callback)
    }

    /// Counts the pairs under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Engine` if the scan fails.
    pub fn count(&self, prefix: &[u8]) -> Result<usize> {
        self.scan(prefix, |_, _, _| Ok(ScanControl::Continue)).map_err(flatten_scan_error)
    }
}

impl std::fmt::Debug for FeedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedStore")
            .field("worker_id", &self.ids.worker_id())
            .finish_non_exhaustive()
    }
}
