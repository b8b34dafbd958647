//! Feed metadata storage operations.

use feedarchive_store::KvEngine;
use feedarchive_types::{Feedinfo, decode, encode, validation::parse_uuid};
use snafu::ResultExt;
use tracing::debug;
use uuid::Uuid;

use crate::error::{CodecSnafu, EngineSnafu, InvalidIdentitySnafu, NotFoundSnafu, Result};
use crate::keys::Key;

/// Feed metadata storage operations, keyed by the owning profile's UUID.
pub struct FeedinfoStore;

impl FeedinfoStore {
    /// Stores feed metadata for `uuid`, keeping a previously stored remote key
    /// when `info` has none.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` for a malformed uuid, and engine or
    /// codec errors from the reads and writes.
    pub fn save<E: KvEngine + ?Sized>(engine: &E, uuid: &str, info: &mut Feedinfo) -> Result<()> {
        let owner = parse_uuid("uuid", uuid).context(InvalidIdentitySnafu)?;

        if info.remote_key().is_none() {
            if let Some(prior) = Self::load(engine, owner)? {
                info.remote_key = prior.remote_key;
            }
        }

        let value = encode(&*info).context(CodecSnafu)?;
        engine.put(&Key::feedinfo(owner).encode(), &value).context(EngineSnafu)?;
        debug!(uuid = %owner, feed = %info.id, "Stored feedinfo");
        Ok(())
    }

    /// Fetches feed metadata for `uuid`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` for a malformed uuid and
    /// `StoreError::NotFound` if nothing is stored.
    pub fn get<E: KvEngine + ?Sized>(engine: &E, uuid: &str) -> Result<Feedinfo> {
        let owner = parse_uuid("uuid", uuid).context(InvalidIdentitySnafu)?;
        Self::load(engine, owner)?
            .ok_or_else(|| NotFoundSnafu { kind: "feedinfo", id: uuid }.build())
    }

    fn load<E: KvEngine + ?Sized>(engine: &E, owner: Uuid) -> Result<Option<Feedinfo>> {
        match engine.get(&Key::feedinfo(owner).encode()).context(EngineSnafu)? {
            Some(bytes) => Ok(Some(decode(&bytes).context(CodecSnafu)?)),
            None => Ok(None),
        }
    }
}
