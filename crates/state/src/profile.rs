//! Profile storage operations.
//!
//! A profile is stored under its UUID. A second pair under the `ProfileLogin`
//! table maps the login id to that UUID and is rewritten on every update.

use feedarchive_store::KvEngine;
use feedarchive_types::{
    Profile, decode, encode,
    validation::{parse_uuid, validate_name},
};
use snafu::ResultExt;
use tracing::debug;
use uuid::Uuid;

use crate::error::{CodecSnafu, EngineSnafu, InvalidIdentitySnafu, NotFoundSnafu, Result};
use crate::keys::Key;

/// Profile storage operations.
pub struct ProfileStore;

impl ProfileStore {
    /// Writes the login mapping and the profile record.
    ///
    /// If `profile` carries no remote key, the remote key of the stored profile
    /// (if any) is copied into it before writing, so an update that omits the
    /// key never clears it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` for a malformed uuid or login id,
    /// and engine or codec errors from the reads and writes.
    pub fn update<E: KvEngine + ?Sized>(engine: &E, profile: &mut Profile) -> Result<()> {
        let uuid = parse_uuid("uuid", &profile.uuid).context(InvalidIdentitySnafu)?;
        validate_name("id", &profile.id).context(InvalidIdentitySnafu)?;

        let mapping = encode(&uuid).context(CodecSnafu)?;
        let login_key = Key::profile_login(profile.id.as_str());
        engine.put(&login_key.encode(), &mapping).context(EngineSnafu)?;

        if profile.remote_key().is_none() {
            if let Some(prior) = Self::load(engine, uuid)? {
                profile.remote_key = prior.remote_key;
            }
        }

        let value = encode(&*profile).context(CodecSnafu)?;
        engine.put(&Key::profile(uuid).encode(), &value).context(EngineSnafu)?;
        debug!(uuid = %uuid, login = %profile.id, "Stored profile");
        Ok(())
    }

    /// Fetches a profile by login id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the login is unmapped, the mapping is
    /// empty, the record is missing, or the profile is soft-deleted.
    pub fn get<E: KvEngine + ?Sized>(engine: &E, login: &str) -> Result<Profile> {
        validate_name("id", login).context(InvalidIdentitySnafu)?;
        let not_found = || NotFoundSnafu { kind: "profile", id: login }.build();

        let mapping = engine.get(&Key::profile_login(login).encode()).context(EngineSnafu)?;
        let mapping = match mapping {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(not_found()),
        };
        let uuid: Uuid = decode(&mapping).context(CodecSnafu)?;

        Self::load_live(engine, uuid)?.ok_or_else(not_found)
    }

    /// Fetches a profile by UUID, applying the same soft-delete rule as [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` for a malformed uuid and
    /// `StoreError::NotFound` if the record is missing or soft-deleted.
    pub fn get_by_uuid<E: KvEngine + ?Sized>(engine: &E, uuid: &str) -> Result<Profile> {
        let parsed = parse_uuid("uuid", uuid).context(InvalidIdentitySnafu)?;
        Self::load_live(engine, parsed)?
            .ok_or_else(|| NotFoundSnafu { kind: "profile", id: uuid }.build())
    }

    fn load_live<E: KvEngine + ?Sized>(engine: &E, uuid: Uuid) -> Result<Option<Profile>> {
        Ok(Self::load(engine, uuid)?.filter(|profile| {
            if profile.deleted {
                debug!(uuid = %uuid, "Profile is soft-deleted");
            }
            !profile.deleted
        }))
    }

    /// Raw read by UUID, soft-deleted profiles included.
    fn load<E: KvEngine + ?Sized>(engine: &E, uuid: Uuid) -> Result<Option<Profile>> {
        match engine.get(&Key::profile(uuid).encode()).context(EngineSnafu)? {
            Some(bytes) => Ok(Some(decode(&bytes).context(CodecSnafu)?)),
            None => Ok(None),
        }
    }
}
