//! Third-party identity binding.
//!
//! Each provider account is either unbound (no record, or a record without a
//! UUID) or bound to exactly one profile UUID. Once bound, the UUID can only
//! be confirmed, never replaced.
//!
//! ```text
//!              bind(u)                  bind(u) / upsert(u)
//!  Unbound ────────────────▶ Bound(u) ◀──────────────────┐
//!                               │  └──────────────────────┘
//!                               │ bind(v), upsert(v), v != u
//!                               ▼
//!                      rejected, nothing written
//! ```

use std::str::FromStr;

use feedarchive_store::KvEngine;
use feedarchive_types::{
    OAuthProvider, OAuthUser, ValidationError, decode, encode, validation::validate_name,
};
use snafu::{IntoError, ResultExt};
use tracing::{debug, info, warn};

use crate::error::{
    AlreadyBoundElsewhereSnafu, CodecSnafu, EngineSnafu, IdentityMismatchSnafu,
    InvalidIdentitySnafu, NoPriorIdentitySnafu, Result, UnknownProviderSnafu,
};
use crate::keys::Key;

/// Identity binding operations.
pub struct IdentityBinder;

impl IdentityBinder {
    /// Resolves a provider name such as `"google"`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnknownProvider` for any other name.
    pub fn provider(name: &str) -> Result<OAuthProvider> {
        OAuthProvider::from_str(name).context(UnknownProviderSnafu)
    }

    /// Looks up the stored record for a provider account. Never writes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` for an empty or malformed user id,
    /// and engine or codec errors from the read.
    pub fn resolve<E: KvEngine + ?Sized>(
        engine: &E,
        provider: OAuthProvider,
        user_id: &str,
    ) -> Result<(Key, Option<OAuthUser>)> {
        validate_name("user_id", user_id).context(InvalidIdentitySnafu)?;
        let key = Key::oauth(provider, user_id);
        let record = match engine.get(&key.encode()).context(EngineSnafu)? {
            Some(bytes) => Some(decode(&bytes).context(CodecSnafu)?),
            None => None,
        };
        Ok((key, record))
    }

    /// Writes `record` unless it would rebind the account to another UUID.
    ///
    /// A record without a UUID inherits the stored one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IdentityMismatch` if both the stored and the
    /// incoming record carry UUIDs and they differ. Nothing is written then.
    pub fn upsert<E: KvEngine + ?Sized>(engine: &E, record: &mut OAuthUser) -> Result<Key> {
        let (key, prior) = Self::resolve(engine, record.provider, &record.user_id)?;

        match (prior.and_then(|p| p.uuid), record.uuid) {
            (Some(stored), Some(incoming)) if stored != incoming => {
                warn!(
                    provider = %record.provider,
                    user_id = %record.user_id,
                    %stored,
                    %incoming,
                    "Rejected identity upsert for a different profile"
                );
                return IdentityMismatchSnafu {
                    provider: record.provider,
                    user_id: record.user_id.as_str(),
                    stored,
                    incoming,
                }
                .fail();
            },
            (Some(stored), None) => record.uuid = Some(stored),
            _ => {},
        }

        Self::write(engine, &key, record)?;
        debug!(key = %key, bound = record.uuid.is_some(), "Stored identity");
        Ok(key)
    }

    /// Binds a stored provider account to `record.uuid` and returns the
    /// resulting stored record.
    ///
    /// A first-time bind stores `record` as given, refreshing the provider's
    /// name and email. Binding an account to the UUID it already has is a
    /// no-op that keeps the stored record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidIdentity` if `record` has no UUID,
    /// `StoreError::NoPriorIdentity` if the account was never stored, and
    /// `StoreError::AlreadyBoundElsewhere` if it is bound to another UUID.
    pub fn bind<E: KvEngine + ?Sized>(engine: &E, record: &OAuthUser) -> Result<OAuthUser> {
        let incoming = record.uuid.ok_or_else(|| {
            InvalidIdentitySnafu.into_error(ValidationError {
                field: "uuid".to_string(),
                constraint: "must be set to bind an identity".to_string(),
            })
        })?;

        let (key, prior) = Self::resolve(engine, record.provider, &record.user_id)?;
        let Some(prior) = prior else {
            warn!(key = %key, "Bind requested for an unknown identity");
            return NoPriorIdentitySnafu {
                provider: record.provider,
                user_id: record.user_id.as_str(),
            }
            .fail();
        };

        match prior.uuid {
            Some(bound) if bound == incoming => {
                debug!(key = %key, "Identity already bound to this profile");
                Ok(prior)
            },
            Some(_) => {
                warn!(key = %key, requested = %incoming, "Identity already bound elsewhere");
                AlreadyBoundElsewhereSnafu {
                    provider: record.provider,
                    user_id: record.user_id.as_str(),
                }
                .fail()
            },
            None => {
                Self::write(engine, &key, record)?;
                info!(key = %key, uuid = %incoming, "Bound identity");
                Ok(record.clone())
            },
        }
    }

    fn write<E: KvEngine + ?Sized>(engine: &E, key: &Key, record: &OAuthUser) -> Result<()> {
        let value = encode(record).context(CodecSnafu)?;
        engine.put(&key.encode(), &value).context(EngineSnafu)
    }
}
