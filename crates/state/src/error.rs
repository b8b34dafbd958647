//! Error types for the state layer.

use feedarchive_types::{
    CodecError, ErrorCode, OAuthProvider, UnknownProviderError, ValidationError,
    config::ConfigError,
};
use snafu::Snafu;
use uuid::Uuid;

use crate::keys::{Key, KeyError};

/// Errors returned by entity store operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    /// An identifier in the request is malformed.
    #[snafu(display("Invalid identity: {source}"))]
    InvalidIdentity {
        /// The violated constraint.
        source: ValidationError,
    },

    /// An entry's creation date is not an RFC 3339 timestamp.
    #[snafu(display("Invalid timestamp {value:?}: {source}"))]
    InvalidTimestamp {
        /// The rejected date string.
        value: String,
        /// The parse failure.
        source: chrono::ParseError,
    },

    /// Serialization or deserialization failed.
    #[snafu(display("Codec error: {source}"))]
    Codec {
        /// The underlying codec error.
        source: CodecError,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    /// Underlying engine operation failed.
    #[snafu(display("Engine error: {source}"))]
    Engine {
        /// The underlying engine error.
        source: feedarchive_store::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    /// Store configuration is invalid.
    #[snafu(display("Configuration error: {source}"))]
    Config {
        /// The rejected configuration.
        source: ConfigError,
    },

    /// A stored key does not match the expected layout.
    #[snafu(display("Malformed key: {source}"))]
    Key {
        /// The key decoding failure.
        source: KeyError,
    },

    /// No record, or a soft-deleted profile.
    #[snafu(display("{kind} {id} not found"))]
    NotFound {
        /// Record kind, e.g. `entry`.
        kind: &'static str,
        /// Identifier as requested.
        id: String,
    },

    /// Creation without the update flag hit an existing primary key.
    #[snafu(display("{key} already exists"))]
    AlreadyExists {
        /// The existing primary key.
        key: Key,
    },

    /// The entry was stored but its index entry could not be written.
    ///
    /// Retrying the put with `update == false` reports `AlreadyExists`; repair
    /// the index through [`IndexManager::add_entry`](crate::IndexManager::add_entry).
    #[snafu(display("Entry {key} stored without its index entry: {source}"))]
    IndexWrite {
        /// Primary key of the persisted, unindexed entry.
        key: Key,
        /// The failed index write.
        #[snafu(source(from(StoreError, Box::new)))]
        source: Box<StoreError>,
    },

    /// Every candidate index slot for one owner and timestamp is taken.
    #[snafu(display("No free index slot for owner {owner} after {attempts} attempts"))]
    IndexSlotsExhausted {
        /// Owner whose index is full at this timestamp.
        owner: Uuid,
        /// Candidates tried.
        attempts: usize,
    },

    /// Upsert with a UUID different from the bound one.
    #[snafu(display("{provider} identity {user_id} is bound to {stored}, not {incoming}"))]
    IdentityMismatch {
        /// Provider of the identity.
        provider: OAuthProvider,
        /// Provider-side user id.
        user_id: String,
        /// UUID already bound.
        stored: Uuid,
        /// UUID in the request.
        incoming: Uuid,
    },

    /// Bind to a UUID while the identity is bound to another one.
    #[snafu(display("{provider} identity {user_id} is already bound to another profile"))]
    AlreadyBoundElsewhere {
        /// Provider of the identity.
        provider: OAuthProvider,
        /// Provider-side user id.
        user_id: String,
    },

    /// Bind requested for an identity that was never stored.
    #[snafu(display("No stored {provider} identity {user_id} to bind"))]
    NoPriorIdentity {
        /// Provider of the identity.
        provider: OAuthProvider,
        /// Provider-side user id.
        user_id: String,
    },

    /// Provider name has no matching table.
    #[snafu(display("{source}"))]
    UnknownProvider {
        /// The rejected name.
        source: UnknownProviderError,
    },

    /// A comment edit by someone other than its author.
    #[snafu(display("{author} may not edit comment {comment_id}"))]
    PermissionDenied {
        /// The comment being edited.
        comment_id: String,
        /// Author id of the rejected edit.
        author: String,
    },
}

impl StoreError {
    /// Returns the machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidIdentity { .. } | Self::InvalidTimestamp { .. } => {
                ErrorCode::InvalidIdentity
            },
            Self::Codec { .. } => ErrorCode::Serialization,
            Self::Engine { source, .. } => source.code(),
            Self::Config { .. } => ErrorCode::EngineOpen,
            Self::Key { .. } => ErrorCode::KeyEncoding,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            Self::IndexWrite { .. } | Self::IndexSlotsExhausted { .. } => {
                ErrorCode::IndexIncomplete
            },
            Self::IdentityMismatch { .. } | Self::AlreadyBoundElsewhere { .. } => {
                ErrorCode::IdentityMismatch
            },
            Self::NoPriorIdentity { .. } => ErrorCode::NoPriorIdentity,
            Self::UnknownProvider { .. } => ErrorCode::UnknownProvider,
            Self::PermissionDenied { .. } => ErrorCode::PermissionDenied,
        }
    }

    /// Whether this is a [`StoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StoreError>;
