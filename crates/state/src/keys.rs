//! Key encoding.
//!
//! Key formats (the tag is always the first byte, see [`TableTag`]):
//!
//! ```text
//! Table   {tag}
//! Uuid    {tag}{uuid:16}
//! Flake   {tag}{owner uuid:16}{flake:8BE}
//! Name    {tag}{utf-8 name}
//! ```
//!
//! Byte order is scan order. Flake ids are written big-endian so that numeric
//! order is byte order; the reverse index stores reverse flake ids, so a
//! forward scan over one owner's prefix yields that owner's newest entry first.

use std::fmt;

use feedarchive_types::OAuthProvider;
use snafu::Snafu;
use uuid::Uuid;

use crate::tables::TableTag;

const UUID_LEN: usize = 16;
const FLAKE_LEN: usize = 8;

/// Errors from [`Key::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum KeyError {
    /// Zero-length input.
    #[snafu(display("Empty key"))]
    Empty,

    /// Leading byte is not a known table tag.
    #[snafu(display("Unknown table tag 0x{tag:02x}"))]
    UnknownTable {
        /// The unrecognised byte.
        tag: u8,
    },

    /// Key length does not match the table's key shape.
    #[snafu(display("Key for {table} must be {expected} bytes, got {actual}"))]
    Length {
        /// Table the key belongs to.
        table: TableTag,
        /// Required length including the tag.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Name bytes are not UTF-8.
    #[snafu(display("Key for {table} is not valid UTF-8"))]
    Utf8 {
        /// Table the key belongs to.
        table: TableTag,
    },
}

/// The layout that follows a table's tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Uuid,
    Flake,
    Name,
}

fn shape_of(table: TableTag) -> Shape {
    match table {
        TableTag::Entry | TableTag::Profile | TableTag::Feedinfo => Shape::Uuid,
        TableTag::EntryIndex | TableTag::ReverseEntryIndex => Shape::Flake,
        TableTag::ProfileLogin
        | TableTag::OAuthGoogle
        | TableTag::OAuthTwitter
        | TableTag::JobHistory => Shape::Name,
    }
}

/// A typed storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A bare table tag; encodes to the table's scan prefix.
    Table(TableTag),
    /// Primary key addressed by UUID.
    Uuid {
        /// Table tag.
        table: TableTag,
        /// Entity UUID.
        id: Uuid,
    },
    /// Index key: owner plus time-ordered sub-id.
    Flake {
        /// Table tag.
        table: TableTag,
        /// Owning profile.
        owner: Uuid,
        /// Time-ordered id.
        flake: u64,
    },
    /// Lookup-by-name key.
    Name {
        /// Table tag.
        table: TableTag,
        /// Lookup name.
        name: String,
    },
}

impl Key {
    /// Primary key of an entry.
    pub fn entry(id: Uuid) -> Self {
        Self::Uuid { table: TableTag::Entry, id }
    }

    /// Newest-first index key for an entry owned by `owner`.
    pub fn reverse_index(owner: Uuid, flake: u64) -> Self {
        Self::Flake { table: TableTag::ReverseEntryIndex, owner, flake }
    }

    /// Primary key of a profile.
    pub fn profile(id: Uuid) -> Self {
        Self::Uuid { table: TableTag::Profile, id }
    }

    /// Login id -> profile uuid mapping key.
    pub fn profile_login(login: impl Into<String>) -> Self {
        Self::Name { table: TableTag::ProfileLogin, name: login.into() }
    }

    /// Feed metadata key.
    pub fn feedinfo(owner: Uuid) -> Self {
        Self::Uuid { table: TableTag::Feedinfo, id: owner }
    }

    /// Identity binding key for a provider account.
    pub fn oauth(provider: OAuthProvider, user_id: impl Into<String>) -> Self {
        Self::Name { table: TableTag::for_provider(provider), name: user_id.into() }
    }

    /// Archive job history key.
    pub fn job_history(id: impl Into<String>) -> Self {
        Self::Name { table: TableTag::JobHistory, name: id.into() }
    }

    /// Table this key belongs to.
    pub fn table(&self) -> TableTag {
        match self {
            Self::Table(table)
            | Self::Uuid { table, .. }
            | Self::Flake { table, .. }
            | Self::Name { table, .. } => *table,
        }
    }

    /// Encodes the key to bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Table(table) => vec![table.as_u8()],
            Self::Uuid { table, id } => {
                let mut key = Vec::with_capacity(1 + UUID_LEN);
                key.push(table.as_u8());
                key.extend_from_slice(id.as_bytes());
                key
            },
            Self::Flake { table, owner, flake } => {
                let mut key = Vec::with_capacity(1 + UUID_LEN + FLAKE_LEN);
                key.push(table.as_u8());
                key.extend_from_slice(owner.as_bytes());
                key.extend_from_slice(&flake.to_be_bytes());
                key
            },
            Self::Name { table, name } => {
                let mut key = Vec::with_capacity(1 + name.len());
                key.push(table.as_u8());
                key.extend_from_slice(name.as_bytes());
                key
            },
        }
    }

    /// Decodes bytes produced by [`Key::encode`].
    ///
    /// A single tag byte decodes to [`Key::Table`].
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] for empty input, an unknown tag, a length that does
    /// not fit the table's shape, or a non-UTF-8 name.
    pub fn decode(bytes: &[u8]) -> Result<Self, KeyError> {
        let (&tag, rest) = bytes.split_first().ok_or(KeyError::Empty)?;
        let table = TableTag::from_u8(tag).ok_or(KeyError::UnknownTable { tag })?;
        if rest.is_empty() {
            return Ok(Self::Table(table));
        }

        match shape_of(table) {
            Shape::Uuid => {
                let id: [u8; UUID_LEN] = rest.try_into().map_err(|_| KeyError::Length {
                    table,
                    expected: 1 + UUID_LEN,
                    actual: bytes.len(),
                })?;
                Ok(Self::Uuid { table, id: Uuid::from_bytes(id) })
            },
            Shape::Flake => {
                if rest.len() != UUID_LEN + FLAKE_LEN {
                    return Err(KeyError::Length {
                        table,
                        expected: 1 + UUID_LEN + FLAKE_LEN,
                        actual: bytes.len(),
                    });
                }
                let (owner, flake) = rest.split_at(UUID_LEN);
                let owner = Uuid::from_slice(owner).map_err(|_| KeyError::Length {
                    table,
                    expected: 1 + UUID_LEN + FLAKE_LEN,
                    actual: bytes.len(),
                })?;
                let mut flake_bytes = [0u8; FLAKE_LEN];
                flake_bytes.copy_from_slice(flake);
                Ok(Self::Flake { table, owner, flake: u64::from_be_bytes(flake_bytes) })
            },
            Shape::Name => {
                let name = std::str::from_utf8(rest).map_err(|_| KeyError::Utf8 { table })?;
                Ok(Self::Name { table, name: name.to_string() })
            },
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(table) => write!(f, "{table}"),
            Self::Uuid { table, id } => write!(f, "{table}/{id}"),
            Self::Flake { table, owner, flake } => write!(f, "{table}/{owner}/{flake:016x}"),
            Self::Name { table, name } => write!(f, "{table}/{name}"),
        }
    }
}

/// Scan prefix covering every key of `table`.
pub fn table_prefix(table: TableTag) -> [u8; 1] {
    [table.as_u8()]
}

/// Scan prefix covering one owner's newest-first index.
///
/// Format: `{ReverseEntryIndex}{owner uuid:16}`
pub fn owner_index_prefix(owner: Uuid) -> [u8; 1 + UUID_LEN] {
    let mut prefix = [0u8; 1 + UUID_LEN];
    prefix[0] = TableTag::ReverseEntryIndex.as_u8();
    prefix[1..].copy_from_slice(owner.as_bytes());
    prefix
}
