//! Table tags.
//!
//! Every key starts with exactly one tag byte, so the keys of two tables can
//! never be prefixes of one another and a scan over one tag never sees another
//! table's pairs.

use std::fmt;

use feedarchive_types::OAuthProvider;

/// Leading byte of every stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TableTag {
    /// Entry primary records: `{tag}{entry uuid:16}`.
    Entry = 0x01,
    /// Forward chronological index. Reserved; never written.
    EntryIndex = 0x02,
    /// Newest-first index: `{tag}{owner uuid:16}{reverse flake:8BE}` -> entry primary key.
    ReverseEntryIndex = 0x03,
    /// Profile primary records: `{tag}{profile uuid:16}`.
    Profile = 0x04,
    /// Login id -> profile uuid: `{tag}{login id}`.
    ProfileLogin = 0x05,
    /// Feed metadata: `{tag}{owner uuid:16}`.
    Feedinfo = 0x06,
    /// Google identities: `{tag}{provider user id}`.
    OAuthGoogle = 0x07,
    /// Twitter identities: `{tag}{provider user id}`.
    OAuthTwitter = 0x08,
    /// Archive job history: `{tag}{job id}`.
    JobHistory = 0x09,
}

impl TableTag {
    /// Every tag, in byte order.
    pub const ALL: [Self; 9] = [
        Self::Entry,
        Self::EntryIndex,
        Self::ReverseEntryIndex,
        Self::Profile,
        Self::ProfileLogin,
        Self::Feedinfo,
        Self::OAuthGoogle,
        Self::OAuthTwitter,
        Self::JobHistory,
    ];

    /// The tag byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Looks up a tag by its byte.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_u8() == byte)
    }

    /// Human-readable table name used in logs and key display.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::EntryIndex => "entry_index",
            Self::ReverseEntryIndex => "reverse_entry_index",
            Self::Profile => "profile",
            Self::ProfileLogin => "profile_login",
            Self::Feedinfo => "feedinfo",
            Self::OAuthGoogle => "oauth_google",
            Self::OAuthTwitter => "oauth_twitter",
            Self::JobHistory => "job_history",
        }
    }

    /// The identity table for a provider.
    #[must_use]
    pub const fn for_provider(provider: OAuthProvider) -> Self {
        match provider {
            OAuthProvider::Google => Self::OAuthGoogle,
            OAuthProvider::Twitter => Self::OAuthTwitter,
        }
    }
}

impl fmt::Display for TableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
