//! Entity definitions for the feed archive.
//!
//! These are the records persisted by the state layer:
//! - [`Entry`] with its nested [`Like`] and [`Comment`] collections
//! - [`Profile`] and [`Feedinfo`] (carry an optional remote key)
//! - [`OAuthUser`] third-party identity bindings
//! - [`JobHistory`] archive job records
//!
//! Identifier fields are kept as text, the way they arrive from the archiver.
//! The state layer validates and parses them before computing keys.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use uuid::Uuid;

/// Namespace prefix carried by entry ids coming from the feed service.
pub const ENTRY_ID_PREFIX: &str = "e/";

// ============================================================================
// Entries
// ============================================================================

/// Snapshot of an author (user, group or service feed) embedded in other records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct FeedRef {
    /// Login id of the feed, e.g. `alice`.
    #[builder(into)]
    pub id: String,
    /// Display name at the time the snapshot was taken.
    #[builder(into, default)]
    pub name: String,
    /// Feed type: `user`, `group`, `special`.
    #[serde(rename = "type")]
    #[builder(into, default)]
    pub kind: String,
}

/// A like on an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    /// RFC 3339 time the like was recorded.
    pub date: String,
    /// Who liked the entry.
    pub from: FeedRef,
}

/// A comment on an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct Comment {
    /// Comment id, unique within its entry.
    #[builder(into)]
    pub id: String,
    /// RFC 3339 time of the comment.
    #[builder(into, default)]
    pub date: String,
    /// Comment text.
    #[builder(into, default)]
    pub body: String,
    /// Comment author.
    pub from: FeedRef,
}

/// A feed entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry UUID, optionally carrying the [`ENTRY_ID_PREFIX`] namespace.
    pub id: String,
    /// UUID of the owning profile.
    pub profile_uuid: String,
    /// RFC 3339 creation time.
    pub date: String,
    /// Entry text.
    pub body: String,
    /// Permalink.
    pub url: String,
    /// Author snapshot.
    pub from: FeedRef,
    /// Likes, in the order they were added.
    pub likes: Vec<Like>,
    /// Comments, in the order they were added.
    pub comments: Vec<Comment>,
}

impl Entry {
    /// Returns the entry id without the [`ENTRY_ID_PREFIX`] namespace.
    pub fn canonical_id(&self) -> &str {
        strip_entry_prefix(&self.id)
    }

    /// Parses the creation date.
    ///
    /// # Errors
    ///
    /// Returns a [`chrono::ParseError`] if `date` is not an RFC 3339 timestamp.
    pub fn created_at(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.date).map(|d| d.with_timezone(&Utc))
    }
}

/// Strips the [`ENTRY_ID_PREFIX`] namespace from an entry id, if present.
pub fn strip_entry_prefix(id: &str) -> &str {
    id.strip_prefix(ENTRY_ID_PREFIX).unwrap_or(id)
}

// ============================================================================
// Profiles and feeds
// ============================================================================

/// A user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Internal UUID.
    pub uuid: String,
    /// Login id on the feed service.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Feed type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Profile description.
    pub description: String,
    /// Key of the matching record in the remote archive, once known.
    pub remote_key: Option<String>,
    /// Whether the feed is private.
    pub private: bool,
    /// Soft-delete marker. Deleted profiles are reported as not found.
    pub deleted: bool,
}

impl Profile {
    /// Returns the remote key if set to a non-empty value.
    pub fn remote_key(&self) -> Option<&str> {
        self.remote_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Builds the author snapshot embedded in likes and comments.
    pub fn to_feed_ref(&self) -> FeedRef {
        FeedRef { id: self.id.clone(), name: self.name.clone(), kind: self.kind.clone() }
    }
}

/// Feed metadata keyed by the owning profile's UUID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedinfo {
    /// UUID of the owning profile.
    pub uuid: String,
    /// Feed login id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Feed type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Feed description.
    pub description: String,
    /// Key of the matching record in the remote archive, once known.
    pub remote_key: Option<String>,
}

impl Feedinfo {
    /// Returns the remote key if set to a non-empty value.
    pub fn remote_key(&self) -> Option<&str> {
        self.remote_key.as_deref().filter(|k| !k.is_empty())
    }
}

// ============================================================================
// Third-party identities
// ============================================================================

/// Error returned when a provider name has no matching [`OAuthProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("unknown OAuth provider: {name}"))]
pub struct UnknownProviderError {
    /// The rejected provider name.
    pub name: String,
}

/// Supported third-party identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OAuthProvider {
    /// Google accounts.
    Google,
    /// Twitter accounts.
    Twitter,
}

impl OAuthProvider {
    /// Returns the lowercase provider name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Twitter => "twitter",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "twitter" => Ok(Self::Twitter),
            other => Err(UnknownProviderError { name: other.to_string() }),
        }
    }
}

/// Binding between a provider account and an internal profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthUser {
    /// Identity provider.
    pub provider: OAuthProvider,
    /// Account id on the provider side.
    pub user_id: String,
    /// Bound internal profile UUID, `None` while unbound.
    pub uuid: Option<Uuid>,
    /// Provider display name.
    pub name: String,
    /// Provider email, may be empty.
    pub email: String,
}

impl OAuthUser {
    /// Creates an unbound record for a provider account.
    pub fn new(provider: OAuthProvider, user_id: impl Into<String>) -> Self {
        Self {
            provider,
            user_id: user_id.into(),
            uuid: None,
            name: String::new(),
            email: String::new(),
        }
    }

    /// Sets the bound UUID.
    #[must_use]
    pub fn bound_to(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }
}

// ============================================================================
// Archive jobs
// ============================================================================

/// Lifecycle state of an archive job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Queued, not yet started.
    #[default]
    Pending,
    /// Fetching pages.
    Running,
    /// Finished successfully.
    Completed,
    /// Gave up; see the job state for details.
    Failed,
}

/// History of an archive job for a target feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHistory {
    /// External id: the target feed or user id, e.g. `foobar`.
    pub id: String,
    /// UUID of the profile that requested the archive.
    pub profile_uuid: String,
    /// Current status.
    pub status: JobStatus,
    /// When the job started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job last finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Number of entries stored so far.
    pub entries_archived: u64,
    /// Opaque job-state blob owned by the archiver.
    pub state: Vec<u8>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_entry_prefix() {
        assert_eq!(strip_entry_prefix("e/abc"), "abc");
        assert_eq!(strip_entry_prefix("abc"), "abc");
        assert_eq!(strip_entry_prefix("e/e/abc"), "e/abc");
        assert_eq!(strip_entry_prefix(""), "");
    }

    #[test]
    fn test_entry_created_at_parses_rfc3339() {
        let entry = Entry { date: "2024-01-01T00:00:00Z".to_string(), ..Default::default() };
        let ts = entry.created_at().expect("valid date");
        assert_eq!(ts.timestamp(), 1_704_067_200);

        let offset = Entry { date: "2024-01-01T02:00:00+02:00".to_string(), ..Default::default() };
        assert_eq!(offset.created_at().unwrap(), ts);
    }

    #[test]
    fn test_entry_created_at_rejects_garbage() {
        let entry = Entry { date: "yesterday".to_string(), ..Default::default() };
        assert!(entry.created_at().is_err());
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("google".parse::<OAuthProvider>().unwrap(), OAuthProvider::Google);
        assert_eq!("twitter".parse::<OAuthProvider>().unwrap(), OAuthProvider::Twitter);

        let err = "facebook".parse::<OAuthProvider>().unwrap_err();
        assert_eq!(err.name, "facebook");
        assert_eq!(err.to_string(), "unknown OAuth provider: facebook");
    }

    #[test]
    fn test_provider_display_matches_from_str() {
        for provider in [OAuthProvider::Google, OAuthProvider::Twitter] {
            assert_eq!(provider.to_string().parse::<OAuthProvider>().unwrap(), provider);
        }
    }

    #[test]
    fn test_remote_key_treats_empty_as_unset() {
        let mut profile = Profile::default();
        assert_eq!(profile.remote_key(), None);
        profile.remote_key = Some(String::new());
        assert_eq!(profile.remote_key(), None);
        profile.remote_key = Some("rk".to_string());
        assert_eq!(profile.remote_key(), Some("rk"));
    }

    #[test]
    fn test_profile_feed_ref_snapshot() {
        let profile = Profile {
            id: "alice".to_string(),
            name: "Alice".to_string(),
            kind: "user".to_string(),
            ..Default::default()
        };
        assert_eq!(
            profile.to_feed_ref(),
            FeedRef::builder().id("alice").name("Alice").kind("user").build()
        );
    }
}
