//! Proptest strategies for feed archive domain types.
//!
//! Strategies produce well-formed values: ids are canonical UUID strings and
//! dates are RFC 3339 timestamps, so generated entries are always accepted by
//! the stores.
//!
//! # Usage
//!
//! ```no_run
//! use feedarchive_test_utils::strategies;
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn stored_entries_round_trip(entry in strategies::arb_entry()) {
//!         // store and fetch `entry`
//!     }
//! }
//! ```

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use feedarchive_types::{Comment, Entry, FeedRef, Like, OAuthProvider, OAuthUser, Profile};
use proptest::prelude::*;
use uuid::Uuid;

/// Generates a random UUID.
pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

/// Generates a login id of 1-16 characters matching `[a-z][a-z0-9_]{0,15}`.
pub fn arb_login() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

/// Generates a [`DateTime<Utc>`] between 2005-01-01 and 2030-01-01, second precision.
pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (1_104_537_600i64..1_893_456_000i64).prop_map(|secs| {
        Utc.timestamp_opt(secs, 0)
            .single()
            .unwrap_or_else(|| DateTime::<Utc>::from(std::time::UNIX_EPOCH))
    })
}

/// Generates an RFC 3339 date string such as `2024-01-01T00:00:00Z`.
pub fn arb_rfc3339_date() -> impl Strategy<Value = String> {
    arb_timestamp().prop_map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Generates an author snapshot.
pub fn arb_feed_ref() -> impl Strategy<Value = FeedRef> {
    (arb_login(), "[A-Za-z ]{0,20}", prop::sample::select(vec!["user", "group", "special"]))
        .prop_map(|(id, name, kind)| FeedRef::builder().id(id).name(name).kind(kind).build())
}

/// Generates a like.
pub fn arb_like() -> impl Strategy<Value = Like> {
    (arb_rfc3339_date(), arb_feed_ref()).prop_map(|(date, from)| Like { date, from })
}

/// Generates a comment with a UUID id.
pub fn arb_comment() -> impl Strategy<Value = Comment> {
    (arb_uuid(), arb_rfc3339_date(), ".{0,40}", arb_feed_ref()).prop_map(
        |(id, date, body, from)| {
            Comment::builder().id(id.to_string()).date(date).body(body).from(from).build()
        },
    )
}

/// Generates an entry owned by `owner`, with 0-3 likes and comments.
pub fn arb_entry_for(owner: Uuid) -> impl Strategy<Value = Entry> {
    (
        arb_uuid(),
        any::<bool>(), // carry the `e/` namespace
        arb_rfc3339_date(),
        ".{0,80}",
        arb_feed_ref(),
        proptest::collection::vec(arb_like(), 0..3),
        proptest::collection::vec(arb_comment(), 0..3),
    )
        .prop_map(move |(id, prefixed, date, body, from, likes, comments)| Entry {
            id: if prefixed { format!("e/{id}") } else { id.to_string() },
            profile_uuid: owner.to_string(),
            date,
            body,
            url: format!("https://friendfeed.com/e/{id}"),
            from,
            likes,
            comments,
        })
}

/// Generates an entry with a random owner.
pub fn arb_entry() -> impl Strategy<Value = Entry> {
    arb_uuid().prop_flat_map(arb_entry_for)
}

/// Generates a live profile, optionally carrying a remote key.
pub fn arb_profile() -> impl Strategy<Value = Profile> {
    (
        arb_uuid(),
        arb_login(),
        "[A-Za-z ]{1,20}",
        proptest::option::of("[a-z0-9]{8,16}"),
        any::<bool>(),
    )
        .prop_map(|(uuid, id, name, remote_key, private)| Profile {
            uuid: uuid.to_string(),
            id,
            name,
            kind: "user".to_string(),
            remote_key,
            private,
            ..Profile::default()
        })
}

/// Generates an unbound provider identity.
pub fn arb_oauth_user() -> impl Strategy<Value = OAuthUser> {
    (
        prop::sample::select(vec![OAuthProvider::Google, OAuthProvider::Twitter]),
        "[0-9]{4,20}",
        "[A-Za-z ]{0,20}",
    )
        .prop_map(|(provider, user_id, name)| {
            let mut user = OAuthUser::new(provider, user_id);
            user.name = name;
            user
        })
}
