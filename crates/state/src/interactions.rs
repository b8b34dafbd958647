//! Likes and comments.
//!
//! Each operation edits the caller's copy of the entry and persists it with
//! `EntryStore::put(.., update = true)`. The read-modify-write is not fenced:
//! two concurrent edits of one entry race, and the later `put` replaces the
//! earlier one.

use chrono::{SecondsFormat, Utc};
use feedarchive_store::KvEngine;
use feedarchive_types::{Comment, Entry, FlakeGenerator, Like, Profile};
use tracing::{debug, warn};

use crate::entry::EntryStore;
use crate::error::{PermissionDeniedSnafu, Result};
use crate::keys::Key;

/// Like and comment operations.
///
/// Each returns the entry's primary key when a write happened and `None` for
/// a no-op.
pub struct Interactions;

impl Interactions {
    /// Adds a like by `profile` unless one by the same author id exists.
    ///
    /// # Errors
    ///
    /// Returns any error from [`EntryStore::put`].
    pub fn like<E: KvEngine + ?Sized>(
        engine: &E,
        ids: &FlakeGenerator,
        profile: &Profile,
        entry: &mut Entry,
    ) -> Result<Option<Key>> {
        if entry.likes.iter().any(|like| like.from.id == profile.id) {
            debug!(entry_id = %entry.id, author = %profile.id, "Entry already liked");
            return Ok(None);
        }

        entry.likes.push(Like {
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            from: profile.to_feed_ref(),
        });
        EntryStore::put(engine, ids, entry, true).map(Some)
    }

    /// Removes the like by `profile`, keeping the order of the others.
    ///
    /// # Errors
    ///
    /// Returns any error from [`EntryStore::put`].
    pub fn delete_like<E: KvEngine + ?Sized>(
        engine: &E,
        ids: &FlakeGenerator,
        profile: &Profile,
        entry: &mut Entry,
    ) -> Result<Option<Key>> {
        let Some(pos) = entry.likes.iter().position(|like| like.from.id == profile.id) else {
            return Ok(None);
        };
        entry.likes.remove(pos);
        EntryStore::put(engine, ids, entry, true).map(Some)
    }

    /// Adds `comment`, or replaces the comment with the same id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PermissionDenied` if a comment with this id exists
    /// and was written by another author; the entry is left untouched. Any
    /// error from [`EntryStore::put`] is passed through.
    pub fn comment<E: KvEngine + ?Sized>(
        engine: &E,
        ids: &FlakeGenerator,
        entry: &mut Entry,
        comment: Comment,
    ) -> Result<Key> {
        match entry.comments.iter_mut().find(|c| c.id == comment.id) {
            Some(existing) if existing.from.id != comment.from.id => {
                warn!(
                    entry_id = %entry.id,
                    comment_id = %comment.id,
                    author = %comment.from.id,
                    owner = %existing.from.id,
                    "Rejected edit of another author's comment"
                );
                return PermissionDeniedSnafu {
                    comment_id: comment.id,
                    author: comment.from.id,
                }
                .fail();
            },
            Some(existing) => *existing = comment,
            None => entry.comments.push(comment),
        }
        EntryStore::put(engine, ids, entry, true)
    }

    /// Removes the comment with `comment_id`, keeping the order of the others.
    ///
    /// # Errors
    ///
    /// Returns any error from [`EntryStore::put`].
    pub fn delete_comment<E: KvEngine + ?Sized>(
        engine: &E,
        ids: &FlakeGenerator,
        entry: &mut Entry,
        comment_id: &str,
    ) -> Result<Option<Key>> {
        let Some(pos) = entry.comments.iter().position(|c| c.id == comment_id) else {
            return Ok(None);
        };
        entry.comments.remove(pos);
        EntryStore::put(engine, ids, entry, true).map(Some)
    }
}
