//! Entity stores for the feed archive.
//!
//! This crate sits on top of the ordered key-value engines in
//! `feedarchive-store` and provides:
//!
//! - Binary key layout: one table tag byte followed by a typed payload
//! - Entry storage with a newest-first per-owner index
//! - Profiles with login lookup, remote-key preservation and soft delete
//! - Feed metadata and archive job history
//! - Third-party identity binding with one-way UUID binding
//! - Likes and comments on stored entries
//! - Prefix-bounded forward scans with early stop
//!
//! [`FeedStore`] bundles an engine with the shared id generator and exposes
//! every operation; the per-entity stores are usable directly against any
//! [`KvEngine`](feedarchive_store::KvEngine).

#![deny(unsafe_code)]
// redb::Error is large; boxing it would only move the allocation
#![allow(clippy::result_large_err)]

mod entry;
mod error;
mod feedinfo;
mod indexes;
mod interactions;
mod job_history;
mod keys;
mod oauth;
mod profile;
mod scan;
mod store;
pub mod tables;

pub use entry::EntryStore;
pub use error::{Result, StoreError};
pub use feedinfo::FeedinfoStore;
pub use indexes::IndexManager;
pub use interactions::Interactions;
pub use job_history::JobHistoryStore;
pub use keys::{Key, KeyError, owner_index_prefix, table_prefix};
pub use oauth::IdentityBinder;
pub use profile::ProfileStore;
pub use scan::{ScanControl, ScanError, forward_scan};
pub use store::FeedStore;
pub use tables::TableTag;
