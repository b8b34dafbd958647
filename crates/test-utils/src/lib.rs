//! Shared test utilities for the feed archive crates.
//!
//! - [`TestDir`] - Managed temporary directory for redb files
//! - [`FaultyEngine`] - Engine wrapper that fails chosen writes and iterator steps
//! - [`strategies`] - Proptest generators for entries, profiles and identities

#![deny(unsafe_code)]

mod fault_injector;
pub mod strategies;
mod test_dir;

pub use fault_injector::{Fault, FaultyEngine};
pub use test_dir::TestDir;
