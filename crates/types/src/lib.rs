//! Core types for the feed archive store.
//!
//! This crate provides the foundational pieces shared by every other crate:
//! - Entity definitions (entries, profiles, feed info, identities, jobs)
//! - Postcard value codec
//! - Time-ordered id generation for index keys
//! - Configuration and identifier validation
//! - Machine-readable error codes

#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod snowflake;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use codec::{CodecError, decode, encode};
pub use error::ErrorCode;
pub use snowflake::FlakeGenerator;
pub use types::*;
pub use validation::ValidationError;
