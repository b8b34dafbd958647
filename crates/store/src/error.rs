//! Error types for the key-value engines.

use feedarchive_types::ErrorCode;
use snafu::Snafu;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during engine operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The database file could not be opened or initialized.
    #[snafu(display("failed to open database at {path}: {source}"))]
    Open {
        /// Path of the database file.
        path: String,
        /// The underlying redb error.
        source: redb::Error,
    },

    /// A read, write or iterator step failed inside the backend.
    #[snafu(display("engine operation failed: {source}"))]
    Backend {
        /// The underlying redb error.
        source: redb::Error,
    },

    /// The engine refused the operation.
    #[snafu(display("engine unavailable: {reason}"))]
    Unavailable {
        /// Why the operation was refused.
        reason: String,
    },
}

impl Error {
    /// Wraps any redb error kind as [`Error::Backend`].
    pub(crate) fn backend(err: impl Into<redb::Error>) -> Self {
        Self::Backend { source: err.into() }
    }

    /// Returns the machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Open { .. } => ErrorCode::EngineOpen,
            Self::Backend { .. } | Self::Unavailable { .. } => ErrorCode::EngineOperation,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display_and_code() {
        let err = Error::Unavailable { reason: "disk detached".to_string() };
        assert_eq!(err.to_string(), "engine unavailable: disk detached");
        assert_eq!(err.code(), ErrorCode::EngineOperation);
        assert!(err.code().is_retryable());
    }
}
