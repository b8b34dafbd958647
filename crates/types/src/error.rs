//! Machine-readable error codes.
//!
//! Each store error maps to an [`ErrorCode`] with a stable numeric value and a
//! retryability classification, so callers (CLI, API layer, archive workers)
//! can decide what to do without matching on concrete error types.

/// Machine-readable error codes for programmatic error handling.
///
/// | Range     | Domain     | Examples                                   |
/// |-----------|------------|--------------------------------------------|
/// | 1000–1099 | Engine     | Open failure, read/write failure           |
/// | 1100–1199 | Encoding   | Key layout, value codec                    |
/// | 3000–3099 | Entities   | Not found, already exists, partial index   |
/// | 3100–3199 | Identity   | Malformed ids, binding conflicts           |
/// | 3200–3299 | Access     | Permission denied                          |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    /// Engine could not be opened.
    EngineOpen = 1000,
    /// Engine get/put/iterator failed.
    EngineOperation = 1001,
    /// Stored key does not match the expected layout.
    KeyEncoding = 1100,
    /// Value could not be encoded or decoded.
    Serialization = 1101,
    /// Record not found (including soft-deleted profiles).
    NotFound = 3000,
    /// Creation hit an existing primary key.
    AlreadyExists = 3001,
    /// Primary record written, index entry missing.
    IndexIncomplete = 3002,
    /// Malformed identifier or timestamp in the request.
    InvalidIdentity = 3100,
    /// Identity binding points to a different profile.
    IdentityMismatch = 3101,
    /// Bind requested for an identity with no stored record.
    NoPriorIdentity = 3102,
    /// Provider name is not supported.
    UnknownProvider = 3103,
    /// Caller may not modify the target record.
    PermissionDenied = 3200,
}

impl ErrorCode {
    /// Returns the numeric code value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Converts a numeric code to an `ErrorCode`, returning `None` for unknown values.
    #[must_use]
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1000 => Some(Self::EngineOpen),
            1001 => Some(Self::EngineOperation),
            1100 => Some(Self::KeyEncoding),
            1101 => Some(Self::Serialization),
            3000 => Some(Self::NotFound),
            3001 => Some(Self::AlreadyExists),
            3002 => Some(Self::IndexIncomplete),
            3100 => Some(Self::InvalidIdentity),
            3101 => Some(Self::IdentityMismatch),
            3102 => Some(Self::NoPriorIdentity),
            3103 => Some(Self::UnknownProvider),
            3200 => Some(Self::PermissionDenied),
            _ => None,
        }
    }

    /// Whether this error may succeed on a later attempt without changing the request.
    ///
    /// An incomplete index is retryable: repeating the index write repairs it.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::EngineOperation | Self::IndexIncomplete)
    }
}
