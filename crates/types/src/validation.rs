//! Identifier validation at the store boundary.
//!
//! Entity records carry their identifiers as text. Before any key is computed
//! the state layer runs them through these checks:
//!
//! - UUID fields must parse as a UUID (hyphenated or simple form).
//! - Lookup names (login ids, job ids, provider user ids) must be non-empty,
//!   at most [`MAX_NAME_BYTES`] bytes, and free of control characters.

use std::fmt;

use uuid::Uuid;

/// Maximum length of a lookup name in bytes.
pub const MAX_NAME_BYTES: usize = 256;

/// Validation error with structured context.
///
/// Contains the specific constraint that was violated and the field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the violated constraint.
    pub constraint: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

impl std::error::Error for ValidationError {}

/// Parses a UUID-valued field.
///
/// # Errors
///
/// Returns [`ValidationError`] if `value` is empty or not a UUID.
pub fn parse_uuid(field: &str, value: &str) -> Result<Uuid, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError {
            field: field.to_string(),
            constraint: "must not be empty".to_string(),
        });
    }
    Uuid::parse_str(value).map_err(|e| ValidationError {
        field: field.to_string(),
        constraint: format!("{value:?} is not a valid UUID: {e}"),
    })
}

/// Validates a lookup name used as a string key.
///
/// # Errors
///
/// Returns [`ValidationError`] if the name is empty, longer than
/// [`MAX_NAME_BYTES`], or contains a control character.
pub fn validate_name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError {
            field: field.to_string(),
            constraint: "must not be empty".to_string(),
        });
    }
    if value.len() > MAX_NAME_BYTES {
        return Err(ValidationError {
            field: field.to_string(),
            constraint: format!(
                "length {} bytes exceeds maximum {} bytes",
                value.len(),
                MAX_NAME_BYTES
            ),
        });
    }
    if let Some(pos) = value.find(char::is_control) {
        return Err(ValidationError {
            field: field.to_string(),
            constraint: format!("contains a control character at byte offset {pos}"),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid_accepts_both_forms() {
        let hyphenated = parse_uuid("id", "2f1c8a4e-9b7d-4c1f-8e3a-6b5d4c3b2a19").unwrap();
        let simple = parse_uuid("id", "2f1c8a4e9b7d4c1f8e3a6b5d4c3b2a19").unwrap();
        assert_eq!(hyphenated, simple);
    }

    #[test]
    fn test_parse_uuid_rejects_empty() {
        let err = parse_uuid("profile_uuid", "").unwrap_err();
        assert_eq!(err.field, "profile_uuid");
        assert_eq!(err.to_string(), "profile_uuid: must not be empty");
    }

    #[test]
    fn test_parse_uuid_rejects_garbage() {
        let err = parse_uuid("id", "not-a-uuid").unwrap_err();
        assert!(err.constraint.contains("not a valid UUID"));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("login", "alice").is_ok());
        assert!(validate_name("login", "").is_err());
        assert!(validate_name("login", &"a".repeat(MAX_NAME_BYTES)).is_ok());
        assert!(validate_name("login", &"a".repeat(MAX_NAME_BYTES + 1)).is_err());

        let err = validate_name("login", "ali\nce").unwrap_err();
        assert!(err.constraint.contains("byte offset 3"));
    }
}
