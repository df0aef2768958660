//! Structured validation errors shared across the workspace.

use thiserror::Error;

/// Validation failure for a domain primitive or credential field.
///
/// Carries enough context to produce a useful client-facing message without
/// the caller reconstructing which field was at fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was empty or whitespace-only.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// A field exceeded its maximum length.
    #[error("{field} must not exceed {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// A field fell short of its minimum length.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    /// A field contained characters outside its allowed set.
    #[error("{field} contains invalid characters: {detail}")]
    InvalidFormat {
        field: &'static str,
        detail: String,
    },

    /// A numeric field was outside its allowed range.
    #[error("{field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_field() {
        let err = ValidationError::Empty { field: "name" };
        assert_eq!(err.to_string(), "name must not be empty");

        let err = ValidationError::TooShort {
            field: "password",
            min: 5,
        };
        assert!(err.to_string().contains("password"));
        assert!(err.to_string().contains('5'));
    }
}
