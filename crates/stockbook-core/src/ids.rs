//! Validated identifier newtypes.
//!
//! [`Barcode`] and [`LocationCode`] are distinct types — you cannot pass a
//! product barcode where a location code is expected. Both validate at
//! construction and route deserialization through their constructors so
//! invalid values are rejected at the boundary.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Helper macro for string newtypes that must validate their contents.
/// Deserializes as the raw type, then routes through the newtype's `new()`
/// constructor so that invalid values are rejected at deserialization time.
macro_rules! impl_validating_deserialize {
    ($ty:ident, $raw:ty) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = <$raw>::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Barcode
// ---------------------------------------------------------------------------

/// A product barcode: a positive integer, unique across the product catalog.
///
/// Serializes as a plain number for wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Barcode(i64);

impl Barcode {
    /// Create a validated barcode. Must be a positive integer.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::OutOfRange {
                field: "barcode",
                detail: format!("must be positive, got {value}"),
            });
        }
        Ok(Self(value))
    }

    /// Access the underlying numeric value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Barcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl_validating_deserialize!(Barcode, i64);

// ---------------------------------------------------------------------------
// LocationCode
// ---------------------------------------------------------------------------

/// A stable, human-assigned location identifier (e.g. `main-warehouse`).
///
/// Lowercase alphanumerics, hyphens, and underscores; 1–100 characters.
/// Distinct from the location's display name, which is free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LocationCode(String);

impl LocationCode {
    /// Maximum length of a location code.
    pub const MAX_LEN: usize = 100;

    /// Create a validated location code.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "location code",
            });
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(ValidationError::TooLong {
                field: "location code",
                max: Self::MAX_LEN,
            });
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(ValidationError::InvalidFormat {
                field: "location code",
                detail: format!("'{bad}' is not allowed (use lowercase letters, digits, '-', '_')"),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for LocationCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl_validating_deserialize!(LocationCode, String);
