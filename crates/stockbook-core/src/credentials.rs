//! Credential field validation.
//!
//! Signup/login requests validate these rules before any store or hashing
//! work happens. The rules match the account constraints enforced at the
//! API boundary: display name at least 3 characters, password at least 5,
//! email structurally plausible.

use crate::error::ValidationError;

/// Minimum display-name length.
pub const NAME_MIN_LEN: usize = 3;
/// Maximum display-name length.
pub const NAME_MAX_LEN: usize = 100;
/// Minimum password length.
pub const PASSWORD_MIN_LEN: usize = 5;
/// Maximum password length (bcrypt truncates at 72 bytes).
pub const PASSWORD_MAX_LEN: usize = 72;
/// Maximum email length.
pub const EMAIL_MAX_LEN: usize = 254;

/// Validate a user display name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "name" });
    }
    if trimmed.len() < NAME_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "name",
            min: NAME_MIN_LEN,
        });
    }
    if trimmed.len() > NAME_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "name",
            max: NAME_MAX_LEN,
        });
    }
    Ok(())
}

/// Validate an email address.
///
/// Structural plausibility only: one `@` with a non-empty local part and a
/// domain containing a dot. Deliverability is not this layer's concern.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "email" });
    }
    if trimmed.len() > EMAIL_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "email",
            max: EMAIL_MAX_LEN,
        });
    }
    let mut parts = trimmed.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            detail: format!("'{trimmed}' is not a valid address"),
        });
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            detail: "whitespace is not allowed".to_string(),
        });
    }
    Ok(())
}

/// Validate a password.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < PASSWORD_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "password",
            min: PASSWORD_MIN_LEN,
        });
    }
    if password.len() > PASSWORD_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "password",
            max: PASSWORD_MAX_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(validate_name("Ada Lovelace").is_ok());
        assert!(validate_name("ab").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(NAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn email_accepts_plausible_addresses() {
        assert!(validate_email("ops@example.com").is_ok());
        assert!(validate_email("first.last@sub.example.co").is_ok());
    }

    #[test]
    fn email_rejects_implausible_addresses() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@dot.").is_err());
        assert!(validate_email("two words@example.com").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("s3cret").is_ok());
        assert!(validate_password("1234").is_err());
        assert!(validate_password(&"p".repeat(PASSWORD_MAX_LEN + 1)).is_err());
    }
}
