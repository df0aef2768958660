//! # Request Extraction & Validation
//!
//! Handlers take their JSON body as `Result<Json<T>, JsonRejection>` and run
//! it through [`extract_validated_json`], so a malformed body becomes a
//! structured 422 instead of axum's default rejection, and business rules
//! (positive quantities, plausible emails, barcode format) are checked in
//! one place before any store work happens.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Business-rule validation for request DTOs, beyond what serde
/// deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns a client-facing message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON body, mapping deserialization failures to
/// [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Unwrap a JSON body and run its [`Validate`] rules.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Qty(u32);

    impl Validate for Qty {
        fn validate(&self) -> Result<(), String> {
            if self.0 == 0 {
                return Err("quantity must be greater than zero".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn valid_body_passes_through() {
        let out = extract_validated_json(Ok(Json(Qty(5)))).unwrap();
        assert_eq!(out.0, 5);
    }

    #[test]
    fn failing_validation_becomes_validation_error() {
        let err = extract_validated_json(Ok(Json(Qty(0)))).unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("greater than zero")),
            other => panic!("expected Validation, got: {other:?}"),
        }
    }
}
