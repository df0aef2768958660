//! # stockbook-core — Foundational Types
//!
//! Domain-primitive newtypes and the shared validation error hierarchy for
//! the Stockbook inventory platform.
//!
//! ## Design Principle
//!
//! Values that carry format rules ([`Barcode`], [`LocationCode`]) validate at
//! construction time and at deserialization time. An invalid value is
//! rejected at the boundary, never silently accepted into a record.

pub mod credentials;
pub mod error;
pub mod ids;

pub use credentials::{validate_email, validate_name, validate_password};
pub use error::ValidationError;
pub use ids::{Barcode, LocationCode};
