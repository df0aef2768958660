//! # stockbook-ledger — Stock Ledger Domain
//!
//! The stock ledger embedded in every product record: per-location quantity
//! tracking, an append-only movement log, derived totals, and threshold
//! evaluation for alert generation.
//!
//! ## Invariants
//!
//! - A location's quantity never goes negative: quantities are unsigned and
//!   every subtraction is preceded by a sufficiency check in the same
//!   mutation.
//! - Every successful mutation appends exactly one movement per affected
//!   location (a transfer touches two locations and appends two).
//! - `total_stock` equals the sum of per-location quantities after every
//!   mutation: [`StockLedger::recompute`] runs unconditionally at the end
//!   of each one.
//!
//! ## What is NOT here
//!
//! Alert *records* (read/resolved lifecycle, persistence) live in the API
//! layer. This crate only evaluates thresholds and describes breaches;
//! see [`alert::scan_thresholds`].

pub mod alert;
pub mod movement;
pub mod stock;

pub use alert::{damaged_breach, scan_thresholds, AlertKind, AlertSeverity, ThresholdBreach};
pub use movement::{MovementKind, StockMovement};
pub use stock::{LedgerError, LocationStock, StockLedger, StockStatus};
