//! Threshold evaluation for alert generation.
//!
//! The ledger describes *breaches*; turning a breach into a persisted alert
//! record (including the at-most-one-open-alert deduplication) is the API
//! layer's job.

use serde::{Deserialize, Serialize};

use crate::stock::StockLedger;

/// Classification of a stock alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowStock,
    OutOfStock,
    Overstock,
    DamagedItems,
    ExpiryWarning,
}

impl AlertKind {
    /// Return the wire/database representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowStock => "low_stock",
            Self::OutOfStock => "out_of_stock",
            Self::Overstock => "overstock",
            Self::DamagedItems => "damaged_items",
            Self::ExpiryWarning => "expiry_warning",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency classification of a stock alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Return the wire/database representation of this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threshold violation observed at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdBreach {
    pub kind: AlertKind,
    pub location: String,
    pub current_quantity: u32,
    pub threshold: u32,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Scan a ledger for locations at or below their minimum stock level.
///
/// For each breached location: `out_of_stock` at zero quantity, `low_stock`
/// otherwise. Severity is `critical` at zero, `high` at or below half the
/// minimum, `medium` above that.
pub fn scan_thresholds(product_name: &str, ledger: &StockLedger) -> Vec<ThresholdBreach> {
    ledger
        .location_stock
        .iter()
        .filter(|entry| entry.quantity <= entry.min_level)
        .map(|entry| {
            let out = entry.quantity == 0;
            let severity = if out {
                AlertSeverity::Critical
            } else if entry.quantity <= entry.min_level / 2 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };
            ThresholdBreach {
                kind: if out { AlertKind::OutOfStock } else { AlertKind::LowStock },
                location: entry.location.clone(),
                current_quantity: entry.quantity,
                threshold: entry.min_level,
                severity,
                message: format!(
                    "{product_name} is {} at {}. Current: {}, Minimum: {}",
                    if out { "out of stock" } else { "running low" },
                    entry.location,
                    entry.quantity,
                    entry.min_level
                ),
            }
        })
        .collect()
}

/// Describe a damaged-items observation.
///
/// Unlike threshold breaches this is unconditional: writing stock off always
/// warrants an operator-visible record.
pub fn damaged_breach(product_name: &str, location: &str, quantity: u32) -> ThresholdBreach {
    ThresholdBreach {
        kind: AlertKind::DamagedItems,
        location: location.to_string(),
        current_quantity: quantity,
        threshold: 0,
        severity: AlertSeverity::Medium,
        message: format!("{quantity} units of {product_name} marked as damaged at {location}"),
    }
}
