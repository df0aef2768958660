//! Stock movement records.
//!
//! A movement is immutable once appended. The ledger only ever pushes onto
//! its movement log; nothing edits or removes entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock received into a location.
    Inbound,
    /// Stock removed from a location (sale, shipment, pick).
    Outbound,
    /// Stock moved between locations.
    Transfer,
    /// Manual correction.
    Adjustment,
    /// Stock written off as damaged.
    Damaged,
    /// Customer return received back into a location.
    Returned,
}

impl MovementKind {
    /// Return the wire/database representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Transfer => "transfer",
            Self::Adjustment => "adjustment",
            Self::Damaged => "damaged",
            Self::Returned => "returned",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable entry in a product's movement log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub kind: MovementKind,
    pub quantity: u32,
    /// Location name the movement applied to.
    pub location: String,
    /// Free-text reason supplied by the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// External reference (order ID, transfer leg, etc.).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The user who performed the operation.
    pub performed_by: Uuid,
    pub recorded_at: DateTime<Utc>,
}
