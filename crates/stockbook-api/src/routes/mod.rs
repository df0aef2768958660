//! # API Route Modules
//!
//! Route modules for the Stockbook API surface:
//!
//! - `auth` — signup, login, and current-user lookup (token issuance).
//! - `products` — product catalog CRUD plus the demo stock seeder.
//! - `locations` — location CRUD plus the default-location seeder.
//! - `stock` — ledger mutations (add/remove/damage/return/transfer) and the
//!   paginated movement log. Each mutation is a single-record update plus a
//!   conditional alert insert.
//! - `alerts` — alert listing, read acknowledgement, and resolution.
//! - `dashboard` — aggregated statistics for the overview screen.

pub mod alerts;
pub mod auth;
pub mod dashboard;
pub mod locations;
pub mod products;
pub mod stock;

use crate::error::AppError;
use crate::state::{AppState, ProductRecord};

/// Write a mutated product through to the database.
///
/// Failure is surfaced to the client because the in-memory record would
/// diverge from the durable row, causing silent data loss on restart.
pub(crate) async fn persist_product_update(
    state: &AppState,
    record: &ProductRecord,
) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::products::update(pool, record).await {
            tracing::error!(product_id = %record.id, error = %e,
                "failed to persist product to database");
            return Err(AppError::Internal(
                "product updated in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}
