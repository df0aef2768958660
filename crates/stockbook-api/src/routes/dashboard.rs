//! # Dashboard API
//!
//! Routes:
//! - GET /v1/dashboard/stats — Aggregated counts and recent movements

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stockbook_ledger::StockMovement;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::AppState;

/// A recent movement with product context and actor name attached.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentMovement {
    pub product_id: Uuid,
    pub product_name: String,
    pub barcode: i64,
    #[schema(value_type = Object)]
    pub movement: StockMovement,
    /// Display name of the actor; absent if the account was deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Aggregated dashboard statistics.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_products: usize,
    pub low_stock_products: usize,
    pub out_of_stock_products: usize,
    pub unread_alerts: usize,
    pub locations: usize,
    pub recent_movements: Vec<RecentMovement>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/dashboard/stats", get(stats))
}

/// GET /v1/dashboard/stats — Aggregated statistics.
///
/// Counts cover active products/locations only. `recent_movements` is the
/// ten newest movements across all products.
#[utoipa::path(
    get,
    path = "/v1/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
    ),
    tag = "dashboard"
)]
async fn stats(State(state): State<AppState>) -> Json<DashboardStats> {
    let total_products = state.products.count(|p| p.is_active);
    let low_stock_products = state.products.count(|p| p.is_active && p.stock.low_stock);
    let out_of_stock_products = state
        .products
        .count(|p| p.is_active && p.stock.total_stock == 0);
    let unread_alerts = state.alerts.count(|a| !a.is_read);
    let locations = state.locations.count(|l| l.is_active);

    // Gather the ten newest movements across the whole catalog.
    let mut recent: Vec<RecentMovement> = state
        .products
        .list()
        .into_iter()
        .flat_map(|p| {
            let product_id = p.id;
            let product_name = p.name.clone();
            let barcode = p.barcode.value();
            p.stock
                .movements
                .into_iter()
                .map(move |movement| RecentMovement {
                    product_id,
                    product_name: product_name.clone(),
                    barcode,
                    user: None,
                    movement,
                })
        })
        .collect();
    recent.sort_by(|a, b| b.movement.recorded_at.cmp(&a.movement.recorded_at));
    recent.truncate(10);

    for entry in &mut recent {
        entry.user = state.users.get(&entry.movement.performed_by).map(|u| u.name);
    }

    Json(DashboardStats {
        total_products,
        low_stock_products,
        out_of_stock_products,
        unread_alerts,
        locations,
        recent_movements: recent,
    })
}
