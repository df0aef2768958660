//! # Stock Operations API
//!
//! Routes:
//! - POST /v1/stock/{product_id}/add — Receive stock at a location
//! - POST /v1/stock/{product_id}/remove — Remove stock from a location
//! - POST /v1/stock/{product_id}/damage — Write stock off as damaged
//! - POST /v1/stock/{product_id}/return — Receive returned stock
//! - POST /v1/stock/{product_id}/transfer — Move stock between locations
//! - GET  /v1/stock/{product_id}/movements — Paginated movement log
//!
//! Each mutation is a single-record ledger update (validate + mutate +
//! recompute under one store lock) followed by a conditional alert insert.
//! Add and remove run the threshold scan; damage records a damaged-items
//! alert unconditionally; return and transfer raise no alerts.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockbook_ledger::{damaged_breach, scan_thresholds, MovementKind, ThresholdBreach};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::persist_product_update;
use crate::state::{AlertRecord, AppState, ProductRecord};

/// Request for a single-location stock operation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StockOpRequest {
    pub location: String,
    pub quantity: u32,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

impl Validate for StockOpRequest {
    fn validate(&self) -> Result<(), String> {
        if self.location.trim().is_empty() {
            return Err("location must not be empty".to_string());
        }
        if self.quantity == 0 {
            return Err("quantity must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Request to transfer stock between locations.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub from_location: String,
    pub to_location: String,
    pub quantity: u32,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Validate for TransferRequest {
    fn validate(&self) -> Result<(), String> {
        if self.from_location.trim().is_empty() || self.to_location.trim().is_empty() {
            return Err("from_location and to_location must not be empty".to_string());
        }
        if self.from_location == self.to_location {
            return Err("from_location and to_location must differ".to_string());
        }
        if self.quantity == 0 {
            return Err("quantity must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Response for every stock mutation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockOpResponse {
    pub message: String,
    pub product: ProductRecord,
    pub new_stock_level: u32,
}

/// Movement log query parameters.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MovementsQuery {
    /// Page size; defaults to 50.
    pub limit: Option<usize>,
    /// Entries to skip; defaults to 0.
    pub offset: Option<usize>,
}

/// One movement with its actor's name resolved.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovementView {
    #[schema(value_type = String)]
    pub kind: MovementKind,
    pub quantity: u32,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub performed_by: Uuid,
    /// Display name of the actor; absent if the account was deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performed_by_name: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Short product summary attached to the movement log.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovementProductSummary {
    pub id: Uuid,
    pub name: String,
    pub total_stock: u32,
    pub low_stock: bool,
}

/// Paginated movement log response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovementsResponse {
    pub movements: Vec<MovementView>,
    pub total_movements: usize,
    pub product: MovementProductSummary,
}

/// Build the stock operations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/stock/:product_id/add", post(add_stock))
        .route("/v1/stock/:product_id/remove", post(remove_stock))
        .route("/v1/stock/:product_id/damage", post(damage_stock))
        .route("/v1/stock/:product_id/return", post(return_stock))
        .route("/v1/stock/:product_id/transfer", post(transfer_stock))
        .route("/v1/stock/:product_id/movements", get(list_movements))
}

/// Apply a ledger mutation to one product under a single store lock.
///
/// Returns the updated record, mapping a missing product to 404 and ledger
/// failures to their HTTP equivalents.
fn mutate_product(
    state: &AppState,
    product_id: Uuid,
    f: impl FnOnce(&mut ProductRecord) -> Result<(), stockbook_ledger::LedgerError>,
) -> Result<ProductRecord, AppError> {
    let result = state
        .products
        .try_update(&product_id, |p| {
            f(p)?;
            p.updated_at = Utc::now();
            Ok::<ProductRecord, stockbook_ledger::LedgerError>(p.clone())
        })
        .ok_or_else(|| AppError::not_found(format!("product {product_id} not found")))?;
    Ok(result?)
}

/// Insert alert records for the given breaches, deduplicating against open
/// alerts: at most one unresolved alert exists per product/location/kind.
///
/// The scan-and-insert runs under the alert store's write lock, so two
/// concurrent mutations cannot both insert the same open alert.
async fn raise_alerts(
    state: &AppState,
    product_id: Uuid,
    breaches: Vec<ThresholdBreach>,
) -> Result<(), AppError> {
    for breach in breaches {
        let now = Utc::now();
        let record = AlertRecord {
            id: Uuid::new_v4(),
            product_id,
            kind: breach.kind,
            location: breach.location.clone(),
            current_quantity: breach.current_quantity,
            threshold: breach.threshold,
            severity: breach.severity,
            message: breach.message,
            is_read: false,
            is_resolved: false,
            resolved_by: None,
            resolved_at: None,
            resolved_note: None,
            created_at: now,
            updated_at: now,
        };

        let inserted = state.alerts.insert_unique_by(record.id, record.clone(), |a| {
            a.product_id == product_id
                && a.location == breach.location
                && a.kind == breach.kind
                && !a.is_resolved
        });

        if inserted {
            if let Some(pool) = &state.db_pool {
                if let Err(e) = crate::db::alerts::insert(pool, &record).await {
                    tracing::error!(alert_id = %record.id, error = %e,
                        "failed to persist stock alert");
                    return Err(AppError::Internal(
                        "alert recorded in-memory but database persist failed".to_string(),
                    ));
                }
            }
            tracing::info!(product_id = %product_id, kind = %record.kind,
                location = %record.location, severity = %record.severity,
                "stock alert raised");
        }
    }
    Ok(())
}

/// POST /v1/stock/{product_id}/add — Receive stock.
#[utoipa::path(
    post,
    path = "/v1/stock/{product_id}/add",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = StockOpRequest,
    responses(
        (status = 200, description = "Stock added", body = StockOpResponse),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
    ),
    tag = "stock"
)]
async fn add_stock(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(product_id): Path<Uuid>,
    body: Result<Json<StockOpRequest>, JsonRejection>,
) -> Result<Json<StockOpResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let product = mutate_product(&state, product_id, |p| {
        p.stock.receive(
            &req.location,
            req.quantity,
            caller.user_id,
            req.reason.clone(),
            req.reference.clone(),
        )
    })?;

    persist_product_update(&state, &product).await?;
    let breaches = scan_thresholds(&product.name, &product.stock);
    raise_alerts(&state, product_id, breaches).await?;

    Ok(Json(StockOpResponse {
        message: "Stock added successfully".to_string(),
        new_stock_level: product.stock.total_stock,
        product,
    }))
}

/// POST /v1/stock/{product_id}/remove — Remove stock.
///
/// Returns 409 when the location would go negative.
#[utoipa::path(
    post,
    path = "/v1/stock/{product_id}/remove",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = StockOpRequest,
    responses(
        (status = 200, description = "Stock removed", body = StockOpResponse),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
        (status = 409, description = "Insufficient stock", body = crate::error::ErrorBody),
    ),
    tag = "stock"
)]
async fn remove_stock(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(product_id): Path<Uuid>,
    body: Result<Json<StockOpRequest>, JsonRejection>,
) -> Result<Json<StockOpResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let product = mutate_product(&state, product_id, |p| {
        p.stock.withdraw(
            &req.location,
            req.quantity,
            caller.user_id,
            req.reason.clone(),
            req.reference.clone(),
        )
    })?;

    persist_product_update(&state, &product).await?;
    let breaches = scan_thresholds(&product.name, &product.stock);
    raise_alerts(&state, product_id, breaches).await?;

    Ok(Json(StockOpResponse {
        message: "Stock removed successfully".to_string(),
        new_stock_level: product.stock.total_stock,
        product,
    }))
}

/// POST /v1/stock/{product_id}/damage — Write stock off as damaged.
#[utoipa::path(
    post,
    path = "/v1/stock/{product_id}/damage",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = StockOpRequest,
    responses(
        (status = 200, description = "Stock marked damaged", body = StockOpResponse),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
        (status = 409, description = "Insufficient stock", body = crate::error::ErrorBody),
    ),
    tag = "stock"
)]
async fn damage_stock(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(product_id): Path<Uuid>,
    body: Result<Json<StockOpRequest>, JsonRejection>,
) -> Result<Json<StockOpResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let product = mutate_product(&state, product_id, |p| {
        p.stock.mark_damaged(
            &req.location,
            req.quantity,
            caller.user_id,
            req.reason.clone(),
        )
    })?;

    persist_product_update(&state, &product).await?;
    let breach = damaged_breach(&product.name, &req.location, req.quantity);
    raise_alerts(&state, product_id, vec![breach]).await?;

    Ok(Json(StockOpResponse {
        message: "Stock marked as damaged successfully".to_string(),
        new_stock_level: product.stock.total_stock,
        product,
    }))
}

/// POST /v1/stock/{product_id}/return — Receive returned stock.
#[utoipa::path(
    post,
    path = "/v1/stock/{product_id}/return",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = StockOpRequest,
    responses(
        (status = 200, description = "Return processed", body = StockOpResponse),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
    ),
    tag = "stock"
)]
async fn return_stock(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(product_id): Path<Uuid>,
    body: Result<Json<StockOpRequest>, JsonRejection>,
) -> Result<Json<StockOpResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let product = mutate_product(&state, product_id, |p| {
        p.stock.process_return(
            &req.location,
            req.quantity,
            caller.user_id,
            req.reason.clone(),
        )
    })?;

    persist_product_update(&state, &product).await?;

    Ok(Json(StockOpResponse {
        message: "Return processed successfully".to_string(),
        new_stock_level: product.stock.total_stock,
        product,
    }))
}

/// POST /v1/stock/{product_id}/transfer — Move stock between locations.
#[utoipa::path(
    post,
    path = "/v1/stock/{product_id}/transfer",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Stock transferred", body = StockOpResponse),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
        (status = 409, description = "Insufficient stock at source", body = crate::error::ErrorBody),
    ),
    tag = "stock"
)]
async fn transfer_stock(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(product_id): Path<Uuid>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<StockOpResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let product = mutate_product(&state, product_id, |p| {
        p.stock.transfer(
            &req.from_location,
            &req.to_location,
            req.quantity,
            caller.user_id,
            req.reason.clone(),
        )
    })?;

    persist_product_update(&state, &product).await?;

    Ok(Json(StockOpResponse {
        message: "Stock transferred successfully".to_string(),
        new_stock_level: product.stock.total_stock,
        product,
    }))
}

/// GET /v1/stock/{product_id}/movements — Paginated movement log.
///
/// Newest first. Actor names are resolved at query time; movements whose
/// actor has been deleted keep the bare user ID.
#[utoipa::path(
    get,
    path = "/v1/stock/{product_id}/movements",
    params(
        ("product_id" = Uuid, Path, description = "Product ID"),
        ("limit" = Option<usize>, Query, description = "Page size (default 50)"),
        ("offset" = Option<usize>, Query, description = "Entries to skip"),
    ),
    responses(
        (status = 200, description = "Movement log page", body = MovementsResponse),
        (status = 404, description = "Product not found", body = crate::error::ErrorBody),
    ),
    tag = "stock"
)]
async fn list_movements(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<MovementsQuery>,
) -> Result<Json<MovementsResponse>, AppError> {
    let product = state
        .products
        .get(&product_id)
        .ok_or_else(|| AppError::not_found(format!("product {product_id} not found")))?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let total_movements = product.stock.movements.len();
    let mut movements = product.stock.movements.clone();
    movements.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

    let page: Vec<MovementView> = movements
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|m| {
            let performed_by_name = state.users.get(&m.performed_by).map(|u| u.name);
            MovementView {
                kind: m.kind,
                quantity: m.quantity,
                location: m.location,
                reason: m.reason,
                reference: m.reference,
                performed_by: m.performed_by,
                performed_by_name,
                recorded_at: m.recorded_at,
            }
        })
        .collect();

    Ok(Json(MovementsResponse {
        movements: page,
        total_movements,
        product: MovementProductSummary {
            id: product.id,
            name: product.name,
            total_stock: product.stock.total_stock,
            low_stock: product.stock.low_stock,
        },
    }))
}
