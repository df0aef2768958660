//! # Product Catalog API
//!
//! Routes:
//! - POST   /v1/products — Create a product (seeds demo stock)
//! - GET    /v1/products — List products with stock status
//! - GET    /v1/products/{id} — Get one product with stock status
//! - PUT    /v1/products/{id} — Update name/price/barcode
//! - DELETE /v1/products/{id} — Delete a product
//! - POST   /v1/products/initialize-stock — Seed stock for stockless products

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use stockbook_core::Barcode;
use stockbook_ledger::StockLedger;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::persist_product_update;
use crate::state::{AppState, ProductRecord};

/// Location used when seeding demo stock.
const SEED_LOCATION: &str = "Main Warehouse";

/// Request to create a product.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: f64,
    pub barcode: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: String,
}

fn validate_name_and_price(name: &str, price: f64) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name.len() > 255 {
        return Err("name must not exceed 255 characters".to_string());
    }
    if !price.is_finite() || price < 0.0 {
        return Err("price must be a non-negative number".to_string());
    }
    Ok(())
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Result<(), String> {
        validate_name_and_price(&self.name, self.price)?;
        Barcode::new(self.barcode).map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Request to update a product's catalog fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: String,
    pub price: f64,
    pub barcode: i64,
}

impl Validate for UpdateProductRequest {
    fn validate(&self) -> Result<(), String> {
        validate_name_and_price(&self.name, self.price)?;
        Barcode::new(self.barcode).map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// A product enriched with its derived stock status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: ProductRecord,
    pub total_stock: u32,
    pub low_stock: bool,
    pub out_of_stock: bool,
    /// "In Stock", "Low Stock", or "Out of Stock".
    pub stock_status: String,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        let total_stock = product.stock.total_stock;
        let low_stock = product.stock.low_stock;
        let status = product.stock.status();
        Self {
            product,
            total_stock,
            low_stock,
            out_of_stock: total_stock == 0,
            stock_status: status.as_str().to_string(),
        }
    }
}

/// Result of the demo stock seeder.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InitializeStockResponse {
    pub message: String,
    pub updated_count: usize,
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/products", post(create_product).get(list_products))
        .route("/v1/products/initialize-stock", post(initialize_stock))
        .route(
            "/v1/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// POST /v1/products — Create a product.
#[utoipa::path(
    post,
    path = "/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 409, description = "Barcode already in use", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
async fn create_product(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let barcode = Barcode::new(req.barcode).map_err(AppError::from)?;
    let now = Utc::now();

    let record = ProductRecord {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        price: req.price,
        barcode,
        description: req.description,
        category: req.category.unwrap_or_else(|| "General".to_string()),
        brand: req.brand,
        // New products open with demo stock at the main warehouse.
        stock: StockLedger::with_initial_stock(SEED_LOCATION, 50, 10, 500),
        is_active: true,
        created_by: Some(caller.user_id),
        created_at: now,
        updated_at: now,
    };

    let inserted = state
        .products
        .insert_unique_by(record.id, record.clone(), |p| {
            p.barcode.value() == req.barcode
        });
    if !inserted {
        return Err(AppError::conflict(format!(
            "a product with barcode {} already exists",
            req.barcode
        )));
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::products::insert(pool, &record).await {
            tracing::error!(product_id = %record.id, error = %e, "failed to persist product");
            state.products.remove(&record.id);
            return Err(AppError::Internal(
                "product created in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(product_id = %record.id, barcode = %record.barcode, "product created");
    Ok((
        axum::http::StatusCode::CREATED,
        Json(ProductResponse::from(record)),
    ))
}

/// GET /v1/products — List products with stock status.
#[utoipa::path(
    get,
    path = "/v1/products",
    responses(
        (status = 200, description = "All products", body = [ProductResponse]),
    ),
    tag = "products"
)]
async fn list_products(State(state): State<AppState>) -> Json<Vec<ProductResponse>> {
    let mut products = state.products.list();
    products.sort_by_key(|p| p.created_at);
    Json(products.into_iter().map(ProductResponse::from).collect())
}

/// GET /v1/products/{id} — Get one product.
#[utoipa::path(
    get,
    path = "/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state
        .products
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("product {id} not found")))?;
    Ok(Json(ProductResponse::from(product)))
}

/// PUT /v1/products/{id} — Update catalog fields.
///
/// Only name, price, and barcode are updatable; stock moves through the
/// ledger endpoints.
#[utoipa::path(
    put,
    path = "/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Barcode already in use", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let barcode = Barcode::new(req.barcode).map_err(AppError::from)?;

    if state.barcode_in_use(req.barcode, Some(id)) {
        return Err(AppError::conflict(format!(
            "a product with barcode {} already exists",
            req.barcode
        )));
    }

    let updated = state
        .products
        .update(&id, |p| {
            p.name = req.name.trim().to_string();
            p.price = req.price;
            p.barcode = barcode;
            p.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::not_found(format!("product {id} not found")))?;

    persist_product_update(&state, &updated).await?;

    Ok(Json(ProductResponse::from(updated)))
}

/// DELETE /v1/products/{id} — Delete a product.
#[utoipa::path(
    delete,
    path = "/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = ProductResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "products"
)]
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, AppError> {
    let removed = state
        .products
        .remove(&id)
        .ok_or_else(|| AppError::not_found(format!("product {id} not found")))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::products::delete(pool, id).await {
            tracing::error!(product_id = %id, error = %e, "failed to delete product row");
            return Err(AppError::Internal(
                "product removed in-memory but database delete failed".to_string(),
            ));
        }
    }

    tracing::info!(product_id = %id, "product deleted");
    Ok(Json(ProductResponse::from(removed)))
}

/// POST /v1/products/initialize-stock — Seed stock for stockless products.
///
/// Products created before stock tracking existed have an empty ledger;
/// this gives each of them a randomized opening balance (20–120 units) at
/// the main warehouse.
#[utoipa::path(
    post,
    path = "/v1/products/initialize-stock",
    responses(
        (status = 200, description = "Seeding summary", body = InitializeStockResponse),
    ),
    tag = "products"
)]
async fn initialize_stock(
    State(state): State<AppState>,
) -> Result<Json<InitializeStockResponse>, AppError> {
    let mut updated_count = 0usize;

    for product in state.products.list() {
        if !product.stock.location_stock.is_empty() {
            continue;
        }

        let quantity = 20 + (OsRng.next_u32() % 101);
        let updated = state.products.update(&product.id, |p| {
            p.stock = StockLedger::with_initial_stock(SEED_LOCATION, quantity, 10, 500);
            p.updated_at = Utc::now();
        });

        if let Some(record) = updated {
            persist_product_update(&state, &record).await?;
            updated_count += 1;
        }
    }

    Ok(Json(InitializeStockResponse {
        message: format!("Initialized stock for {updated_count} products"),
        updated_count,
    }))
}
