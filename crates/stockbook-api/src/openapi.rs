//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the `auth-token` header security scheme to the OpenAPI spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token_auth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "auth-token",
                    "Opaque session token issued by signup/login.",
                ))),
            );
        }
    }
}

/// Assembled OpenAPI spec for the entire API surface.
///
/// Registers all utoipa-documented routes, schemas, tags, and security
/// definitions. Serves as the single source of truth for integrators.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockbook API",
        version = "0.3.2",
        description = "Inventory tracking service: product catalog CRUD, multi-location stock ledger operations with an append-only movement log, threshold-based stock alerts, and dashboard aggregation.\n\nAuthentication: opaque session token via the `auth-token` header. All `/v1/*` endpoints except signup and login require it. Health probes (`/health/*`) and `/metrics` are unauthenticated.",
        license(name = "MIT"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("token_auth" = [])
    ),
    paths(
        // ── Accounts ─────────────────────────────────────────────────────
        crate::routes::auth::signup,
        crate::routes::auth::login,
        crate::routes::auth::me,
        // ── Products ─────────────────────────────────────────────────────
        crate::routes::products::create_product,
        crate::routes::products::list_products,
        crate::routes::products::get_product,
        crate::routes::products::update_product,
        crate::routes::products::delete_product,
        crate::routes::products::initialize_stock,
        // ── Locations ────────────────────────────────────────────────────
        crate::routes::locations::list_locations,
        crate::routes::locations::create_location,
        crate::routes::locations::initialize_locations,
        // ── Stock operations ─────────────────────────────────────────────
        crate::routes::stock::add_stock,
        crate::routes::stock::remove_stock,
        crate::routes::stock::damage_stock,
        crate::routes::stock::return_stock,
        crate::routes::stock::transfer_stock,
        crate::routes::stock::list_movements,
        // ── Alerts ───────────────────────────────────────────────────────
        crate::routes::alerts::list_alerts,
        crate::routes::alerts::mark_read,
        crate::routes::alerts::resolve_alert,
        // ── Dashboard ────────────────────────────────────────────────────
        crate::routes::dashboard::stats,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::auth::SignupRequest,
        crate::routes::auth::LoginRequest,
        crate::routes::auth::AuthResponse,
        crate::routes::products::CreateProductRequest,
        crate::routes::products::UpdateProductRequest,
        crate::routes::products::ProductResponse,
        crate::routes::products::InitializeStockResponse,
        crate::routes::locations::CreateLocationRequest,
        crate::routes::locations::InitializeLocationsResponse,
        crate::routes::stock::StockOpRequest,
        crate::routes::stock::TransferRequest,
        crate::routes::stock::StockOpResponse,
        crate::routes::stock::MovementView,
        crate::routes::stock::MovementProductSummary,
        crate::routes::stock::MovementsResponse,
        crate::routes::alerts::ResolveAlertRequest,
        crate::routes::dashboard::RecentMovement,
        crate::routes::dashboard::DashboardStats,
        crate::state::ProductRecord,
        crate::state::LocationRecord,
        crate::state::LocationKind,
        crate::state::Address,
        crate::state::ContactInfo,
        crate::state::AlertRecord,
        crate::state::UserProfile,
    )),
    tags(
        (name = "auth", description = "Account creation and token issuance"),
        (name = "products", description = "Product catalog"),
        (name = "locations", description = "Physical locations"),
        (name = "stock", description = "Stock ledger operations"),
        (name = "alerts", description = "Stock alerts"),
        (name = "dashboard", description = "Aggregated statistics"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_spec))
}

/// GET /openapi.json — The assembled spec.
async fn serve_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_has_paths_and_schemas() {
        let spec = ApiDoc::openapi();
        assert!(!spec.paths.paths.is_empty());
        assert!(spec.paths.paths.contains_key("/v1/products"));
        assert!(spec.paths.paths.contains_key("/v1/stock/{product_id}/add"));
        let components = spec.components.expect("components present");
        assert!(components.schemas.contains_key("AlertRecord"));
        assert!(components.security_schemes.contains_key("token_auth"));
    }

    #[test]
    fn spec_serializes_to_json() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("Stockbook API"));
        assert!(json.contains("auth-token"));
    }
}
