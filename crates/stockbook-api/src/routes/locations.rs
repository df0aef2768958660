//! # Location API
//!
//! Routes:
//! - GET  /v1/locations — List active locations
//! - POST /v1/locations — Create a location
//! - POST /v1/locations/initialize — Insert the default locations if none exist

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use stockbook_core::LocationCode;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{Address, AppState, ContactInfo, LocationKind, LocationRecord};

/// Request to create a location.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLocationRequest {
    /// Stable identifier, e.g. `main-warehouse`.
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub kind: LocationKind,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,
}

fn default_max_capacity() -> u32 {
    10_000
}

impl Validate for CreateLocationRequest {
    fn validate(&self) -> Result<(), String> {
        LocationCode::new(&*self.code).map_err(|e| e.to_string())?;
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.name.len() > 255 {
            return Err("name must not exceed 255 characters".to_string());
        }
        Ok(())
    }
}

/// Result of the default-location seeder.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InitializeLocationsResponse {
    pub message: String,
    pub count: usize,
}

/// Build the locations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/locations", post(create_location).get(list_locations))
        .route("/v1/locations/initialize", post(initialize_locations))
}

/// GET /v1/locations — List active locations.
#[utoipa::path(
    get,
    path = "/v1/locations",
    responses(
        (status = 200, description = "Active locations", body = [LocationRecord]),
    ),
    tag = "locations"
)]
async fn list_locations(State(state): State<AppState>) -> Json<Vec<LocationRecord>> {
    let mut locations = state.locations.list();
    locations.retain(|l| l.is_active);
    locations.sort_by_key(|l| l.created_at);
    Json(locations)
}

/// POST /v1/locations — Create a location.
#[utoipa::path(
    post,
    path = "/v1/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = LocationRecord),
        (status = 409, description = "Code already in use", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "locations"
)]
async fn create_location(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateLocationRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<LocationRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let code = LocationCode::new(req.code).map_err(AppError::from)?;
    let now = Utc::now();

    let record = LocationRecord {
        id: Uuid::new_v4(),
        code: code.clone(),
        name: req.name.trim().to_string(),
        kind: req.kind,
        address: req.address,
        contact: req.contact,
        is_active: true,
        max_capacity: req.max_capacity,
        current_utilization: 0,
        created_by: caller.user_id,
        created_at: now,
        updated_at: now,
    };

    let inserted = state
        .locations
        .insert_unique_by(record.id, record.clone(), |l| l.code == code);
    if !inserted {
        return Err(AppError::conflict(format!(
            "a location with code '{code}' already exists"
        )));
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::locations::insert(pool, &record).await {
            tracing::error!(location_id = %record.id, error = %e, "failed to persist location");
            state.locations.remove(&record.id);
            return Err(AppError::Internal(
                "location created in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(location_id = %record.id, code = %record.code, "location created");
    Ok((axum::http::StatusCode::CREATED, Json(record)))
}

/// The three locations every fresh deployment starts with.
fn default_locations(created_by: Uuid) -> Vec<LocationRecord> {
    let now = Utc::now();
    let build = |code: &str, name: &str, kind: LocationKind, street: &str, zip: &str,
                 phone: &str, email: &str, manager: &str, capacity: u32| {
        LocationRecord {
            id: Uuid::new_v4(),
            code: LocationCode::new(code).expect("default location codes are valid"),
            name: name.to_string(),
            kind,
            address: Address {
                street: Some(street.to_string()),
                city: Some("New York".to_string()),
                state: Some("NY".to_string()),
                zip_code: Some(zip.to_string()),
                country: Some("USA".to_string()),
            },
            contact: ContactInfo {
                phone: Some(phone.to_string()),
                email: Some(email.to_string()),
                manager: Some(manager.to_string()),
            },
            is_active: true,
            max_capacity: capacity,
            current_utilization: 0,
            created_by,
            created_at: now,
            updated_at: now,
        }
    };

    vec![
        build(
            "main-warehouse",
            "Main Warehouse",
            LocationKind::Warehouse,
            "123 Storage Drive",
            "10001",
            "+1-555-0001",
            "warehouse@company.com",
            "John Smith",
            10_000,
        ),
        build(
            "downtown-store",
            "Downtown Store",
            LocationKind::Store,
            "456 Main Street",
            "10002",
            "+1-555-0002",
            "downtown@company.com",
            "Jane Doe",
            2_000,
        ),
        build(
            "mall-outlet",
            "Mall Outlet",
            LocationKind::Outlet,
            "789 Shopping Center",
            "10003",
            "+1-555-0003",
            "mall@company.com",
            "Bob Wilson",
            1_500,
        ),
    ]
}

/// POST /v1/locations/initialize — Seed the default locations.
///
/// No-op (with the current count) when any location already exists.
#[utoipa::path(
    post,
    path = "/v1/locations/initialize",
    responses(
        (status = 200, description = "Seeding summary", body = InitializeLocationsResponse),
    ),
    tag = "locations"
)]
async fn initialize_locations(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<InitializeLocationsResponse>, AppError> {
    let existing = state.locations.len();
    if existing > 0 {
        return Ok(Json(InitializeLocationsResponse {
            message: "Locations already exist".to_string(),
            count: existing,
        }));
    }

    let defaults = default_locations(caller.user_id);
    let count = defaults.len();
    for record in defaults {
        state.locations.insert(record.id, record.clone());
        if let Some(pool) = &state.db_pool {
            if let Err(e) = crate::db::locations::insert(pool, &record).await {
                tracing::error!(location_id = %record.id, error = %e,
                    "failed to persist default location");
                return Err(AppError::Internal(
                    "default locations seeded in-memory but database persist failed".to_string(),
                ));
            }
        }
    }

    Ok(Json(InitializeLocationsResponse {
        message: "Default locations initialized successfully".to_string(),
        count,
    }))
}
