//! # Account API
//!
//! Routes:
//! - POST /v1/auth/signup — Create an account and issue a session token
//! - POST /v1/auth/login — Verify credentials and issue a session token
//! - GET  /v1/auth/me — Current user details
//!
//! Signup and login are mounted outside the auth middleware; `me` requires
//! a valid token.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{hash_password, issue_session, verify_password, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, UserProfile, UserRecord};

/// Request to create an account.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), String> {
        stockbook_core::validate_name(&self.name).map_err(|e| e.to_string())?;
        stockbook_core::validate_email(&self.email).map_err(|e| e.to_string())?;
        stockbook_core::validate_password(&self.password).map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() {
            return Err("email must not be empty".to_string());
        }
        if self.password.is_empty() {
            return Err("password must not be empty".to_string());
        }
        Ok(())
    }
}

/// Token issuance response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Opaque session token; pass it in the `auth-token` header.
    pub token: String,
    pub user: UserProfile,
}

/// Build the unauthenticated account router (signup + login).
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/signup", post(signup))
        .route("/v1/auth/login", post(login))
}

/// Build the authenticated account router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/auth/me", get(me))
}

/// POST /v1/auth/signup — Create an account.
#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<AuthResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let email = req.email.trim().to_lowercase();

    let password_hash = hash_password(&req.password, state.config.bcrypt_cost)?;
    let record = UserRecord {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email: email.clone(),
        password_hash,
        created_at: Utc::now(),
    };

    // Uniqueness check and insert under one store lock.
    let inserted = state
        .users
        .insert_unique_by(record.id, record.clone(), |u| u.email == email);
    if !inserted {
        return Err(AppError::conflict("a user with this email already exists"));
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::users::insert(pool, &record).await {
            tracing::error!(user_id = %record.id, error = %e, "failed to persist user");
            state.users.remove(&record.id);
            return Err(AppError::Internal(
                "user registered in-memory but database persist failed".to_string(),
            ));
        }
    }

    let token = issue_session(&state, record.id).await?;
    tracing::info!(user_id = %record.id, "account created");

    Ok((
        axum::http::StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserProfile::from(&record),
        }),
    ))
}

/// POST /v1/auth/login — Verify credentials and issue a token.
///
/// The failure message is identical for unknown email and wrong password so
/// the endpoint cannot be used to probe which accounts exist.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let user = state
        .user_by_email(&req.email)
        .ok_or_else(|| AppError::Unauthorized("invalid email or password".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "login failed: wrong password");
        return Err(AppError::Unauthorized("invalid email or password".to_string()));
    }

    let token = issue_session(&state, user.id).await?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// GET /v1/auth/me — Current user details.
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
async fn me(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .users
        .get(&caller.user_id)
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;
    Ok(Json(UserProfile::from(&user)))
}
