//! # Authentication
//!
//! Opaque session tokens checked per request via the `auth-token` header.
//!
//! ## Token Format
//!
//! Tokens are 32 random bytes, hex-encoded, issued on signup and login.
//! The server never stores the token itself — sessions are keyed by the
//! token's SHA-256 digest, so a leaked store dump cannot be replayed.
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions. Handlers extract it via the `FromRequestParts` impl.

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody, ErrorDetail};
use crate::state::{AppState, SessionRecord};

/// Name of the request header carrying the session token.
pub const AUTH_HEADER: &str = "auth-token";

/// Identity of the authenticated caller, available to all route handlers
/// via Axum's `FromRequestParts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Axum `FromRequestParts` implementation for `CallerIdentity`.
///
/// Extracts the identity that the auth middleware injected into extensions.
/// Returns 401 if no identity is present (middleware didn't run or failed).
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Tokens ──────────────────────────────────────────────────────────────────

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Generate a fresh opaque session token: 32 random bytes, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// SHA-256 digest of a token, hex-encoded. Sessions are keyed by this.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Hash a password with bcrypt at the configured work factor.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::Internal(format!("password verification failed: {e}")))
}

/// Issue a new session for a user: generates a token, registers the session
/// under its digest, and writes it through to the database when configured.
///
/// Returns the plaintext token — the only time it exists server-side.
pub async fn issue_session(state: &AppState, user_id: Uuid) -> Result<String, AppError> {
    let token = generate_token();
    let session = SessionRecord {
        token_digest: token_digest(&token),
        user_id,
        created_at: Utc::now(),
    };

    state.sessions.insert(session.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::sessions::insert(pool, &session).await {
            tracing::error!(user_id = %user_id, error = %e, "failed to persist session");
            return Err(AppError::Internal(
                "session registered in-memory but database persist failed".to_string(),
            ));
        }
    }

    Ok(token)
}

/// Resolve a token to the caller it belongs to.
///
/// Returns `None` for unknown tokens and for sessions whose user has been
/// deleted since issuance.
pub fn resolve_token(state: &AppState, token: &str) -> Option<CallerIdentity> {
    let session = state.sessions.get(&token_digest(token))?;
    let user = state.users.get(&session.user_id)?;
    Some(CallerIdentity {
        user_id: user.id,
        name: user.name,
        email: user.email,
    })
}

// ── Middleware ──────────────────────────────────────────────────────────────

/// Validate the `auth-token` header and inject [`CallerIdentity`] into the
/// request extensions for downstream handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok());

    match token {
        Some(token) => match resolve_token(&state, token) {
            Some(identity) => {
                request.extensions_mut().insert(identity);
                next.run(request).await
            }
            None => {
                tracing::warn!("authentication failed: unknown or expired token");
                unauthorized_response("invalid or expired token")
            }
        },
        None => {
            tracing::warn!("authentication failed: missing auth-token header");
            unauthorized_response("missing auth-token header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
