//! # stockbook-api — Axum REST Service
//!
//! The HTTP layer of the Stockbook inventory platform: product catalog CRUD,
//! multi-location stock ledger operations, threshold-based alerts, and a
//! dashboard aggregation endpoint, with session-token authentication.
//!
//! ## API Surface
//!
//! | Prefix                  | Module                  | Domain              |
//! |-------------------------|-------------------------|---------------------|
//! | `/v1/auth/*`            | [`routes::auth`]        | Accounts & tokens   |
//! | `/v1/products/*`        | [`routes::products`]    | Product catalog     |
//! | `/v1/locations/*`       | [`routes::locations`]   | Locations           |
//! | `/v1/stock/*`           | [`routes::stock`]       | Ledger operations   |
//! | `/v1/alerts/*`          | [`routes::alerts`]      | Stock alerts        |
//! | `/v1/dashboard/*`       | [`routes::dashboard`]   | Aggregation         |
//! | `/health/*`, `/metrics` | (this module)           | Operations          |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! Signup, login, health probes, and `/metrics` are mounted outside the auth
//! middleware so they remain accessible without a token.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::state::AppState;

pub use error::AppError;

/// Check if metrics are enabled via the `STOCKBOOK_METRICS_ENABLED` env var.
/// Defaults to `true` when the variable is absent or set to anything other
/// than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("STOCKBOOK_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
///
/// Signup/login, health probes, and `/metrics` are mounted outside the auth
/// middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let limiter = RateLimiter::new(RateLimitConfig::default());
    let metrics_on = metrics_enabled();

    // Authenticated API routes.
    //
    // Body size limit: 2 MiB. This prevents OOM from oversized request bodies.
    //
    // Middleware execution order (outermost → innermost):
    //   TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
    //
    // Auth runs BEFORE rate limiting so unauthenticated requests are rejected
    // without consuming rate limit quota.
    let api = Router::new()
        .merge(routes::auth::router())
        .merge(routes::products::router())
        .merge(routes::locations::router())
        .merge(routes::stock::router())
        .merge(routes::alerts::router())
        .merge(routes::dashboard::router())
        .merge(openapi::router());

    let mut api = api
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    // Only register the metrics middleware when metrics are enabled.
    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api
        .layer(TraceLayer::new_for_http())
        .layer(Extension(limiter))
        .with_state(state.clone());

    // Unauthenticated routes: signup/login, health probes, metrics scrape.
    let mut unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .merge(routes::auth::public_router())
        .layer(DefaultBodyLimit::max(64 * 1024));

    if metrics_on {
        unauthenticated = unauthenticated
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }

    let unauthenticated = unauthenticated.with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// GET /metrics — Prometheus metrics scrape endpoint.
///
/// Updates domain gauges from current `AppState` on each scrape (pull model),
/// then gathers and encodes all metrics in Prometheus text exposition format.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    // -- Update domain gauges from AppState --

    // Active products by stock status.
    let products = state.products.list();
    let mut in_stock = 0usize;
    let mut low = 0usize;
    let mut out = 0usize;
    let mut movements: u64 = 0;
    for p in &products {
        movements += p.stock.movements.len() as u64;
        if !p.is_active {
            continue;
        }
        match p.stock.status() {
            stockbook_ledger::StockStatus::InStock => in_stock += 1,
            stockbook_ledger::StockStatus::LowStock => low += 1,
            stockbook_ledger::StockStatus::OutOfStock => out += 1,
        }
    }
    metrics.products_total().reset();
    metrics
        .products_total()
        .with_label_values(&["in_stock"])
        .set(in_stock as f64);
    metrics
        .products_total()
        .with_label_values(&["low_stock"])
        .set(low as f64);
    metrics
        .products_total()
        .with_label_values(&["out_of_stock"])
        .set(out as f64);
    metrics.movements_total().set(movements as f64);

    // Open alerts by severity, plus unread count.
    let alerts = state.alerts.list();
    metrics.alerts_open_total().reset();
    let mut unread = 0usize;
    for severity in ["low", "medium", "high", "critical"] {
        let count = alerts
            .iter()
            .filter(|a| !a.is_resolved && a.severity.as_str() == severity)
            .count();
        metrics
            .alerts_open_total()
            .with_label_values(&[severity])
            .set(count as f64);
    }
    for a in &alerts {
        if !a.is_read {
            unread += 1;
        }
    }
    metrics.alerts_unread_total().set(unread as f64);

    // Locations, users, sessions.
    metrics
        .locations_active_total()
        .set(state.locations.count(|l| l.is_active) as f64);
    metrics.users_total().set(state.users.len() as f64);
    metrics
        .sessions_active_total()
        .set(state.sessions.len() as f64);

    // -- Gather and encode --
    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the application is ready to serve traffic.
///
/// Checks:
/// - In-memory stores are accessible (read locks acquirable).
/// - Database connection is healthy (when configured).
///
/// Returns 200 "ready" or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    // Verify stores are accessible.
    let _ = state.products.len();
    let _ = state.locations.len();
    let _ = state.alerts.len();
    let _ = state.users.len();

    // Verify database connection (when configured).
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
