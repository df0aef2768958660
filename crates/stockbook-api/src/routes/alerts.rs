//! # Stock Alert API
//!
//! Routes:
//! - GET /v1/alerts — List alerts (filterable by unread/severity)
//! - PUT /v1/alerts/{id}/read — Mark an alert read
//! - PUT /v1/alerts/{id}/resolve — Resolve an alert

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use stockbook_ledger::AlertSeverity;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::{AlertRecord, AppState};

/// Maximum number of alerts returned by the list endpoint.
const LIST_CAP: usize = 100;

/// Alert list query parameters.
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// When true, only unread alerts are returned.
    pub unread: Option<bool>,
    /// Filter by severity (`low`, `medium`, `high`, `critical`).
    pub severity: Option<String>,
}

/// Request body for alert resolution.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResolveAlertRequest {
    #[serde(default)]
    pub resolved_note: Option<String>,
}

/// Build the alerts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/alerts", get(list_alerts))
        .route("/v1/alerts/:id/read", put(mark_read))
        .route("/v1/alerts/:id/resolve", put(resolve_alert))
}

fn parse_severity(s: &str) -> Result<AlertSeverity, AppError> {
    match s {
        "low" => Ok(AlertSeverity::Low),
        "medium" => Ok(AlertSeverity::Medium),
        "high" => Ok(AlertSeverity::High),
        "critical" => Ok(AlertSeverity::Critical),
        other => Err(AppError::Validation(format!(
            "unknown severity '{other}' (expected low, medium, high, or critical)"
        ))),
    }
}

/// GET /v1/alerts — List alerts, newest first, capped at 100.
#[utoipa::path(
    get,
    path = "/v1/alerts",
    params(
        ("unread" = Option<bool>, Query, description = "Only unread alerts"),
        ("severity" = Option<String>, Query, description = "Filter by severity"),
    ),
    responses(
        (status = 200, description = "Alerts", body = [AlertRecord]),
        (status = 422, description = "Unknown severity", body = crate::error::ErrorBody),
    ),
    tag = "alerts"
)]
async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<Vec<AlertRecord>>, AppError> {
    let severity = query.severity.as_deref().map(parse_severity).transpose()?;
    let unread_only = query.unread.unwrap_or(false);

    let mut alerts = state.alerts.list();
    alerts.retain(|a| {
        (!unread_only || !a.is_read) && severity.map_or(true, |s| a.severity == s)
    });
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    alerts.truncate(LIST_CAP);

    Ok(Json(alerts))
}

/// PUT /v1/alerts/{id}/read — Mark an alert read.
#[utoipa::path(
    put,
    path = "/v1/alerts/{id}/read",
    params(("id" = Uuid, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert marked read", body = AlertRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "alerts"
)]
async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlertRecord>, AppError> {
    let updated = state
        .alerts
        .update(&id, |a| {
            a.is_read = true;
            a.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::not_found(format!("alert {id} not found")))?;

    persist_alert_update(&state, &updated).await?;
    Ok(Json(updated))
}

/// PUT /v1/alerts/{id}/resolve — Resolve an alert.
///
/// Resolution frees the product/location/kind slot — the next breach of the
/// same combination raises a fresh alert.
#[utoipa::path(
    put,
    path = "/v1/alerts/{id}/resolve",
    params(("id" = Uuid, Path, description = "Alert ID")),
    request_body = ResolveAlertRequest,
    responses(
        (status = 200, description = "Alert resolved", body = AlertRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "alerts"
)]
async fn resolve_alert(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<ResolveAlertRequest>, JsonRejection>,
) -> Result<Json<AlertRecord>, AppError> {
    let req = extract_json(body).unwrap_or_default();

    let updated = state
        .alerts
        .update(&id, |a| {
            a.is_resolved = true;
            a.resolved_by = Some(caller.user_id);
            a.resolved_at = Some(Utc::now());
            a.resolved_note = req.resolved_note.clone().filter(|n| !n.is_empty());
            a.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::not_found(format!("alert {id} not found")))?;

    persist_alert_update(&state, &updated).await?;
    tracing::info!(alert_id = %id, resolved_by = %caller.user_id, "alert resolved");
    Ok(Json(updated))
}

/// Write an acknowledged alert through to the database.
async fn persist_alert_update(state: &AppState, record: &AlertRecord) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::alerts::update_status(pool, record).await {
            tracing::error!(alert_id = %record.id, error = %e,
                "failed to persist alert update");
            return Err(AppError::Internal(
                "alert updated in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}
