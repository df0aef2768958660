//! Stock alert persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stockbook_ledger::{AlertKind, AlertSeverity};
use uuid::Uuid;

use crate::state::AlertRecord;

/// Insert a new alert record.
pub async fn insert(pool: &PgPool, record: &AlertRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO stock_alerts (id, product_id, kind, location, current_quantity,
         threshold, severity, message, is_read, is_resolved, resolved_by, resolved_at,
         resolved_note, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(record.id)
    .bind(record.product_id)
    .bind(record.kind.as_str())
    .bind(&record.location)
    .bind(record.current_quantity as i64)
    .bind(record.threshold as i64)
    .bind(record.severity.as_str())
    .bind(&record.message)
    .bind(record.is_read)
    .bind(record.is_resolved)
    .bind(record.resolved_by)
    .bind(record.resolved_at)
    .bind(&record.resolved_note)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update an alert's acknowledgement fields.
pub async fn update_status(pool: &PgPool, record: &AlertRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE stock_alerts SET is_read = $1, is_resolved = $2, resolved_by = $3,
         resolved_at = $4, resolved_note = $5, updated_at = $6 WHERE id = $7",
    )
    .bind(record.is_read)
    .bind(record.is_resolved)
    .bind(record.resolved_by)
    .bind(record.resolved_at)
    .bind(&record.resolved_note)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all alerts from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<AlertRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AlertRow>(
        "SELECT id, product_id, kind, location, current_quantity, threshold, severity,
         message, is_read, is_resolved, resolved_by, resolved_at, resolved_note,
         created_at, updated_at
         FROM stock_alerts ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AlertRow::into_record).collect())
}

fn parse_kind(s: &str) -> AlertKind {
    match s {
        "low_stock" => AlertKind::LowStock,
        "out_of_stock" => AlertKind::OutOfStock,
        "overstock" => AlertKind::Overstock,
        "damaged_items" => AlertKind::DamagedItems,
        "expiry_warning" => AlertKind::ExpiryWarning,
        other => {
            tracing::warn!(kind = other, "unknown alert kind in database, defaulting to low_stock");
            AlertKind::LowStock
        }
    }
}

fn parse_severity(s: &str) -> AlertSeverity {
    match s {
        "low" => AlertSeverity::Low,
        "medium" => AlertSeverity::Medium,
        "high" => AlertSeverity::High,
        "critical" => AlertSeverity::Critical,
        other => {
            tracing::warn!(severity = other, "unknown alert severity in database, defaulting to medium");
            AlertSeverity::Medium
        }
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct AlertRow {
    id: Uuid,
    product_id: Uuid,
    kind: String,
    location: String,
    current_quantity: i64,
    threshold: i64,
    severity: String,
    message: String,
    is_read: bool,
    is_resolved: bool,
    resolved_by: Option<Uuid>,
    resolved_at: Option<DateTime<Utc>>,
    resolved_note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AlertRow {
    fn into_record(self) -> AlertRecord {
        AlertRecord {
            id: self.id,
            product_id: self.product_id,
            kind: parse_kind(&self.kind),
            location: self.location,
            current_quantity: self.current_quantity as u32,
            threshold: self.threshold as u32,
            severity: parse_severity(&self.severity),
            message: self.message,
            is_read: self.is_read,
            is_resolved: self.is_resolved,
            resolved_by: self.resolved_by,
            resolved_at: self.resolved_at,
            resolved_note: self.resolved_note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
