//! Location persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stockbook_core::LocationCode;
use uuid::Uuid;

use crate::state::{Address, ContactInfo, LocationKind, LocationRecord};

/// Insert a new location record.
pub async fn insert(pool: &PgPool, record: &LocationRecord) -> Result<(), sqlx::Error> {
    let address = serde_json::to_value(&record.address)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let contact = serde_json::to_value(&record.contact)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        "INSERT INTO locations (id, code, name, kind, address, contact, is_active,
         max_capacity, current_utilization, created_by, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(record.id)
    .bind(record.code.as_str())
    .bind(&record.name)
    .bind(record.kind.as_str())
    .bind(address)
    .bind(contact)
    .bind(record.is_active)
    .bind(record.max_capacity as i64)
    .bind(record.current_utilization as i64)
    .bind(record.created_by)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all locations from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<LocationRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LocationRow>(
        "SELECT id, code, name, kind, address, contact, is_active,
         max_capacity, current_utilization, created_by, created_at, updated_at
         FROM locations ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_record() {
            Some(record) => records.push(record),
            None => {
                tracing::error!("skipping location row with invalid code");
            }
        }
    }
    Ok(records)
}

fn parse_kind(s: &str) -> LocationKind {
    match s {
        "warehouse" => LocationKind::Warehouse,
        "store" => LocationKind::Store,
        "outlet" => LocationKind::Outlet,
        "distribution_center" => LocationKind::DistributionCenter,
        "other" => LocationKind::Other,
        other => {
            tracing::warn!(kind = other, "unknown location kind in database, defaulting to Other");
            LocationKind::Other
        }
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct LocationRow {
    id: Uuid,
    code: String,
    name: String,
    kind: String,
    address: serde_json::Value,
    contact: serde_json::Value,
    is_active: bool,
    max_capacity: i64,
    current_utilization: i64,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LocationRow {
    fn into_record(self) -> Option<LocationRecord> {
        let code = match LocationCode::new(self.code.clone()) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(id = %self.id, code = %self.code, error = %e,
                    "skipping location row with invalid code");
                return None;
            }
        };
        let address: Address = serde_json::from_value(self.address).unwrap_or_default();
        let contact: ContactInfo = serde_json::from_value(self.contact).unwrap_or_default();
        Some(LocationRecord {
            id: self.id,
            code,
            name: self.name,
            kind: parse_kind(&self.kind),
            address,
            contact,
            is_active: self.is_active,
            max_capacity: self.max_capacity as u32,
            current_utilization: self.current_utilization as u32,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
