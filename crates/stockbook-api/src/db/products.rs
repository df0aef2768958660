//! Product persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `products` table.
//! The stock ledger is stored as a JSONB document alongside the catalog
//! columns, mirroring the in-memory record shape.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stockbook_core::Barcode;
use stockbook_ledger::StockLedger;
use uuid::Uuid;

use crate::state::ProductRecord;

/// Insert a new product record.
pub async fn insert(pool: &PgPool, record: &ProductRecord) -> Result<(), sqlx::Error> {
    let stock = serde_json::to_value(&record.stock)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        "INSERT INTO products (id, name, price, barcode, description, category, brand,
         stock, is_active, created_by, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(record.price)
    .bind(record.barcode.value())
    .bind(&record.description)
    .bind(&record.category)
    .bind(&record.brand)
    .bind(stock)
    .bind(record.is_active)
    .bind(record.created_by)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update an existing product record in full.
///
/// Stock mutations rewrite the whole ledger document — the in-memory record
/// is the source of truth and the row mirrors it.
pub async fn update(pool: &PgPool, record: &ProductRecord) -> Result<bool, sqlx::Error> {
    let stock = serde_json::to_value(&record.stock)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let result = sqlx::query(
        "UPDATE products SET name = $1, price = $2, barcode = $3, description = $4,
         category = $5, brand = $6, stock = $7, is_active = $8, updated_at = $9
         WHERE id = $10",
    )
    .bind(&record.name)
    .bind(record.price)
    .bind(record.barcode.value())
    .bind(&record.description)
    .bind(&record.category)
    .bind(&record.brand)
    .bind(stock)
    .bind(record.is_active)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a product row.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all products from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ProductRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, price, barcode, description, category, brand,
         stock, is_active, created_by, created_at, updated_at
         FROM products ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_record() {
            Some(record) => records.push(record),
            None => {
                tracing::error!("skipping product row with invalid barcode or ledger document");
            }
        }
    }
    Ok(records)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: f64,
    barcode: i64,
    description: String,
    category: String,
    brand: String,
    stock: serde_json::Value,
    is_active: bool,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_record(self) -> Option<ProductRecord> {
        let barcode = match Barcode::new(self.barcode) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(id = %self.id, barcode = self.barcode, error = %e,
                    "skipping product row with invalid barcode");
                return None;
            }
        };
        let stock: StockLedger = match serde_json::from_value(self.stock) {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e,
                    "skipping product row with undecodable stock ledger");
                return None;
            }
        };
        Some(ProductRecord {
            id: self.id,
            name: self.name,
            price: self.price,
            barcode,
            description: self.description,
            category: self.category,
            brand: self.brand,
            stock,
            is_active: self.is_active,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
