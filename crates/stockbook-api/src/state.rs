//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! Records live in thread-safe in-memory stores and are written through to
//! PostgreSQL when a pool is configured. Every stock mutation runs inside a
//! single [`Store::try_update`] closure: one write-lock acquisition covers
//! the validate-mutate-recompute sequence, so two concurrent removals cannot
//! both pass the sufficiency check against the same balance.
//!
//! Sessions are keyed by the SHA-256 digest of the opaque token (a non-UUID
//! key, so they use a dedicated [`SessionStore`] rather than the generic
//! `Store<T>`).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use stockbook_core::{Barcode, LocationCode};
use stockbook_ledger::StockLedger;
use utoipa::ToSchema;
use uuid::Uuid;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
/// `parking_lot::RwLock` is non-poisonable — a panicking writer does not
/// permanently corrupt the store.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Insert a record unless any existing record matches `conflicts`.
    ///
    /// The scan and the insert run under a single write lock, so two
    /// concurrent inserts cannot both pass the uniqueness check. Returns
    /// `true` if the record was inserted.
    pub fn insert_unique_by(&self, id: Uuid, value: T, conflicts: impl Fn(&T) -> bool) -> bool {
        let mut guard = self.data.write();
        if guard.values().any(|existing| conflicts(existing)) {
            return false;
        }
        guard.insert(id, value);
        true
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Find the first record matching a predicate.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| pred(v)).cloned()
    }

    /// Count records matching a predicate.
    pub fn count(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.data.read().values().filter(|v| pred(v)).count()
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure receives a `&mut T` and may inspect the current state,
    /// validate preconditions, mutate the record, and return `Ok(R)` or
    /// `Err(E)`. The entire operation runs under a single write lock,
    /// eliminating TOCTOU races between read and update.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Record Types -------------------------------------------------------------

/// Product record: catalog metadata plus the embedded stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductRecord {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    /// Unique across the catalog.
    #[schema(value_type = i64)]
    pub barcode: Barcode,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    /// Multi-location quantities, movement log, and derived totals.
    #[schema(value_type = Object)]
    pub stock: StockLedger,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    "General".to_string()
}

/// Physical location classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Warehouse,
    #[default]
    Store,
    Outlet,
    DistributionCenter,
    Other,
}

impl LocationKind {
    /// Return the wire/database representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::Store => "store",
            Self::Outlet => "outlet",
            Self::DistributionCenter => "distribution_center",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for LocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postal address of a location. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Contact details for a location. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
}

/// Location record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationRecord {
    pub id: Uuid,
    /// Stable human-assigned identifier, unique across locations.
    #[schema(value_type = String)]
    pub code: LocationCode,
    pub name: String,
    pub kind: LocationKind,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub contact: ContactInfo,
    pub is_active: bool,
    pub max_capacity: u32,
    pub current_utilization: u32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock alert record: a threshold-violation observation awaiting human
/// acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AlertRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    #[schema(value_type = String)]
    pub kind: stockbook_ledger::AlertKind,
    pub location: String,
    pub current_quantity: u32,
    pub threshold: u32,
    #[schema(value_type = String)]
    pub severity: stockbook_ledger::AlertSeverity,
    pub message: String,
    pub is_read: bool,
    pub is_resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User credential record.
///
/// Deliberately NOT `Serialize`: the password hash must never reach a
/// response body. Handlers convert to [`UserProfile`] instead.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    /// Stored lowercased; uniqueness is checked against the normalized form.
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// An issued session, keyed in [`SessionStore`] by the token's SHA-256 digest.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token_digest: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Session store keyed by token digest.
///
/// Sessions have a string key (the hex digest), so they cannot use the
/// UUID-keyed generic `Store<T>`.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    data: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl SessionStore {
    /// Create an empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its token digest.
    pub fn insert(&self, session: SessionRecord) {
        self.data
            .write()
            .insert(session.token_digest.clone(), session);
    }

    /// Look up the session for a token digest.
    pub fn get(&self, token_digest: &str) -> Option<SessionRecord> {
        self.data.read().get(token_digest).cloned()
    }

    /// Remove a session, returning it if present.
    pub fn remove(&self, token_digest: &str) -> Option<SessionRecord> {
        self.data.write().remove(token_digest)
    }

    /// List all sessions.
    pub fn list(&self) -> Vec<SessionRecord> {
        self.data.read().values().cloned().collect()
    }

    /// Return the number of active sessions.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether no sessions exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -- Application State --------------------------------------------------------

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// bcrypt work factor for password hashing. Tests lower this to keep
    /// the suite fast; production uses the crate default.
    pub bcrypt_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in each store. When `db_pool` is
/// `Some`, mutations are written through to Postgres and the stores are
/// hydrated from it on startup; when `None`, the API runs in-memory only.
#[derive(Debug, Clone)]
pub struct AppState {
    pub products: Store<ProductRecord>,
    pub locations: Store<LocationRecord>,
    pub alerts: Store<AlertRecord>,
    pub users: Store<UserRecord>,
    pub sessions: SessionStore,

    /// PostgreSQL connection pool for durable persistence (optional).
    pub db_pool: Option<PgPool>,

    pub config: AppConfig,
}

impl AppState {
    /// Create a new application state with default configuration and no database.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create a new application state with the given configuration and
    /// optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            products: Store::new(),
            locations: Store::new(),
            alerts: Store::new(),
            users: Store::new(),
            sessions: SessionStore::new(),
            db_pool,
            config,
        }
    }

    /// Find a user by normalized (lowercased, trimmed) email.
    pub fn user_by_email(&self, email: &str) -> Option<UserRecord> {
        let normalized = email.trim().to_lowercase();
        self.users.find(|u| u.email == normalized)
    }

    /// Whether any product other than `exclude` already uses `barcode`.
    pub fn barcode_in_use(&self, barcode: i64, exclude: Option<Uuid>) -> bool {
        self.products
            .find(|p| p.barcode.value() == barcode && Some(p.id) != exclude)
            .is_some()
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available. Loads all
    /// persisted products, locations, alerts, users, and sessions into the
    /// in-memory stores so that read operations remain fast and synchronous.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let products = crate::db::products::load_all(pool)
            .await
            .map_err(|e| format!("failed to load products: {e}"))?;
        let product_count = products.len();
        for record in products {
            self.products.insert(record.id, record);
        }

        let locations = crate::db::locations::load_all(pool)
            .await
            .map_err(|e| format!("failed to load locations: {e}"))?;
        let location_count = locations.len();
        for record in locations {
            self.locations.insert(record.id, record);
        }

        let alerts = crate::db::alerts::load_all(pool)
            .await
            .map_err(|e| format!("failed to load alerts: {e}"))?;
        let alert_count = alerts.len();
        for record in alerts {
            self.alerts.insert(record.id, record);
        }

        let users = crate::db::users::load_all(pool)
            .await
            .map_err(|e| format!("failed to load users: {e}"))?;
        let user_count = users.len();
        for record in users {
            self.users.insert(record.id, record);
        }

        let sessions = crate::db::sessions::load_all(pool)
            .await
            .map_err(|e| format!("failed to load sessions: {e}"))?;
        let session_count = sessions.len();
        for record in sessions {
            self.sessions.insert(record);
        }

        tracing::info!(
            products = product_count,
            locations = location_count,
            alerts = alert_count,
            users = user_count,
            sessions = session_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
