//! Session persistence operations.
//!
//! Sessions are keyed by token digest; the plaintext token is never stored.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::SessionRecord;

/// Insert a new session record.
pub async fn insert(pool: &PgPool, record: &SessionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (token_digest, user_id, created_at) VALUES ($1, $2, $3)",
    )
    .bind(&record.token_digest)
    .bind(record.user_id)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all sessions from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<SessionRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SessionRow>(
        "SELECT token_digest, user_id, created_at FROM sessions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(SessionRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct SessionRow {
    token_digest: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_record(self) -> SessionRecord {
        SessionRecord {
            token_digest: self.token_digest,
            user_id: self.user_id,
            created_at: self.created_at,
        }
    }
}
