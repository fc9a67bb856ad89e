//! Idempotent startup DDL for the tables this service owns.
//!
//! The `users` table belongs to the identity platform and is only read
//! here; the association and lock tables are created on boot so a fresh
//! deployment needs no separate migration step.

use sqlx::PgPool;
use tracing::info;

/// Create the service-owned tables if they do not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS user_web_customer_ids (
            user_id UUID NOT NULL,
            customer_id TEXT NOT NULL,
            PRIMARY KEY (user_id, customer_id)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS reconciliation_locks (
            name TEXT PRIMARY KEY,
            holder UUID NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    info!("Schema ensured");
    Ok(())
}
