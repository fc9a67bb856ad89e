//! Cluster-wide lease lock over a Postgres table.
//!
//! Serializes reconciliation passes across worker instances through a
//! single row per lock name. The lease carries an expiry so a crashed
//! holder cannot wedge the cluster: once `expires_at` passes, the next
//! acquirer takes the row over.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use granta_core::{LockError, LockHandle, LockService};

/// Lease-based distributed lock service.
#[derive(Debug, Clone)]
pub struct LeaseLock {
    pool: PgPool,
}

impl LeaseLock {
    /// Create a lock service over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend_error(e: sqlx::Error) -> LockError {
    LockError::Backend {
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl LockService for LeaseLock {
    /// Try to acquire the named lock for `ttl`.
    ///
    /// Exactly one concurrent caller wins: the insert takes the row if it
    /// is absent, and the conflict arm takes it over only when the current
    /// lease has expired.
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<LockHandle, LockError> {
        let holder = Uuid::new_v4();
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(0));

        let row: Option<(Uuid,)> = sqlx::query_as(
            r"
            INSERT INTO reconciliation_locks (name, holder, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET holder = EXCLUDED.holder, expires_at = EXCLUDED.expires_at
            WHERE reconciliation_locks.expires_at < now()
            RETURNING holder
            ",
        )
        .bind(name)
        .bind(holder)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        match row {
            Some((won,)) if won == holder => {
                debug!(name = name, ttl_secs = ttl.as_secs(), "Acquired lock");
                Ok(LockHandle::new(name, holder))
            }
            _ => Err(LockError::NotAcquired {
                name: name.to_string(),
            }),
        }
    }

    /// Release a held lock.
    ///
    /// Deletes the lease only if this handle still holds it; a lease that
    /// already expired and was taken over is left alone.
    async fn release(&self, handle: LockHandle) -> Result<(), LockError> {
        let result = sqlx::query(
            r"
            DELETE FROM reconciliation_locks
            WHERE name = $1 AND holder = $2
            ",
        )
        .bind(handle.name())
        .bind(handle.holder())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        if result.rows_affected() == 0 {
            // The lease expired mid-run and another instance took it over.
            warn!(name = %handle.name(), "Lock was no longer held at release");
        } else {
            debug!(name = %handle.name(), "Released lock");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_acquired_names_the_lock() {
        let err = LockError::NotAcquired {
            name: "reconciliation-worker".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "lock 'reconciliation-worker' is held by another instance"
        );
    }

    #[test]
    fn handle_exposes_name_and_holder() {
        let holder = Uuid::new_v4();
        let handle = LockHandle::new("reconciliation-worker", holder);
        assert_eq!(handle.name(), "reconciliation-worker");
        assert_eq!(handle.holder(), holder);
    }
}
