//! Postgres-backed identity store.
//!
//! Reads the platform-owned `users` table and owns the
//! `user_web_customer_ids` association table. Associations carry no state
//! beyond the pair itself; the reconciler recomputes everything else from
//! source-of-truth queries each cycle.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use granta_core::{
    BillingReference, CustomerId, IdentityStore, StoreError, StoreResult, User, UserId,
};

/// Identity store over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row from the `users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    billing_reference: Option<String>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: UserId::from_uuid(self.id),
            username: self.username,
            email: self.email,
            billing_reference: self.billing_reference.map(BillingReference::new),
        }
    }
}

fn database_error(e: sqlx::Error) -> StoreError {
    StoreError::Database {
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn active_users(&self, include_orgs: bool) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r"
            SELECT id, username, email, billing_reference
            FROM users
            WHERE is_active = TRUE AND ($1 OR NOT is_organization)
            ORDER BY id
            ",
        )
        .bind(include_orgs)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn web_customer_ids(&self, user_id: UserId) -> StoreResult<Option<Vec<CustomerId>>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT customer_id
            FROM user_web_customer_ids
            WHERE user_id = $1
            ORDER BY customer_id
            ",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            rows.into_iter().map(|(id,)| CustomerId::new(id)).collect(),
        ))
    }

    async fn save_web_customer_id(&self, user: &User, customer_id: &CustomerId) -> StoreResult<()> {
        debug!(
            user = %user.username,
            customer_id = %customer_id,
            "Saving customer id association"
        );

        sqlx::query(
            r"
            INSERT INTO user_web_customer_ids (user_id, customer_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, customer_id) DO NOTHING
            ",
        )
        .bind(user.id.as_uuid())
        .bind(customer_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn remove_web_customer_id(
        &self,
        user: &User,
        customer_id: &CustomerId,
    ) -> StoreResult<()> {
        debug!(
            user = %user.username,
            customer_id = %customer_id,
            "Removing customer id association"
        );

        sqlx::query(
            r"
            DELETE FROM user_web_customer_ids
            WHERE user_id = $1 AND customer_id = $2
            ",
        )
        .bind(user.id.as_uuid())
        .bind(customer_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }
}
