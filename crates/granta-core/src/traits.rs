//! Collaborator traits consumed by the reconciliation engine.
//!
//! Each external authority is reached through one narrow capability trait
//! so the engine can be exercised against in-memory implementations.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{ApiResult, BillingError, LockError, StoreResult};
use crate::ids::{BillingReference, CustomerId, SubscriptionId, UserId};
use crate::sku::Sku;
use crate::types::{BillingCustomer, SubscriptionRecord, User};

/// The local identity store: users and their persisted customer-id
/// associations.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// All active user accounts, optionally including organizational
    /// accounts.
    async fn active_users(&self, include_orgs: bool) -> StoreResult<Vec<User>>;

    /// Persisted marketplace customer ids for a user. `None` when the user
    /// has never had an association recorded.
    async fn web_customer_ids(&self, user_id: UserId) -> StoreResult<Option<Vec<CustomerId>>>;

    /// Persist a customer-id association for a user.
    async fn save_web_customer_id(&self, user: &User, customer_id: &CustomerId) -> StoreResult<()>;

    /// Remove a persisted customer-id association for a user.
    async fn remove_web_customer_id(
        &self,
        user: &User,
        customer_id: &CustomerId,
    ) -> StoreResult<()>;
}

/// The identity-provider accounts API: authoritative source for which
/// customer ids belong to an email address.
#[async_trait]
pub trait CustomerIdSource: Send + Sync {
    /// Customer ids currently associated with the email, or `None` when
    /// the provider does not recognize the address as a billing customer.
    async fn lookup_customer_ids(&self, email: &str) -> ApiResult<Option<Vec<CustomerId>>>;
}

/// The billing provider: subscription and plan lookup for a customer
/// record.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Retrieve the billing customer behind a stored reference.
    async fn retrieve_customer(
        &self,
        reference: &BillingReference,
    ) -> Result<BillingCustomer, BillingError>;
}

/// The marketplace entitlement ledger.
///
/// Corrective calls must be idempotent at this seam: creating a grant that
/// already exists and removing one already gone are both successes.
#[async_trait]
pub trait EntitlementApi: Send + Sync {
    /// All subscription records the marketplace holds for (customer, SKU).
    async fn lookup_subscriptions(
        &self,
        customer_id: &CustomerId,
        sku: &Sku,
    ) -> ApiResult<Vec<SubscriptionRecord>>;

    /// Grant a SKU to a customer.
    async fn create_entitlement(&self, customer_id: &CustomerId, sku: &Sku) -> ApiResult<()>;

    /// Remove one subscription record by its id.
    async fn remove_entitlement(&self, subscription_id: &SubscriptionId) -> ApiResult<()>;
}

/// Proof of lock ownership, consumed by [`LockService::release`].
#[derive(Debug)]
pub struct LockHandle {
    name: String,
    holder: Uuid,
}

impl LockHandle {
    /// Create a handle for a won lease.
    #[must_use]
    pub fn new(name: impl Into<String>, holder: Uuid) -> Self {
        Self {
            name: name.into(),
            holder,
        }
    }

    /// The lock name this handle holds.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The holder token that won the lease.
    #[must_use]
    pub fn holder(&self) -> Uuid {
        self.holder
    }
}

/// Cluster-wide mutual exclusion with a time-to-live.
///
/// Exactly one concurrent acquirer wins within the TTL window. The TTL
/// must exceed the worst-case guarded run plus a safety margin; an early
/// expiry degrades to two interleaved runs, which idempotent work
/// tolerates but operators should treat as a near miss.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Try to acquire the named lock for `ttl`. Losing the race is the
    /// expected [`LockError::NotAcquired`] outcome, not a fault.
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<LockHandle, LockError>;

    /// Release a held lock.
    async fn release(&self, handle: LockHandle) -> Result<(), LockError>;
}
