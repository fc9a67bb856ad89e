//! Reconciliation engine.
//!
//! One pass walks every active user and converges two things against the
//! external authorities: the persisted customer-id set (against the
//! accounts API) and the marketplace entitlement set per customer id
//! (against the billing subscription and the SKU catalog). Every cycle
//! recomputes from current source-of-truth queries; nothing is cached
//! across passes, so an aborted pass is safely retried by the next one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use granta_core::{
    catalog, plan_for_id, ApiError, BillingError, BillingProvider, BillingSubscription,
    CustomerId, CustomerIdSource, EntitlementApi, IdentityStore, Sku, StoreError, User,
};

/// Error that aborts a reconciliation pass.
///
/// Recoverable billing failures never reach this type; they are handled at
/// per-user granularity inside the driver.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Identity-store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Identity-provider or marketplace API failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Unrecoverable billing-provider failure.
    #[error(transparent)]
    Billing(#[from] BillingError),
}

/// Counters collected over one pass, for operator logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Active users walked.
    pub users_seen: u64,
    /// Users whose entitlement step was skipped on a billing failure.
    pub users_skipped: u64,
    /// Customer-id associations persisted.
    pub ids_saved: u64,
    /// Customer-id associations removed.
    pub ids_removed: u64,
    /// Entitlements created.
    pub entitlements_created: u64,
    /// Entitlement subscription records removed.
    pub entitlements_removed: u64,
}

/// Outcome of resolving a user's billing subscription.
enum BillingOutcome {
    /// The user's subscription, or `None` when the user has no billing
    /// relationship or no active subscription.
    Resolved(Option<BillingSubscription>),
    /// A recoverable billing failure; skip this user's entitlement step.
    SkipUser,
}

/// The reconciliation engine.
pub struct Reconciler {
    store: Arc<dyn IdentityStore>,
    accounts: Arc<dyn CustomerIdSource>,
    billing: Arc<dyn BillingProvider>,
    entitlements: Arc<dyn EntitlementApi>,
    include_orgs: bool,
}

impl Reconciler {
    /// Create an engine over the four collaborator seams.
    pub fn new(
        store: Arc<dyn IdentityStore>,
        accounts: Arc<dyn CustomerIdSource>,
        billing: Arc<dyn BillingProvider>,
        entitlements: Arc<dyn EntitlementApi>,
    ) -> Self {
        Self {
            store,
            accounts,
            billing,
            entitlements,
            include_orgs: true,
        }
    }

    /// Whether organizational accounts are reconciled too.
    #[must_use]
    pub fn with_include_orgs(mut self, include_orgs: bool) -> Self {
        self.include_orgs = include_orgs;
        self
    }

    /// Run one full reconciliation pass over all active users.
    ///
    /// Users are independent; a recoverable billing failure skips that
    /// user's entitlement step only. Any other failure aborts the pass and
    /// the next scheduled run retries from a clean snapshot.
    pub async fn reconcile_all(&self) -> Result<PassSummary, ReconcileError> {
        info!("Reconciliation pass looking for entitlement drift...");

        let mut summary = PassSummary::default();
        let users = self.store.active_users(self.include_orgs).await?;

        for user in &users {
            summary.users_seen += 1;

            let customer_ids = self.sync_customer_ids(user, &mut summary).await?;
            if customer_ids.is_empty() {
                continue;
            }

            let subscription = match self.billing_subscription(user).await? {
                BillingOutcome::Resolved(subscription) => subscription,
                BillingOutcome::SkipUser => {
                    summary.users_skipped += 1;
                    continue;
                }
            };

            // One billing subscription governs all of the user's customer
            // ids.
            for customer_id in &customer_ids {
                self.resolve_entitlements(customer_id, subscription.as_ref(), user, &mut summary)
                    .await?;
            }

            debug!(user = %user.username, "Finished work for user");
        }

        info!(
            users_seen = summary.users_seen,
            users_skipped = summary.users_skipped,
            ids_saved = summary.ids_saved,
            ids_removed = summary.ids_removed,
            entitlements_created = summary.entitlements_created,
            entitlements_removed = summary.entitlements_removed,
            "Reconciliation pass done"
        );
        Ok(summary)
    }

    /// Converge the persisted customer-id set for one user onto what the
    /// accounts API reports, and return the live set.
    ///
    /// An empty return means the user is not a recognized billing customer
    /// this cycle and no entitlement work proceeds for them.
    async fn sync_customer_ids(
        &self,
        user: &User,
        summary: &mut PassSummary,
    ) -> Result<Vec<CustomerId>, ReconcileError> {
        let model_ids = self
            .store
            .web_customer_ids(user.id)
            .await?
            .unwrap_or_default();
        debug!(
            user = %user.username,
            count = model_ids.len(),
            "Store returned customer ids"
        );

        let Some(api_ids) = self.accounts.lookup_customer_ids(&user.email).await? else {
            debug!(email = %user.email, "No web customer ids found");
            if !model_ids.is_empty() {
                debug!(
                    user = %user.username,
                    ids = ?model_ids,
                    "Removing conflicting customer ids"
                );
                for customer_id in &model_ids {
                    self.store.remove_web_customer_id(user, customer_id).await?;
                    summary.ids_removed += 1;
                }
            }
            return Ok(Vec::new());
        };

        debug!(
            email = %user.email,
            count = api_ids.len(),
            "Provider returned customer ids"
        );

        for customer_id in &api_ids {
            if !model_ids.contains(customer_id) {
                debug!(
                    user = %user.username,
                    customer_id = %customer_id,
                    "Saving new customer id"
                );
                self.store.save_web_customer_id(user, customer_id).await?;
                summary.ids_saved += 1;
            }
        }

        for customer_id in &model_ids {
            if !api_ids.contains(customer_id) {
                self.store.remove_web_customer_id(user, customer_id).await?;
                summary.ids_removed += 1;
            }
        }

        Ok(api_ids)
    }

    /// Resolve the user's billing subscription once per user, classifying
    /// recoverable failures for per-user skip.
    async fn billing_subscription(&self, user: &User) -> Result<BillingOutcome, ReconcileError> {
        let Some(reference) = &user.billing_reference else {
            return Ok(BillingOutcome::Resolved(None));
        };

        match self.billing.retrieve_customer(reference).await {
            Ok(customer) => Ok(BillingOutcome::Resolved(customer.subscription)),
            Err(BillingError::Connectivity { message }) => {
                error!(
                    user = %user.username,
                    error = %message,
                    "Cannot connect to billing provider"
                );
                Ok(BillingOutcome::SkipUser)
            }
            Err(BillingError::InvalidReference { reference }) => {
                warn!(
                    user = %user.username,
                    reference = %reference,
                    "Invalid billing reference"
                );
                Ok(BillingOutcome::SkipUser)
            }
            Err(err @ BillingError::Unexpected { .. }) => Err(err.into()),
        }
    }

    /// Converge one customer id's entitlement set.
    ///
    /// Prefetches the held SKU set first; the paying decision and every
    /// corrective call are computed from that one consistent snapshot, in
    /// order.
    async fn resolve_entitlements(
        &self,
        customer_id: &CustomerId,
        subscription: Option<&BillingSubscription>,
        user: &User,
        summary: &mut PassSummary,
    ) -> Result<(), ReconcileError> {
        let customer_skus = self.prefetch_customer_skus(customer_id).await?;

        let paying = if let Some(subscription) = subscription {
            // A live billing subscription means paying, whether or not the
            // plan maps to a catalog SKU.
            if let Some(plan_sku) = plan_for_id(&subscription.plan_id).and_then(|p| p.sku()) {
                if !customer_skus.contains(&plan_sku) {
                    debug!(
                        user = %user.username,
                        customer_id = %customer_id,
                        sku = %plan_sku,
                        "Found missing plan SKU to create"
                    );
                    self.entitlements
                        .create_entitlement(customer_id, &plan_sku)
                        .await?;
                    summary.entitlements_created += 1;
                }
            }
            true
        } else if customer_skus.len() == 1 && customer_skus[0].is_free_tier() {
            // Holding only the free tier must not count as paying.
            false
        } else {
            !customer_skus.is_empty()
        };

        let free_tier = Sku::free_tier();
        let holds_free_tier = customer_skus.contains(&free_tier);

        if !paying && !holds_free_tier {
            debug!(
                user = %user.username,
                customer_id = %customer_id,
                "Granting free tier"
            );
            self.entitlements
                .create_entitlement(customer_id, &free_tier)
                .await?;
            summary.entitlements_created += 1;
        } else if paying && holds_free_tier {
            // A paying customer may hold several free-tier records; every
            // one of them goes.
            let records = self
                .entitlements
                .lookup_subscriptions(customer_id, &free_tier)
                .await?;
            for record in records {
                debug!(
                    user = %user.username,
                    customer_id = %customer_id,
                    subscription_id = %record.id,
                    "Removing free-tier subscription from paying customer"
                );
                self.entitlements.remove_entitlement(&record.id).await?;
                summary.entitlements_removed += 1;
            }
        }

        Ok(())
    }

    /// The subset of the catalog for which the marketplace holds at least
    /// one subscription record for this customer id.
    async fn prefetch_customer_skus(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Sku>, ReconcileError> {
        let mut found = Vec::new();
        for sku in catalog() {
            let records = self
                .entitlements
                .lookup_subscriptions(customer_id, &sku)
                .await?;
            if !records.is_empty() {
                found.push(sku);
            }
        }
        Ok(found)
    }
}
