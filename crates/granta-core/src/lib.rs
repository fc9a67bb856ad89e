//! granta core library
//!
//! Shared types and traits for the granta entitlement reconciler.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`UserId`, `CustomerId`, ...)
//! - [`sku`] - SKU catalog, free-tier SKU, billing-plan mapping
//! - [`types`] - Domain entities (`User`, `SubscriptionRecord`, ...)
//! - [`traits`] - Collaborator seams the engine is written against
//! - [`error`] - Error taxonomy shared across the seams

pub mod error;
pub mod ids;
pub mod sku;
pub mod traits;
pub mod types;

// Re-export main types for convenient access
pub use error::{ApiError, ApiResult, BillingError, LockError, StoreError, StoreResult};
pub use ids::{BillingReference, CustomerId, PlanId, SubscriptionId, UserId};
pub use sku::{catalog, plan_for_id, Plan, Sku, FREE_TIER_SKU, RECONCILER_SKUS};
pub use traits::{
    BillingProvider, CustomerIdSource, EntitlementApi, IdentityStore, LockHandle, LockService,
};
pub use types::{BillingCustomer, BillingSubscription, SubscriptionRecord, User};
