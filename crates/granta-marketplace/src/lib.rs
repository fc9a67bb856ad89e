//! granta marketplace clients
//!
//! HTTP clients for the marketplace accounts API (email to customer ids)
//! and subscriptions API (entitlement lookup, create, remove),
//! implementing the [`granta_core::CustomerIdSource`] and
//! [`granta_core::EntitlementApi`] seams.

pub mod accounts;
mod client;
pub mod subscriptions;

pub use accounts::AccountsClient;
pub use client::MarketplaceConfig;
pub use subscriptions::SubscriptionsClient;
