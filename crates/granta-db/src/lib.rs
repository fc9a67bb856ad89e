//! granta database layer
//!
//! Postgres implementations of the identity-store seam plus the
//! cluster-wide lease lock that serializes reconciliation passes.

pub mod lock;
pub mod schema;
pub mod store;

pub use lock::LeaseLock;
pub use schema::ensure_schema;
pub use store::PgIdentityStore;
