//! granta reconciliation engine
//!
//! Periodically converges a user's entitlement state across the local
//! identity store, the billing provider and the marketplace entitlement
//! ledger.
//!
//! # Modules
//!
//! - [`engine`] - identity-mapping diff, per-customer entitlement
//!   resolution, and the driver walking all active users
//! - [`worker`] - interval loop wrapping each pass in the cluster lock
//! - [`config`] - worker cadence and lock TTL settings

pub mod config;
pub mod engine;
pub mod worker;

pub use config::WorkerConfig;
pub use engine::{PassSummary, ReconcileError, Reconciler};
pub use worker::{ReconciliationWorker, RECONCILIATION_LOCK};
