//! Error types shared across the reconciler's collaborator seams.
//!
//! Errors carry a transient/permanent shape the driver branches on
//! explicitly: billing connectivity and invalid-reference failures are
//! recovered at per-user granularity, everything else aborts the pass.

use thiserror::Error;

use crate::ids::BillingReference;

/// Error from the local identity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Error from the identity-provider or marketplace HTTP APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed to reach the API at all.
    #[error("connection failed: {message}")]
    Connectivity {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The API answered with an unexpected status.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The API answered with a body that could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },
}

/// Outcome of a billing-provider customer retrieval.
///
/// `Connectivity` and `InvalidReference` are the two recoverable shapes:
/// the driver logs them and skips the affected user for the cycle.
/// `Unexpected` propagates and aborts the pass.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Cannot reach the billing provider.
    #[error("cannot connect to billing provider: {message}")]
    Connectivity { message: String },

    /// The stored billing reference no longer names a customer.
    #[error("invalid billing reference: {reference}")]
    InvalidReference { reference: BillingReference },

    /// Any other billing-provider failure.
    #[error("billing provider returned status {status}: {message}")]
    Unexpected { status: u16, message: String },
}

/// Error from the distributed lock service.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another instance holds the lock within its TTL window. Expected
    /// under normal multi-instance operation; callers swallow this and
    /// skip the cycle.
    #[error("lock '{name}' is held by another instance")]
    NotAcquired { name: String },

    /// Underlying lock-backend failure.
    #[error("lock backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result alias for identity-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result alias for identity-provider and marketplace API operations.
pub type ApiResult<T> = Result<T, ApiError>;
