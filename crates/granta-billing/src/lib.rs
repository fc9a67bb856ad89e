//! granta billing client
//!
//! Narrow client for the billing provider's customer API, implementing the
//! [`granta_core::BillingProvider`] seam.

pub mod client;

pub use client::BillingClient;
