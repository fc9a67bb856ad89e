//! Shared HTTP plumbing for the marketplace clients.

use reqwest::Client;
use std::time::Duration;

use granta_core::ApiError;

/// Connection settings shared by the accounts and subscriptions clients.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    /// Base URL of the marketplace API.
    pub base_url: String,
    /// Bearer token for API authentication.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl MarketplaceConfig {
    /// Create a config with the default request timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn build_http_client(&self) -> Result<Client, reqwest::Error> {
        Client::builder().timeout(self.timeout).build()
    }
}

pub(crate) fn connectivity(e: reqwest::Error) -> ApiError {
    ApiError::Connectivity {
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

pub(crate) fn decode(e: reqwest::Error) -> ApiError {
    ApiError::Decode {
        message: e.to_string(),
    }
}

pub(crate) async fn status_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ApiError::Status { status, message }
}
