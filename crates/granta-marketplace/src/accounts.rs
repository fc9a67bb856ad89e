//! Marketplace accounts client.
//!
//! Resolves an email address to the customer ids the identity provider
//! currently associates with it. This is the authority the persisted
//! customer-id set is converged against every cycle.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use granta_core::{ApiResult, CustomerId, CustomerIdSource};

use crate::client::{connectivity, decode, status_error, MarketplaceConfig};

#[derive(Debug, Deserialize)]
struct AccountPayload {
    id: String,
}

/// HTTP client for the marketplace accounts API.
#[derive(Debug, Clone)]
pub struct AccountsClient {
    config: MarketplaceConfig,
    http_client: Client,
}

impl AccountsClient {
    /// Create a new accounts client.
    pub fn new(config: MarketplaceConfig) -> Result<Self, reqwest::Error> {
        let http_client = config.build_http_client()?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl CustomerIdSource for AccountsClient {
    async fn lookup_customer_ids(&self, email: &str) -> ApiResult<Option<Vec<CustomerId>>> {
        let url = format!("{}/v1/accounts", self.config.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("email", email)])
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(connectivity)?;

        // An address the provider has never seen yields 404; an address
        // with no remaining accounts yields an empty list. Both mean "not
        // a recognized billing customer".
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let accounts: Vec<AccountPayload> = response.json().await.map_err(decode)?;
        debug!(email = email, count = accounts.len(), "Looked up customer ids");

        if accounts.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            accounts
                .into_iter()
                .map(|a| CustomerId::new(a.id))
                .collect(),
        ))
    }
}
