//! Marketplace subscriptions client.
//!
//! Lookup, create and remove of entitlement subscription records. The
//! corrective calls honor the re-run idempotence contract: creating a
//! grant that already exists (409) and removing one already gone (404)
//! are both reported as success, so an interrupted pass can simply be
//! re-run.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use granta_core::{
    ApiResult, CustomerId, EntitlementApi, Sku, SubscriptionId, SubscriptionRecord,
};

use crate::client::{connectivity, decode, status_error, MarketplaceConfig};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionPayload {
    id: String,
    customer_id: String,
    sku: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEntitlementRequest<'a> {
    customer_id: &'a str,
    sku: &'a str,
}

/// HTTP client for the marketplace subscriptions API.
#[derive(Debug, Clone)]
pub struct SubscriptionsClient {
    config: MarketplaceConfig,
    http_client: Client,
}

impl SubscriptionsClient {
    /// Create a new subscriptions client.
    pub fn new(config: MarketplaceConfig) -> Result<Self, reqwest::Error> {
        let http_client = config.build_http_client()?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl EntitlementApi for SubscriptionsClient {
    async fn lookup_subscriptions(
        &self,
        customer_id: &CustomerId,
        sku: &Sku,
    ) -> ApiResult<Vec<SubscriptionRecord>> {
        let url = format!("{}/v1/subscriptions", self.config.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("customerId", customer_id.as_str()), ("sku", sku.as_str())])
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(connectivity)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let records: Vec<SubscriptionPayload> = response.json().await.map_err(decode)?;
        Ok(records
            .into_iter()
            .map(|r| SubscriptionRecord {
                id: SubscriptionId::new(r.id),
                customer_id: CustomerId::new(r.customer_id),
                sku: Sku::new(r.sku),
            })
            .collect())
    }

    async fn create_entitlement(&self, customer_id: &CustomerId, sku: &Sku) -> ApiResult<()> {
        let url = format!("{}/v1/entitlements", self.config.base_url);
        debug!(customer_id = %customer_id, sku = %sku, "Creating entitlement");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&CreateEntitlementRequest {
                customer_id: customer_id.as_str(),
                sku: sku.as_str(),
            })
            .send()
            .await
            .map_err(connectivity)?;

        // Already granted counts as success.
        if response.status() == StatusCode::CONFLICT {
            debug!(customer_id = %customer_id, sku = %sku, "Entitlement already exists");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }

    async fn remove_entitlement(&self, subscription_id: &SubscriptionId) -> ApiResult<()> {
        let url = format!(
            "{}/v1/entitlements/{}",
            self.config.base_url, subscription_id
        );
        debug!(subscription_id = %subscription_id, "Removing entitlement");

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(connectivity)?;

        // Already removed counts as success.
        if response.status() == StatusCode::NOT_FOUND {
            debug!(subscription_id = %subscription_id, "Entitlement already removed");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }
}
