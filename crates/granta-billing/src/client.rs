//! Billing-provider HTTP client (reqwest-based).
//!
//! Retrieves customer records with their active subscription and plan.
//! Failures are mapped onto the three-way [`BillingError`] the driver
//! branches on: transport problems become `Connectivity`, a reference the
//! provider no longer recognizes becomes `InvalidReference`, and anything
//! else becomes `Unexpected`.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use async_trait::async_trait;
use granta_core::{
    BillingCustomer, BillingError, BillingProvider, BillingReference, BillingSubscription, PlanId,
};

/// Customer payload returned by the billing provider.
#[derive(Debug, Deserialize)]
struct CustomerPayload {
    id: String,
    #[serde(default)]
    subscription: Option<SubscriptionPayload>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionPayload {
    plan: PlanPayload,
}

#[derive(Debug, Deserialize)]
struct PlanPayload {
    id: String,
}

/// HTTP client for the billing provider's customer API.
#[derive(Debug, Clone)]
pub struct BillingClient {
    base_url: String,
    token: String,
    http_client: Client,
}

impl BillingClient {
    /// Create a new billing client.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http_client,
        })
    }
}

#[async_trait]
impl BillingProvider for BillingClient {
    async fn retrieve_customer(
        &self,
        reference: &BillingReference,
    ) -> Result<BillingCustomer, BillingError> {
        let url = format!("{}/v1/customers/{}", self.base_url, reference);
        debug!(reference = %reference, "Retrieving billing customer");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BillingError::Connectivity {
                message: e.to_string(),
            })?;

        let status = response.status();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                return Err(BillingError::InvalidReference {
                    reference: reference.clone(),
                });
            }
            s if !s.is_success() => {
                let message = response.text().await.unwrap_or_default();
                return Err(BillingError::Unexpected {
                    status: s.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        let payload: CustomerPayload =
            response
                .json()
                .await
                .map_err(|e| BillingError::Unexpected {
                    status: status.as_u16(),
                    message: format!("undecodable customer payload: {e}"),
                })?;

        Ok(BillingCustomer {
            reference: BillingReference::new(payload.id),
            subscription: payload.subscription.map(|s| BillingSubscription {
                plan_id: PlanId::new(s.plan.id),
            }),
        })
    }
}
