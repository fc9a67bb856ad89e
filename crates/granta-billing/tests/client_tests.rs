//! Billing client tests using wiremock.
//!
//! Cover the happy paths (with and without an active subscription) and the
//! three error shapes the driver branches on.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use granta_billing::BillingClient;
use granta_core::{BillingError, BillingProvider, BillingReference, PlanId};

fn client(base_url: &str) -> BillingClient {
    BillingClient::new(base_url, "test-token", Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn retrieves_customer_with_subscription() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_123"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_123",
            "subscription": { "id": "sub_9", "plan": { "id": "bus-small-2018" } }
        })))
        .mount(&server)
        .await;

    let customer = client(&server.uri())
        .retrieve_customer(&BillingReference::new("cus_123"))
        .await
        .unwrap();

    assert_eq!(customer.reference, BillingReference::new("cus_123"));
    let subscription = customer.subscription.unwrap();
    assert_eq!(subscription.plan_id, PlanId::new("bus-small-2018"));
}

#[tokio::test]
async fn retrieves_customer_without_subscription() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_456",
            "subscription": null
        })))
        .mount(&server)
        .await;

    let customer = client(&server.uri())
        .retrieve_customer(&BillingReference::new("cus_456"))
        .await
        .unwrap();

    assert!(customer.subscription.is_none());
}

#[tokio::test]
async fn unknown_reference_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .retrieve_customer(&BillingReference::new("cus_gone"))
        .await
        .unwrap_err();

    match err {
        BillingError::InvalidReference { reference } => {
            assert_eq!(reference, BillingReference::new("cus_gone"));
        }
        other => panic!("expected InvalidReference, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_unexpected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_123"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .retrieve_customer(&BillingReference::new("cus_123"))
        .await
        .unwrap_err();

    match err {
        BillingError::Unexpected { status, .. } => assert_eq!(status, 500),
        other => panic!("expected Unexpected, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_provider_is_connectivity() {
    // Port 9 (discard) is not listening.
    let err = client("http://127.0.0.1:9")
        .retrieve_customer(&BillingReference::new("cus_123"))
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::Connectivity { .. }));
}
