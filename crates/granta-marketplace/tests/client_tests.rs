//! Marketplace client tests using wiremock.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use granta_core::{ApiError, CustomerId, CustomerIdSource, EntitlementApi, Sku, SubscriptionId};
use granta_marketplace::{AccountsClient, MarketplaceConfig, SubscriptionsClient};

fn config(base_url: &str) -> MarketplaceConfig {
    MarketplaceConfig::new(base_url, "test-token").with_timeout(Duration::from_secs(2))
}

// =============================================================================
// Accounts client
// =============================================================================

#[tokio::test]
async fn lookup_returns_customer_ids() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/accounts"))
        .and(query_param("email", "dev@example.com"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": "C2" }, { "id": "C3" }])),
        )
        .mount(&server)
        .await;

    let client = AccountsClient::new(config(&server.uri())).unwrap();
    let ids = client
        .lookup_customer_ids("dev@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(ids, vec![CustomerId::new("C2"), CustomerId::new("C3")]);
}

#[tokio::test]
async fn lookup_maps_empty_list_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = AccountsClient::new(config(&server.uri())).unwrap();
    let ids = client.lookup_customer_ids("gone@example.com").await.unwrap();

    assert!(ids.is_none());
}

#[tokio::test]
async fn lookup_maps_not_found_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/accounts"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = AccountsClient::new(config(&server.uri())).unwrap();
    let ids = client
        .lookup_customer_ids("unknown@example.com")
        .await
        .unwrap();

    assert!(ids.is_none());
}

#[tokio::test]
async fn lookup_surfaces_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/accounts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = AccountsClient::new(config(&server.uri())).unwrap();
    let err = client
        .lookup_customer_ids("dev@example.com")
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, .. } => assert_eq!(status, 503),
        other => panic!("expected Status, got {other:?}"),
    }
}

// =============================================================================
// Subscriptions client
// =============================================================================

#[tokio::test]
async fn lookup_subscriptions_decodes_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/subscriptions"))
        .and(query_param("customerId", "C1"))
        .and(query_param("sku", "MW04192"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "sub-1", "customerId": "C1", "sku": "MW04192" },
            { "id": "sub-2", "customerId": "C1", "sku": "MW04192" }
        ])))
        .mount(&server)
        .await;

    let client = SubscriptionsClient::new(config(&server.uri())).unwrap();
    let records = client
        .lookup_subscriptions(&CustomerId::new("C1"), &Sku::free_tier())
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, SubscriptionId::new("sub-1"));
    assert!(records.iter().all(|r| r.sku.is_free_tier()));
}

#[tokio::test]
async fn lookup_subscriptions_maps_not_found_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = SubscriptionsClient::new(config(&server.uri())).unwrap();
    let records = client
        .lookup_subscriptions(&CustomerId::new("C1"), &Sku::new("MW02701"))
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn create_entitlement_posts_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/entitlements"))
        .and(body_json(json!({ "customerId": "C1", "sku": "MW02702" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = SubscriptionsClient::new(config(&server.uri())).unwrap();
    client
        .create_entitlement(&CustomerId::new("C1"), &Sku::new("MW02702"))
        .await
        .unwrap();
}

#[tokio::test]
async fn create_entitlement_treats_conflict_as_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/entitlements"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let client = SubscriptionsClient::new(config(&server.uri())).unwrap();
    client
        .create_entitlement(&CustomerId::new("C1"), &Sku::free_tier())
        .await
        .unwrap();
}

#[tokio::test]
async fn remove_entitlement_deletes_record() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/entitlements/sub-7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = SubscriptionsClient::new(config(&server.uri())).unwrap();
    client
        .remove_entitlement(&SubscriptionId::new("sub-7"))
        .await
        .unwrap();
}

#[tokio::test]
async fn remove_entitlement_treats_not_found_as_success() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/entitlements/sub-7"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = SubscriptionsClient::new(config(&server.uri())).unwrap();
    client
        .remove_entitlement(&SubscriptionId::new("sub-7"))
        .await
        .unwrap();
}
