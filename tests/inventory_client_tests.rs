//! Admin API client tests
//!
//! Runs `ShopifyClient` against a wiremock server standing in for the
//! platform's REST API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test inventory_client_tests
//! ```

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use order_inventory_sync::config::ServiceConfig;
use order_inventory_sync::inventory::{
    ApiError, InventoryError, InventoryPlatform, LocationStrategy, ResolutionTarget, RetryPolicy,
    ShopifyClient,
};

const TOKEN: &str = "shpat_test_token";

fn client_for(server: &MockServer, strategy: LocationStrategy) -> ShopifyClient {
    client_with(server, |config| config.location_strategy = strategy)
}

fn client_with(server: &MockServer, tweak: impl FnOnce(&mut ServiceConfig)) -> ShopifyClient {
    let mut config = ServiceConfig::new("secret", "demo.myshopify.com", TOKEN).unwrap();
    config.api_base_url = Url::parse(&format!("{}/", server.uri())).unwrap();
    config.retry = RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    };
    tweak(&mut config);
    ShopifyClient::new(&config).unwrap()
}

async fn mount_variant(server: &MockServer, variant_id: u64, inventory_item_id: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/admin/api/2024-01/variants/{variant_id}.json")))
        .and(header("X-Shopify-Access-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "variant": {"id": variant_id, "inventory_item_id": inventory_item_id, "sku": "TEE-M"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_levels(server: &MockServer, inventory_item_id: u64, location_ids: &[u64]) {
    let levels: Vec<_> = location_ids
        .iter()
        .map(|location_id| {
            json!({
                "inventory_item_id": inventory_item_id,
                "location_id": location_id,
                "available": 10
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/inventory_levels.json"))
        .and(query_param("inventory_item_ids", inventory_item_id.to_string()))
        .and(header("X-Shopify-Access-Token", TOKEN))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "inventory_levels": levels })),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn adjust_mock(location_id: u64, inventory_item_id: u64, delta: i64, available: i64) -> Mock {
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/inventory_levels/adjust.json"))
        .and(header("X-Shopify-Access-Token", TOKEN))
        .and(body_json(json!({
            "location_id": location_id,
            "inventory_item_id": inventory_item_id,
            "available_adjustment": delta
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inventory_level": {
                "inventory_item_id": inventory_item_id,
                "location_id": location_id,
                "available": available
            }
        })))
}

// ============================================================================
// Adjustment sequence
// ============================================================================

#[tokio::test]
async fn test_adjust_resolves_and_adjusts_first_location() {
    let server = MockServer::start().await;
    mount_variant(&server, 55, 808).await;
    mount_levels(&server, 808, &[9001, 9002]).await;
    adjust_mock(9001, 808, -2, 8)
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server, LocationStrategy::FirstReturned)
        .adjust(55, -2)
        .await
        .unwrap();

    assert_eq!(receipt.variant_id, 55);
    assert_eq!(receipt.inventory_item_id, 808);
    assert_eq!(receipt.location_id, 9001);
    assert_eq!(receipt.delta, -2);
    assert_eq!(receipt.available, Some(8));
}

#[tokio::test]
async fn test_adjust_with_primary_location() {
    let server = MockServer::start().await;
    mount_variant(&server, 55, 808).await;
    mount_levels(&server, 808, &[9001, 9002]).await;
    adjust_mock(9002, 808, 3, 13)
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server, LocationStrategy::Primary(9002))
        .adjust(55, 3)
        .await
        .unwrap();

    assert_eq!(receipt.location_id, 9002);
    assert_eq!(receipt.available, Some(13));
}

#[tokio::test]
async fn test_primary_location_not_stocked() {
    let server = MockServer::start().await;
    mount_variant(&server, 55, 808).await;
    mount_levels(&server, 808, &[9001]).await;
    adjust_mock(9001, 808, -1, 9)
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server, LocationStrategy::Primary(7777))
        .adjust(55, -1)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        InventoryError::LocationNotStocked {
            inventory_item_id: 808,
            location_id: 7777
        }
    );
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unknown_variant_is_resolution_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/variants/404.json"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"errors":"Not Found"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, LocationStrategy::FirstReturned)
        .adjust(404, -1)
        .await
        .unwrap_err();

    match err {
        InventoryError::Resolution { target, id, source } => {
            assert_eq!(target, ResolutionTarget::Variant);
            assert_eq!(id, 404);
            assert!(source.is_not_found());
        }
        other => panic!("expected resolution error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_variant_without_inventory_item() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/variants/56.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "variant": {"id": 56, "inventory_item_id": null}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server, LocationStrategy::FirstReturned)
        .adjust(56, -1)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "resolution");
}

#[tokio::test]
async fn test_empty_levels_is_no_inventory_level() {
    let server = MockServer::start().await;
    mount_variant(&server, 55, 808).await;
    mount_levels(&server, 808, &[]).await;

    let err = client_for(&server, LocationStrategy::FirstReturned)
        .adjust(55, -2)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        InventoryError::NoInventoryLevel {
            inventory_item_id: 808
        }
    );
    assert_eq!(err.kind(), "no_inventory_level");
}

#[tokio::test]
async fn test_rejected_adjustment_is_not_retried() {
    let server = MockServer::start().await;
    mount_variant(&server, 55, 808).await;
    mount_levels(&server, 808, &[9001]).await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/inventory_levels/adjust.json"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_string(r#"{"errors":["Inventory item does not track quantities"]}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, LocationStrategy::FirstReturned)
        .adjust(55, -2)
        .await
        .unwrap_err();

    match err {
        InventoryError::Adjustment {
            inventory_item_id,
            location_id,
            source: ApiError::Status { status, body },
        } => {
            assert_eq!(inventory_item_id, 808);
            assert_eq!(location_id, 9001);
            assert_eq!(status, 422);
            assert!(body.contains("does not track quantities"));
        }
        other => panic!("expected adjustment error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/variants/55.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_variant(&server, 55, 808).await;
    mount_levels(&server, 808, &[9001]).await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/inventory_levels/adjust.json"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    adjust_mock(9001, 808, -2, 8)
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server, LocationStrategy::FirstReturned)
        .adjust(55, -2)
        .await
        .unwrap();

    assert_eq!(receipt.available, Some(8));
}

#[tokio::test]
async fn test_adjustment_server_error_is_sent_once() {
    let server = MockServer::start().await;
    mount_variant(&server, 55, 808).await;
    mount_levels(&server, 808, &[9001]).await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/inventory_levels/adjust.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, LocationStrategy::FirstReturned)
        .adjust(55, -2)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InventoryError::Adjustment {
            source: ApiError::Status { status: 503, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_adjustment_timeout_is_not_resent() {
    let server = MockServer::start().await;
    mount_variant(&server, 55, 808).await;
    mount_levels(&server, 808, &[9001]).await;
    // applied by the platform, but answered after the client gave up
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/inventory_levels/adjust.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(400))
                .set_body_json(json!({
                    "inventory_level": {"inventory_item_id": 808, "location_id": 9001, "available": 8}
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_with(&server, |config| {
        config.request_timeout = Duration::from_millis(100);
    })
    .adjust(55, -2)
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        InventoryError::Adjustment {
            source: ApiError::Transport(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/variants/55.json"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server, LocationStrategy::FirstReturned)
        .adjust(55, -2)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InventoryError::Resolution {
            source: ApiError::Status { status: 502, .. },
            ..
        }
    ));
}

// ============================================================================
// Shop info
// ============================================================================

#[tokio::test]
async fn test_shop_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/shop.json"))
        .and(header("X-Shopify-Access-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shop": {
                "id": 1,
                "name": "Demo Store",
                "domain": "shop.example.com",
                "myshopify_domain": "demo.myshopify.com"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let shop = client_for(&server, LocationStrategy::FirstReturned)
        .shop_info()
        .await
        .unwrap();

    assert_eq!(shop.name, "Demo Store");
    assert_eq!(shop.domain, "shop.example.com");
    assert_eq!(shop.myshopify_domain.as_deref(), Some("demo.myshopify.com"));
}

#[tokio::test]
async fn test_shop_info_bad_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-01/shop.json"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"{"errors":"[API] Invalid API key or access token"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, LocationStrategy::FirstReturned)
        .shop_info()
        .await
        .unwrap_err();

    assert!(!err.is_transient());
    assert!(err.to_string().contains("401"));
}
