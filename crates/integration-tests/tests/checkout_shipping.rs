//! Integration tests for the checkout shipping pipeline.
//!
//! These tests require:
//! - The storefront server running with network access to its map providers
//! - Settings with dynamic shipping enabled and an origin set, e.g.
//!   `tienda-cli settings set-origin --lat -33.45 --lng -70.66` and
//!   `tienda-cli settings set-rates --base-fee 3500 --price-per-km 500 --enable`
//!
//! Run with: cargo test -p tienda-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};
use tienda_integration_tests::{client, storefront_base_url, unique_checkout_id};

#[tokio::test]
#[ignore = "Requires running storefront server and map provider access"]
async fn test_checkout_quote_offers_dynamic_method() {
    let client = client().expect("Failed to create HTTP client");
    let base_url = storefront_base_url();
    let checkout_id = unique_checkout_id();

    let resp = client
        .post(format!("{base_url}/api/checkout/{checkout_id}/shipping"))
        .json(&json!({
            "fullName": "Prueba Integración",
            "address": {"kind": "text", "query": "Av. Apoquindo 4500, Las Condes, Chile"}
        }))
        .send()
        .await
        .expect("Failed to post address");

    assert_eq!(resp.status(), StatusCode::OK);
    let quote: Value = resp.json().await.expect("Failed to parse quote");

    assert_eq!(quote["resolved"], true);
    assert_eq!(quote["selectedId"], "dynamic");
    assert_eq!(quote["methods"][0]["id"], "dynamic");
    assert!(quote["methods"][0]["price"].as_i64().is_some_and(|p| p > 0));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_unresolvable_address_keeps_static_methods() {
    let client = client().expect("Failed to create HTTP client");
    let base_url = storefront_base_url();
    let checkout_id = unique_checkout_id();

    let resp = client
        .post(format!("{base_url}/api/checkout/{checkout_id}/shipping"))
        .json(&json!({"address": {"kind": "text", "query": "zzzz qqqq xxxx 000000"}}))
        .send()
        .await
        .expect("Failed to post address");

    assert_eq!(resp.status(), StatusCode::OK);
    let quote: Value = resp.json().await.expect("Failed to parse quote");

    assert_eq!(quote["resolved"], false);
    let methods = quote["methods"].as_array().expect("methods array");
    assert!(!methods.is_empty());
    assert!(methods.iter().all(|m| m["id"] != "dynamic"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_select_static_method() {
    let client = client().expect("Failed to create HTTP client");
    let base_url = storefront_base_url();
    let checkout_id = unique_checkout_id();

    client
        .post(format!("{base_url}/api/checkout/{checkout_id}/shipping"))
        .json(&json!({"address": {"kind": "coordinates", "lat": -33.5, "lng": -70.6}}))
        .send()
        .await
        .expect("Failed to post address");

    let resp = client
        .put(format!("{base_url}/api/checkout/{checkout_id}/shipping/selected"))
        .json(&json!({"methodId": "pickup"}))
        .send()
        .await
        .expect("Failed to select method");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse methods");
    assert_eq!(body["selectedId"], "pickup");
}
