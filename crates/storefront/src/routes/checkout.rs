//! Checkout shipping endpoints.
//!
//! The storefront posts every address selection here. The response carries
//! the updated shipping form and the method list, with the dynamic method
//! first and pre-selected when a distance quote succeeded.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tienda_core::{CheckoutToken, ShippingInfo, ShippingMethod, ShippingSettings};

use crate::error::{AppError, Result};
use crate::geocoding::AddressSelection;
use crate::services::{CheckoutShipping, ShippingQuote};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRequest {
    pub address: AddressSelection,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectMethodRequest {
    pub method_id: String,
}

/// Current shipping state of a checkout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodsResponse {
    pub shipping: ShippingInfo,
    pub methods: Vec<ShippingMethod>,
    pub selected_id: Option<String>,
}

impl From<&CheckoutShipping> for ShippingMethodsResponse {
    fn from(checkout: &CheckoutShipping) -> Self {
        Self {
            shipping: checkout.info.clone(),
            methods: checkout.methods.methods(),
            selected_id: checkout.methods.selected_id().map(str::to_owned),
        }
    }
}

/// Shipping settings for a checkout request.
///
/// When settings cannot be read the checkout still proceeds, with dynamic
/// shipping off and the default couriers.
async fn shipping_settings(state: &AppState) -> ShippingSettings {
    match state.settings().load_or_default().await {
        Ok(settings) => settings.shipping,
        Err(e) => {
            tracing::warn!(error = %e, "settings unavailable; dynamic shipping disabled");
            ShippingSettings {
                enable_dynamic_shipping: false,
                ..ShippingSettings::default()
            }
        }
    }
}

/// `POST /api/checkout/{checkout_id}/shipping`
#[instrument(skip(state, request))]
pub async fn quote(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    Json(request): Json<ShippingRequest>,
) -> Result<Json<ShippingQuote>> {
    let token = CheckoutToken::parse(&checkout_id)?;
    let settings = shipping_settings(&state).await;

    let mut checkout = state.checkouts().get_or_new(&token, &settings).await;
    if let Some(full_name) = request.full_name {
        checkout.info.full_name = full_name;
    }
    if let Some(phone) = request.phone {
        checkout.info.phone = phone;
    }

    let quote = state
        .pipeline()
        .quote(&settings, &request.address, &mut checkout)
        .await;
    state.checkouts().put(token, checkout).await;

    Ok(Json(quote))
}

/// `GET /api/checkout/{checkout_id}/shipping`
///
/// A checkout with no address yet gets the static couriers.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
) -> Result<Json<ShippingMethodsResponse>> {
    let token = CheckoutToken::parse(&checkout_id)?;
    let checkout = match state.checkouts().get(&token).await {
        Some(checkout) => checkout,
        None => CheckoutShipping::new(&shipping_settings(&state).await),
    };
    Ok(Json(ShippingMethodsResponse::from(&checkout)))
}

/// `PUT /api/checkout/{checkout_id}/shipping/selected`
#[instrument(skip(state))]
pub async fn select(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    Json(request): Json<SelectMethodRequest>,
) -> Result<Json<ShippingMethodsResponse>> {
    let token = CheckoutToken::parse(&checkout_id)?;
    let mut checkout = state
        .checkouts()
        .get(&token)
        .await
        .ok_or_else(|| AppError::NotFound(format!("checkout {token}")))?;

    let method = checkout.methods.select(&request.method_id)?;
    tracing::debug!(method = %method.id, price = method.price, "shipping method selected");

    let response = ShippingMethodsResponse::from(&checkout);
    state.checkouts().put(token, checkout).await;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::json;
    use tienda_core::{DYNAMIC_METHOD_ID, StoreSettings, default_static_methods};

    use crate::db::{RepositoryError, SettingsStore};
    use crate::geocoding::testing::{FakeGeocoder, las_condes};
    use crate::routes::test_support::{get, json_body, json_request, send};
    use crate::routing::testing::FakeDistance;
    use crate::state::testing::{state, state_with};

    fn dynamic_settings(base_fee: f64, price_per_km: f64) -> StoreSettings {
        let mut settings = StoreSettings::default();
        settings.shipping.enable_dynamic_shipping = true;
        settings.shipping.shipping_base_fee = base_fee;
        settings.shipping.shipping_price_per_km = price_per_km;
        settings.shipping.shipping_origin_lat = Some(-33.45);
        settings.shipping.shipping_origin_lng = Some(-70.66);
        settings
    }

    fn address_body() -> serde_json::Value {
        json!({
            "fullName": "Camila Rojas",
            "address": {"kind": "text", "query": "Av. Apoquindo 4500"}
        })
    }

    /// Settings store whose database is down.
    struct DownStore;

    #[async_trait]
    impl SettingsStore for DownStore {
        async fn load(&self) -> Result<Option<StoreSettings>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn save(&self, _settings: &StoreSettings) -> Result<StoreSettings, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn ping(&self) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn quote_injects_and_selects_dynamic_method() {
        let app = state(
            dynamic_settings(3500.0, 500.0),
            FakeGeocoder::returning(las_condes()),
            FakeDistance::km(5.2),
        );

        let response = send(
            app,
            json_request("POST", "/api/checkout/chk_42/shipping", &address_body()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;

        assert_eq!(body["resolved"], true);
        assert_eq!(body["selectedId"], DYNAMIC_METHOD_ID);
        assert_eq!(body["methods"][0]["price"], 6100);
        assert_eq!(body["shipping"]["fullName"], "Camila Rojas");
        assert_eq!(body["shipping"]["city"], "Las Condes");
        assert_eq!(body["distance"]["success"], true);
    }

    #[tokio::test]
    async fn state_is_kept_between_requests() {
        let app = state(
            dynamic_settings(1000.0, 0.0),
            FakeGeocoder::returning(las_condes()),
            FakeDistance::km(12.0),
        );

        send(
            app.clone(),
            json_request("POST", "/api/checkout/chk_42/shipping", &address_body()),
        )
        .await;
        let body = json_body(send(app, get("/api/checkout/chk_42/shipping")).await).await;

        assert_eq!(body["methods"][0]["price"], 1000);
        assert_eq!(body["selectedId"], DYNAMIC_METHOD_ID);
        assert_eq!(body["shipping"]["fullName"], "Camila Rojas");
    }

    #[tokio::test]
    async fn unknown_checkout_lists_static_methods() {
        let app = state(
            dynamic_settings(3500.0, 500.0),
            FakeGeocoder::default(),
            FakeDistance::km(5.2),
        );

        let body = json_body(send(app, get("/api/checkout/chk_new/shipping")).await).await;

        assert_eq!(
            body["methods"].as_array().map(Vec::len),
            Some(default_static_methods().len())
        );
        assert!(body["selectedId"].is_null());
    }

    #[tokio::test]
    async fn select_switches_to_a_static_method() {
        let app = state(
            dynamic_settings(3500.0, 500.0),
            FakeGeocoder::returning(las_condes()),
            FakeDistance::km(5.2),
        );
        send(
            app.clone(),
            json_request("POST", "/api/checkout/chk_42/shipping", &address_body()),
        )
        .await;

        let response = send(
            app.clone(),
            json_request(
                "PUT",
                "/api/checkout/chk_42/shipping/selected",
                &json!({"methodId": "express"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["selectedId"], "express");

        let unknown = send(
            app,
            json_request(
                "PUT",
                "/api/checkout/chk_42/shipping/selected",
                &json!({"methodId": "drone"}),
            ),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn select_on_unknown_checkout_is_not_found() {
        let app = state(
            StoreSettings::default(),
            FakeGeocoder::default(),
            FakeDistance::km(1.0),
        );
        let response = send(
            app,
            json_request(
                "PUT",
                "/api/checkout/chk_gone/shipping/selected",
                &json!({"methodId": "standard"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_checkout_id_is_bad_request() {
        let app = state(
            StoreSettings::default(),
            FakeGeocoder::default(),
            FakeDistance::km(1.0),
        );
        let response = send(app, get("/api/checkout/chk%20bad/shipping")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn settings_outage_disables_dynamic_shipping() {
        let app = state_with(
            Arc::new(DownStore),
            FakeGeocoder::returning(las_condes()),
            FakeDistance::km(5.2),
        );

        let response = send(
            app,
            json_request("POST", "/api/checkout/chk_42/shipping", &address_body()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;

        assert_eq!(body["resolved"], true);
        assert!(body.get("distance").is_none());
        assert!(
            body["methods"]
                .as_array()
                .is_some_and(|m| m.iter().all(|m| m["id"] != DYNAMIC_METHOD_ID))
        );
    }
}
