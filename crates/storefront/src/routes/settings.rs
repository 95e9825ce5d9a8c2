//! Store settings endpoints.
//!
//! Reads are public so checkout can show rates and payment options.
//! Writes replace the whole settings document and need the admin token.

use axum::{Json, extract::State};
use tracing::instrument;

use tienda_core::{ShippingSettings, StoreSettings};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /api/settings`. Defaults when nothing has been saved yet.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<StoreSettings>> {
    Ok(Json(state.settings().load_or_default().await?))
}

/// `GET /api/settings/shipping`
#[instrument(skip(state))]
pub async fn shipping(State(state): State<AppState>) -> Result<Json<ShippingSettings>> {
    let settings = state.settings().load_or_default().await?;
    Ok(Json(settings.shipping))
}

/// `PATCH /api/settings`
///
/// Accepts camelCase or snake_case keys. Returns the stored document,
/// which on an older schema may carry default shipping values.
#[instrument(skip(state, settings))]
pub async fn update(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(settings): Json<StoreSettings>,
) -> Result<Json<StoreSettings>> {
    settings.validate()?;

    let stored = state.settings().save(&settings).await?;

    let base_fee = stored.shipping.shipping_base_fee.to_string();
    let price_per_km = stored.shipping.shipping_price_per_km.to_string();
    add_breadcrumb(
        "settings",
        "Store settings updated",
        Some(&[
            ("base_fee", base_fee.as_str()),
            ("price_per_km", price_per_km.as_str()),
        ]),
    );
    tracing::info!(
        dynamic_shipping = stored.shipping.enable_dynamic_shipping,
        base_fee = stored.shipping.shipping_base_fee,
        price_per_km = stored.shipping.shipping_price_per_km,
        "store settings updated"
    );

    Ok(Json(stored))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::json;
    use tienda_core::StoreSettings;

    use crate::geocoding::testing::FakeGeocoder;
    use crate::routes::test_support::{get, json_body, json_request, send};
    use crate::routing::testing::FakeDistance;
    use crate::state::testing::{ADMIN_TOKEN, state};
    use crate::state::AppState;

    fn app() -> AppState {
        state(
            StoreSettings::default(),
            FakeGeocoder::default(),
            FakeDistance::km(1.0),
        )
    }

    fn patch(body: &serde_json::Value, token: Option<&str>) -> Request<Body> {
        let mut request = json_request("PATCH", "/api/settings", body);
        if let Some(token) = token {
            request.headers_mut().insert(
                header::AUTHORIZATION,
                format!("Bearer {token}").parse().expect("header value"),
            );
        }
        request
    }

    fn shipping_payload() -> serde_json::Value {
        json!({
            "storeName": "Tienda Ñuñoa",
            "enableDynamicShipping": true,
            "shippingBaseFee": 3500,
            "shippingPricePerKm": 500,
            "shippingOriginLat": -33.45,
            "shippingOriginLng": -70.66
        })
    }

    #[tokio::test]
    async fn get_returns_camel_case_defaults() {
        let body = json_body(send(app(), get("/api/settings")).await).await;

        assert_eq!(body["enableDynamicShipping"], false);
        assert!(body.get("shippingBaseFee").is_some());
        assert!(body.get("shipping_base_fee").is_none());
    }

    #[tokio::test]
    async fn patch_without_token_is_unauthorized() {
        let response = send(app(), patch(&shipping_payload(), None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn patch_with_wrong_token_is_unauthorized() {
        let response = send(
            app(),
            patch(&shipping_payload(), Some("not-the-admin-token-at-all-000000")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn patch_persists_and_is_visible_to_readers() {
        let app = app();

        let response = send(app.clone(), patch(&shipping_payload(), Some(ADMIN_TOKEN))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let stored = json_body(response).await;
        assert_eq!(stored["storeName"], "Tienda Ñuñoa");
        assert!(stored["updatedAt"].is_string());

        let shipping = json_body(send(app, get("/api/settings/shipping")).await).await;
        assert_eq!(shipping["enableDynamicShipping"], true);
        assert_eq!(shipping["shippingBaseFee"], 3500.0);
        assert_eq!(shipping["shippingOriginLng"], -70.66);
    }

    #[tokio::test]
    async fn patch_accepts_snake_case_keys() {
        let app = app();
        let body = json!({
            "enable_dynamic_shipping": true,
            "shipping_base_fee": 1000,
            "shipping_price_per_km": 0
        });

        let response = send(app.clone(), patch(&body, Some(ADMIN_TOKEN))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let shipping = json_body(send(app, get("/api/settings/shipping")).await).await;
        assert_eq!(shipping["shippingBaseFee"], 1000.0);
        assert_eq!(shipping["shippingPricePerKm"], 0.0);
    }

    #[tokio::test]
    async fn patch_rejects_half_an_origin() {
        let body = json!({
            "shippingBaseFee": 3500,
            "shippingPricePerKm": 500,
            "shippingOriginLat": -33.45
        });

        let response = send(app(), patch(&body, Some(ADMIN_TOKEN))).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn patch_rejects_negative_rates() {
        let body = json!({ "shippingBaseFee": -1, "shippingPricePerKm": 500 });
        let response = send(app(), patch(&body, Some(ADMIN_TOKEN))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
