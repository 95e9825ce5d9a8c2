//! Store settings management.
//!
//! # Usage
//!
//! ```bash
//! tienda-cli settings show
//! tienda-cli settings set-origin --lat -33.45 --lng -70.66
//! tienda-cli settings set-rates --base-fee 3500 --price-per-km 500 --enable
//! ```

use tienda_core::StoreSettings;
use tienda_storefront::db::SettingsRepository;

use super::{CommandError, connect};

/// Print the stored settings (or the defaults) as JSON.
pub async fn show() -> Result<(), CommandError> {
    let pool = connect().await?;
    let settings = SettingsRepository::new(&pool)
        .get()
        .await?
        .unwrap_or_default();

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    }
    Ok(())
}

/// Set the warehouse coordinates used as the routing origin.
pub async fn set_origin(lat: f64, lng: f64) -> Result<(), CommandError> {
    update(|settings| with_origin(settings, lat, lng)).await
}

/// Set the dynamic shipping rates, optionally toggling the feature.
pub async fn set_rates(
    base_fee: f64,
    price_per_km: f64,
    enabled: Option<bool>,
) -> Result<(), CommandError> {
    update(|settings| with_rates(settings, base_fee, price_per_km, enabled)).await
}

async fn update(
    change: impl FnOnce(StoreSettings) -> StoreSettings,
) -> Result<(), CommandError> {
    let pool = connect().await?;
    let repo = SettingsRepository::new(&pool);

    let settings = change(repo.get().await?.unwrap_or_default());
    settings.validate()?;
    let stored = repo.upsert(&settings).await?;

    tracing::info!(
        dynamic_shipping = stored.shipping.enable_dynamic_shipping,
        base_fee = stored.shipping.shipping_base_fee,
        price_per_km = stored.shipping.shipping_price_per_km,
        origin = ?stored.shipping.origin(),
        "Settings saved"
    );
    Ok(())
}

fn with_origin(mut settings: StoreSettings, lat: f64, lng: f64) -> StoreSettings {
    settings.shipping.shipping_origin_lat = Some(lat);
    settings.shipping.shipping_origin_lng = Some(lng);
    settings
}

fn with_rates(
    mut settings: StoreSettings,
    base_fee: f64,
    price_per_km: f64,
    enabled: Option<bool>,
) -> StoreSettings {
    settings.shipping.shipping_base_fee = base_fee;
    settings.shipping.shipping_price_per_km = price_per_km;
    if let Some(enabled) = enabled {
        settings.shipping.enable_dynamic_shipping = enabled;
    }
    settings
}

#[cfg(test)]
mod tests {
    use tienda_core::Coordinates;

    use super::*;

    #[test]
    fn origin_sets_both_coordinates() {
        let settings = with_origin(StoreSettings::default(), -33.45, -70.66);
        assert_eq!(
            settings.shipping.origin(),
            Some(Coordinates::new(-33.45, -70.66))
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rates_keep_the_flag_unless_told() {
        let mut current = StoreSettings::default();
        current.shipping.enable_dynamic_shipping = true;

        let kept = with_rates(current.clone(), 3500.0, 500.0, None);
        assert!(kept.shipping.enable_dynamic_shipping);
        assert_eq!(kept.shipping.cost_for(5.2), 6100);

        let disabled = with_rates(current, 3500.0, 500.0, Some(false));
        assert!(!disabled.shipping.enable_dynamic_shipping);
    }

    #[test]
    fn negative_rates_fail_validation() {
        let settings = with_rates(StoreSettings::default(), -10.0, 500.0, None);
        assert!(settings.validate().is_err());
    }
}
