//! Offline shipping quotes.
//!
//! Prices a distance with the stored rates, or with rates given on the
//! command line. When both rates are given the database is not touched.
//!
//! ```bash
//! tienda-cli quote --distance-km 5.2 --base-fee 3500 --price-per-km 500
//! ```

use tienda_core::{CurrencyCode, Price, ShippingMethod, shipping_cost};
use tienda_storefront::db::SettingsRepository;

use super::{CommandError, connect};

pub async fn run(
    distance_km: f64,
    base_fee: Option<f64>,
    price_per_km: Option<f64>,
) -> Result<(), CommandError> {
    let (base_fee, price_per_km, currency) = match (base_fee, price_per_km) {
        (Some(base_fee), Some(price_per_km)) => (base_fee, price_per_km, CurrencyCode::default()),
        (base_fee, price_per_km) => {
            let pool = connect().await?;
            let stored = SettingsRepository::new(&pool)
                .get()
                .await?
                .unwrap_or_default();
            (
                base_fee.unwrap_or(stored.shipping.shipping_base_fee),
                price_per_km.unwrap_or(stored.shipping.shipping_price_per_km),
                stored.currency,
            )
        }
    };

    let cost = shipping_cost(distance_km, base_fee, price_per_km);
    let method = ShippingMethod::dynamic(distance_km, "", cost);

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{}: {} (base {base_fee} + {price_per_km}/km)",
            method.name,
            Price::from_whole_units(cost, currency).display()
        );
    }
    Ok(())
}
