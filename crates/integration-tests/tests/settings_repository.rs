//! Repository tests against a scratch `PostgreSQL` database.
//!
//! The test drops and recreates the `storefront` schema in
//! `TEST_DATABASE_URL`. Never point it at a real database.
//!
//! Both schema versions are exercised in one test: tests in a binary run
//! in parallel and would otherwise drop each other's schema.
//!
//! Run with: cargo test -p tienda-integration-tests -- --ignored

use sqlx::PgPool;
use tienda_core::StoreSettings;
use tienda_integration_tests::test_database_url;
use tienda_storefront::db::SettingsRepository;

const CREATE_SETTINGS: &str =
    include_str!("../../storefront/migrations/20260301000001_create_store_settings.sql");
const ADD_SHIPPING: &str =
    include_str!("../../storefront/migrations/20260301000002_add_shipping_settings.sql");

async fn fresh_pool() -> PgPool {
    let url = test_database_url().expect("TEST_DATABASE_URL must be set");
    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to test database");
    sqlx::raw_sql("DROP SCHEMA IF EXISTS storefront CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to drop schema");
    pool
}

fn shipping_settings() -> StoreSettings {
    let mut settings = StoreSettings::default();
    settings.shipping.enable_dynamic_shipping = true;
    settings.shipping.shipping_base_fee = 3500.0;
    settings.shipping.shipping_price_per_km = 500.0;
    settings.shipping.shipping_origin_lat = Some(-33.45);
    settings.shipping.shipping_origin_lng = Some(-70.66);
    settings
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_upsert_across_shipping_schema_upgrade() {
    let pool = fresh_pool().await;
    sqlx::raw_sql(CREATE_SETTINGS)
        .execute(&pool)
        .await
        .expect("Failed to create base table");
    let repo = SettingsRepository::new(&pool);

    // Base schema only: shipping columns do not exist yet.
    let stored = repo
        .upsert(&shipping_settings())
        .await
        .expect("Fallback upsert should succeed");

    assert!(!stored.shipping.enable_dynamic_shipping);
    assert_eq!(stored.store_name, "Tienda");

    let loaded = repo.get().await.expect("Failed to read settings");
    assert!(loaded.is_some_and(|s| !s.shipping.enable_dynamic_shipping));

    sqlx::raw_sql(ADD_SHIPPING)
        .execute(&pool)
        .await
        .expect("Failed to add shipping columns");

    repo.upsert(&shipping_settings())
        .await
        .expect("Upsert should succeed");
    let loaded = repo
        .get()
        .await
        .expect("Failed to read settings")
        .expect("Settings row should exist");

    assert!(loaded.shipping.dynamic_enabled());
    assert_eq!(loaded.shipping.cost_for(5.2), 6100);
    assert!(loaded.updated_at.is_some());
}
