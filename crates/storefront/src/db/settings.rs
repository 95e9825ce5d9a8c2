//! Store settings persistence.
//!
//! The settings singleton lives in `storefront.store_settings`. Shipping
//! columns were added after the table was first deployed, so reads and
//! writes fall back to the base columns when Postgres reports an undefined
//! column (SQLSTATE `42703`) instead of failing the whole request.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tokio::sync::RwLock;
use tracing::instrument;

use tienda_core::{
    CurrencyCode, PaymentSettings, SettingsId, ShippingMethod, ShippingSettings, StoreSettings,
};

use super::RepositoryError;

/// SQLSTATE for `undefined_column`.
const UNDEFINED_COLUMN: &str = "42703";

/// Storage seam for the settings singleton.
///
/// Handlers depend on this trait so they can run against the in-memory
/// store in tests.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the stored settings, `None` if the row was never written.
    async fn load(&self) -> Result<Option<StoreSettings>, RepositoryError>;

    /// Persist a full settings payload and return what was stored.
    async fn save(&self, settings: &StoreSettings) -> Result<StoreSettings, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Load the stored settings or the defaults.
    async fn load_or_default(&self) -> Result<StoreSettings, RepositoryError> {
        Ok(self.load().await?.unwrap_or_default())
    }
}

/// Full settings row (base + shipping columns).
#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    store_name: String,
    currency: String,
    enable_transfer: bool,
    enable_card: bool,
    enable_cash_on_delivery: bool,
    updated_at: DateTime<Utc>,
    enable_dynamic_shipping: bool,
    shipping_base_fee: f64,
    shipping_price_per_km: f64,
    shipping_origin_lat: Option<f64>,
    shipping_origin_lng: Option<f64>,
    shipping_methods: Option<Json<Vec<ShippingMethod>>>,
}

/// Settings row from a schema that predates the shipping columns.
#[derive(Debug, sqlx::FromRow)]
struct BaseSettingsRow {
    store_name: String,
    currency: String,
    enable_transfer: bool,
    enable_card: bool,
    enable_cash_on_delivery: bool,
    updated_at: DateTime<Utc>,
}

impl BaseSettingsRow {
    fn into_settings(self, shipping: ShippingSettings) -> Result<StoreSettings, RepositoryError> {
        let currency = CurrencyCode::from_code(&self.currency).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "unknown currency in settings: {}",
                self.currency
            ))
        })?;

        Ok(StoreSettings {
            store_name: self.store_name,
            currency,
            shipping,
            payments: PaymentSettings {
                enable_transfer: self.enable_transfer,
                enable_card: self.enable_card,
                enable_cash_on_delivery: self.enable_cash_on_delivery,
            },
            updated_at: Some(self.updated_at),
        })
    }
}

impl SettingsRow {
    fn into_settings(self) -> Result<StoreSettings, RepositoryError> {
        let shipping = ShippingSettings {
            enable_dynamic_shipping: self.enable_dynamic_shipping,
            shipping_base_fee: self.shipping_base_fee,
            shipping_price_per_km: self.shipping_price_per_km,
            shipping_origin_lat: self.shipping_origin_lat,
            shipping_origin_lng: self.shipping_origin_lng,
            static_methods: self
                .shipping_methods
                .map_or_else(tienda_core::default_static_methods, |Json(m)| m),
        };

        BaseSettingsRow {
            store_name: self.store_name,
            currency: self.currency,
            enable_transfer: self.enable_transfer,
            enable_card: self.enable_card,
            enable_cash_on_delivery: self.enable_cash_on_delivery,
            updated_at: self.updated_at,
        }
        .into_settings(shipping)
    }
}

fn is_undefined_column(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNDEFINED_COLUMN))
}

/// Repository for the settings singleton.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the settings row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored currency is unknown.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Option<StoreSettings>, RepositoryError> {
        let result = sqlx::query_as::<_, SettingsRow>(
            r"
            SELECT store_name, currency, enable_transfer, enable_card,
                   enable_cash_on_delivery, updated_at,
                   enable_dynamic_shipping, shipping_base_fee, shipping_price_per_km,
                   shipping_origin_lat, shipping_origin_lng, shipping_methods
            FROM storefront.store_settings
            WHERE id = $1
            ",
        )
        .bind(SettingsId::SINGLETON)
        .fetch_optional(self.pool)
        .await;

        match result {
            Ok(row) => row.map(SettingsRow::into_settings).transpose(),
            Err(e) if is_undefined_column(&e) => {
                tracing::warn!(
                    error = %e,
                    "settings table is missing shipping columns, reading base columns only"
                );
                self.get_base().await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_base(&self) -> Result<Option<StoreSettings>, RepositoryError> {
        let row = sqlx::query_as::<_, BaseSettingsRow>(
            r"
            SELECT store_name, currency, enable_transfer, enable_card,
                   enable_cash_on_delivery, updated_at
            FROM storefront.store_settings
            WHERE id = $1
            ",
        )
        .bind(SettingsId::SINGLETON)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| r.into_settings(ShippingSettings::default()))
            .transpose()
    }

    /// Insert or replace the settings row.
    ///
    /// If the shipping columns do not exist yet, only the base columns are
    /// written and the returned settings carry default shipping values.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    #[instrument(skip(self, settings))]
    pub async fn upsert(&self, settings: &StoreSettings) -> Result<StoreSettings, RepositoryError> {
        let shipping = &settings.shipping;
        let result = sqlx::query_scalar::<_, DateTime<Utc>>(
            r"
            INSERT INTO storefront.store_settings (
                id, store_name, currency, enable_transfer, enable_card,
                enable_cash_on_delivery, enable_dynamic_shipping, shipping_base_fee,
                shipping_price_per_km, shipping_origin_lat, shipping_origin_lng,
                shipping_methods, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            ON CONFLICT (id) DO UPDATE SET
                store_name = EXCLUDED.store_name,
                currency = EXCLUDED.currency,
                enable_transfer = EXCLUDED.enable_transfer,
                enable_card = EXCLUDED.enable_card,
                enable_cash_on_delivery = EXCLUDED.enable_cash_on_delivery,
                enable_dynamic_shipping = EXCLUDED.enable_dynamic_shipping,
                shipping_base_fee = EXCLUDED.shipping_base_fee,
                shipping_price_per_km = EXCLUDED.shipping_price_per_km,
                shipping_origin_lat = EXCLUDED.shipping_origin_lat,
                shipping_origin_lng = EXCLUDED.shipping_origin_lng,
                shipping_methods = EXCLUDED.shipping_methods,
                updated_at = NOW()
            RETURNING updated_at
            ",
        )
        .bind(SettingsId::SINGLETON)
        .bind(&settings.store_name)
        .bind(settings.currency.code())
        .bind(settings.payments.enable_transfer)
        .bind(settings.payments.enable_card)
        .bind(settings.payments.enable_cash_on_delivery)
        .bind(shipping.enable_dynamic_shipping)
        .bind(shipping.shipping_base_fee)
        .bind(shipping.shipping_price_per_km)
        .bind(shipping.shipping_origin_lat)
        .bind(shipping.shipping_origin_lng)
        .bind(Json(&shipping.static_methods))
        .fetch_one(self.pool)
        .await;

        match result {
            Ok(updated_at) => Ok(StoreSettings {
                updated_at: Some(updated_at),
                ..settings.clone()
            }),
            Err(e) if is_undefined_column(&e) => {
                tracing::warn!(
                    error = %e,
                    "settings table is missing shipping columns; shipping settings were not saved"
                );
                self.upsert_base(settings).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_base(&self, settings: &StoreSettings) -> Result<StoreSettings, RepositoryError> {
        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r"
            INSERT INTO storefront.store_settings (
                id, store_name, currency, enable_transfer, enable_card,
                enable_cash_on_delivery, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (id) DO UPDATE SET
                store_name = EXCLUDED.store_name,
                currency = EXCLUDED.currency,
                enable_transfer = EXCLUDED.enable_transfer,
                enable_card = EXCLUDED.enable_card,
                enable_cash_on_delivery = EXCLUDED.enable_cash_on_delivery,
                updated_at = NOW()
            RETURNING updated_at
            ",
        )
        .bind(SettingsId::SINGLETON)
        .bind(&settings.store_name)
        .bind(settings.currency.code())
        .bind(settings.payments.enable_transfer)
        .bind(settings.payments.enable_card)
        .bind(settings.payments.enable_cash_on_delivery)
        .fetch_one(self.pool)
        .await?;

        Ok(StoreSettings {
            shipping: ShippingSettings::default(),
            updated_at: Some(updated_at),
            ..settings.clone()
        })
    }
}

/// `PostgreSQL`-backed [`SettingsStore`].
#[derive(Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn load(&self) -> Result<Option<StoreSettings>, RepositoryError> {
        SettingsRepository::new(&self.pool).get().await
    }

    async fn save(&self, settings: &StoreSettings) -> Result<StoreSettings, RepositoryError> {
        SettingsRepository::new(&self.pool).upsert(settings).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

/// In-process [`SettingsStore`], used by tests and local runs without a database.
#[derive(Clone, Default)]
pub struct MemorySettingsStore {
    settings: Arc<RwLock<Option<StoreSettings>>>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn with_settings(settings: StoreSettings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(Some(settings))),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<StoreSettings>, RepositoryError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save(&self, settings: &StoreSettings) -> Result<StoreSettings, RepositoryError> {
        let stored = StoreSettings {
            updated_at: Some(Utc::now()),
            ..settings.clone()
        };
        *self.settings.write().await = Some(stored.clone());
        Ok(stored)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_starts_empty_and_defaults() {
        let store = MemorySettingsStore::default();
        assert!(store.load().await.unwrap_or_default().is_none());

        let settings = store.load_or_default().await.unwrap_or_default();
        assert_eq!(settings.store_name, "Tienda");
    }

    #[tokio::test]
    async fn memory_store_stamps_updated_at() {
        let store = MemorySettingsStore::default();
        let mut settings = StoreSettings::default();
        settings.shipping.shipping_base_fee = 2500.0;

        let saved = store.save(&settings).await.unwrap_or_default();
        assert!(saved.updated_at.is_some());

        let loaded = store.load().await.ok().flatten().unwrap_or_default();
        assert!((loaded.shipping.shipping_base_fee - 2500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn base_row_rejects_unknown_currency() {
        let row = BaseSettingsRow {
            store_name: "Tienda".to_owned(),
            currency: "XXX".to_owned(),
            enable_transfer: true,
            enable_card: false,
            enable_cash_on_delivery: false,
            updated_at: Utc::now(),
        };
        assert!(matches!(
            row.into_settings(ShippingSettings::default()),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn full_row_without_methods_uses_default_couriers() {
        let row = SettingsRow {
            store_name: "Tienda".to_owned(),
            currency: "CLP".to_owned(),
            enable_transfer: true,
            enable_card: true,
            enable_cash_on_delivery: false,
            updated_at: Utc::now(),
            enable_dynamic_shipping: true,
            shipping_base_fee: 3500.0,
            shipping_price_per_km: 500.0,
            shipping_origin_lat: Some(-33.45),
            shipping_origin_lng: Some(-70.66),
            shipping_methods: None,
        };
        let settings = row
            .into_settings()
            .unwrap_or_else(|_| StoreSettings::default());
        assert!(settings.shipping.dynamic_enabled());
        assert_eq!(
            settings.shipping.static_methods,
            tienda_core::default_static_methods()
        );
        assert!(settings.payments.enable_card);
    }
}
