//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::SettingsStore;
use crate::services::{CheckoutShippingStore, ShippingPipeline};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the settings store and provider clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    settings: Arc<dyn SettingsStore>,
    pipeline: ShippingPipeline,
    checkouts: CheckoutShippingStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `settings` - Store settings persistence
    /// * `pipeline` - Address resolution and distance pricing
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        settings: Arc<dyn SettingsStore>,
        pipeline: ShippingPipeline,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                settings,
                pipeline,
                checkouts: CheckoutShippingStore::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the store settings repository.
    #[must_use]
    pub fn settings(&self) -> &dyn SettingsStore {
        self.inner.settings.as_ref()
    }

    /// Get the checkout shipping pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &ShippingPipeline {
        &self.inner.pipeline
    }

    /// Get the per-checkout shipping state.
    #[must_use]
    pub fn checkouts(&self) -> &CheckoutShippingStore {
        &self.inner.checkouts
    }
}
