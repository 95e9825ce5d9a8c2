//! Checkout shipping pipeline.
//!
//! One address selection flows through three steps, strictly in order:
//!
//! 1. the [`AddressResolver`] turns it into coordinates (or not),
//! 2. the [`DistanceCalculator`] measures the road distance from the store
//!    origin, when dynamic shipping is on and both ends are known,
//! 3. the cost formula prices the dynamic method, which is then injected
//!    into the checkout's method list and auto-selected.
//!
//! Any failure along the way only removes the dynamic method. The static
//! couriers stay available and checkout carries on.

use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tracing::instrument;

use tienda_core::{
    AddressResult, CheckoutToken, Coordinates, DistanceOutcome, ShippingInfo, ShippingMethod,
    ShippingMethodList, ShippingSettings,
};

use crate::geocoding::{AddressResolver, AddressSelection, Resolution};
use crate::routing::DistanceCalculator;

/// How long an idle checkout keeps its shipping state.
const CHECKOUT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Upper bound on concurrently tracked checkouts.
const CHECKOUT_CAPACITY: u64 = 10_000;

/// Failure text sent to the browser. Provider detail stays in the logs.
pub const DISTANCE_UNAVAILABLE: &str = "distance unavailable";

/// Shipping state of one checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutShipping {
    pub info: ShippingInfo,
    pub methods: ShippingMethodList,
}

impl CheckoutShipping {
    #[must_use]
    pub fn new(settings: &ShippingSettings) -> Self {
        Self {
            info: ShippingInfo::default(),
            methods: ShippingMethodList::new(settings.static_methods.clone()),
        }
    }

    /// Write a resolution into the form, keeping the contact fields.
    ///
    /// An unresolved address replaces the structured fields with the raw
    /// text and drops any earlier coordinates.
    pub fn apply_resolution(&mut self, resolution: &Resolution) {
        let info = std::mem::take(&mut self.info);
        self.info = match resolution {
            Resolution::Resolved(address) => info.with_address(address),
            Resolution::Unresolved(raw) => ShippingInfo {
                full_name: info.full_name,
                phone: info.phone,
                address: raw.clone(),
                ..ShippingInfo::default()
            },
        };
    }
}

/// Result of running a selection through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuote {
    pub resolved: bool,
    pub address: Option<AddressResult>,
    pub shipping: ShippingInfo,
    pub methods: Vec<ShippingMethod>,
    pub selected_id: Option<String>,
    /// Absent when no lookup was attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<DistanceOutcome>,
}

impl ShippingQuote {
    fn new(
        resolution: Resolution,
        checkout: &CheckoutShipping,
        distance: Option<DistanceOutcome>,
    ) -> Self {
        Self {
            resolved: resolution.is_resolved(),
            address: match resolution {
                Resolution::Resolved(address) => Some(address),
                Resolution::Unresolved(_) => None,
            },
            shipping: checkout.info.clone(),
            methods: checkout.methods.methods(),
            selected_id: checkout.methods.selected_id().map(str::to_owned),
            distance: distance.map(|outcome| match outcome {
                DistanceOutcome::Failure { .. } => DistanceOutcome::failure(DISTANCE_UNAVAILABLE),
                success @ DistanceOutcome::Success { .. } => success,
            }),
        }
    }
}

/// Address resolution, distance lookup and cost formula, wired together.
#[derive(Clone)]
pub struct ShippingPipeline {
    resolver: AddressResolver,
    distance: DistanceCalculator,
}

impl ShippingPipeline {
    #[must_use]
    pub const fn new(resolver: AddressResolver, distance: DistanceCalculator) -> Self {
        Self { resolver, distance }
    }

    #[must_use]
    pub const fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// Run a new address selection against a checkout's shipping state.
    #[instrument(skip(self, settings, checkout))]
    pub async fn quote(
        &self,
        settings: &ShippingSettings,
        selection: &AddressSelection,
        checkout: &mut CheckoutShipping,
    ) -> ShippingQuote {
        let resolution = self.resolver.resolve(selection).await;
        checkout.apply_resolution(&resolution);
        checkout
            .methods
            .replace_static_methods(settings.static_methods.clone());

        let distance = self
            .update_methods(settings, checkout.info.coordinates(), &mut checkout.methods)
            .await;

        ShippingQuote::new(resolution, checkout, distance)
    }

    /// Recompute the dynamic method for `destination`.
    ///
    /// Returns the lookup outcome, or `None` when no lookup was attempted
    /// because the flag is off or a coordinate is missing.
    pub async fn update_methods(
        &self,
        settings: &ShippingSettings,
        destination: Option<Coordinates>,
        methods: &mut ShippingMethodList,
    ) -> Option<DistanceOutcome> {
        if !settings.enable_dynamic_shipping {
            methods.clear_dynamic();
            return None;
        }

        let (Some(origin), Some(destination)) = (settings.origin(), destination) else {
            tracing::debug!(
                has_origin = settings.origin().is_some(),
                has_destination = destination.is_some(),
                "skipping dynamic shipping: missing coordinates"
            );
            methods.clear_dynamic();
            return None;
        };

        let outcome = self.distance.distance(origin, destination).await;
        methods.apply_outcome(&outcome, settings);
        if let Some(method) = methods.dynamic_method() {
            tracing::info!(price = method.price, name = %method.name, "dynamic shipping quoted");
        }
        Some(outcome)
    }
}

/// In-memory shipping state per checkout, expiring after two idle hours.
///
/// Writes for the same checkout are not sequenced: the last one wins.
#[derive(Clone)]
pub struct CheckoutShippingStore {
    cache: Cache<CheckoutToken, CheckoutShipping>,
}

impl Default for CheckoutShippingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutShippingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(CHECKOUT_TTL)
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CHECKOUT_CAPACITY)
            .time_to_idle(ttl)
            .build();
        Self { cache }
    }

    pub async fn get(&self, token: &CheckoutToken) -> Option<CheckoutShipping> {
        self.cache.get(token).await
    }

    /// Existing state, or a fresh one built from `settings`.
    pub async fn get_or_new(
        &self,
        token: &CheckoutToken,
        settings: &ShippingSettings,
    ) -> CheckoutShipping {
        match self.cache.get(token).await {
            Some(checkout) => checkout,
            None => CheckoutShipping::new(settings),
        }
    }

    pub async fn put(&self, token: CheckoutToken, checkout: CheckoutShipping) {
        self.cache.insert(token, checkout).await;
    }
}
