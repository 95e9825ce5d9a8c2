//! Shipping methods and the distance-based cost formula.
//!
//! A checkout offers a list of fixed-price couriers configured by the
//! store, plus at most one *dynamic* method priced from the road distance
//! between the warehouse and the customer's address:
//!
//! ```text
//! cost = round(base_fee + price_per_km * distance_km)
//! ```

use serde::{Deserialize, Serialize};

use crate::settings::ShippingSettings;

/// Identifier of the computed distance-based method.
pub const DYNAMIC_METHOD_ID: &str = "dynamic";

/// Compute the distance-based shipping cost in whole currency units.
///
/// Rounds half away from zero. A distance of zero yields `base_fee`.
/// Inputs are expected to be non-negative; negative distances are not
/// guarded against since routing providers never return them.
///
/// ```
/// use tienda_core::shipping_cost;
///
/// assert_eq!(shipping_cost(5.2, 3500.0, 500.0), 6100);
/// assert_eq!(shipping_cost(0.0, 1000.0, 750.0), 1000);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)] // store fees are far below i64::MAX
pub fn shipping_cost(distance_km: f64, base_fee: f64, price_per_km: f64) -> i64 {
    price_per_km.mul_add(distance_km, base_fee).round() as i64
}

/// A selectable shipping option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub id: String,
    pub name: String,
    /// Price in whole currency units.
    pub price: i64,
    /// Human readable delivery estimate ("1-2 días hábiles", "18 min").
    pub days: String,
}

impl ShippingMethod {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: i64,
        days: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            days: days.into(),
        }
    }

    /// Build the distance-priced method, labelled with the distance.
    #[must_use]
    pub fn dynamic(distance_km: f64, duration_text: &str, price: i64) -> Self {
        Self {
            id: DYNAMIC_METHOD_ID.to_owned(),
            name: format!("Envío a domicilio ({distance_km:.1} km)"),
            price,
            days: duration_text.to_owned(),
        }
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.id == DYNAMIC_METHOD_ID
    }
}

/// Fixed-price couriers offered when the store has not configured its own.
#[must_use]
pub fn default_static_methods() -> Vec<ShippingMethod> {
    vec![
        ShippingMethod::new("standard", "Envío estándar", 3990, "3-5 días hábiles"),
        ShippingMethod::new("express", "Envío express", 6990, "1-2 días hábiles"),
        ShippingMethod::new("pickup", "Retiro en tienda", 0, "Mismo día"),
    ]
}

/// Result of a road distance lookup.
///
/// Serialized as `{"success": true, "distanceKm": .., "durationText": ..}`
/// or `{"success": false, "error": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "DistanceOutcomeWire", try_from = "DistanceOutcomeWire")]
pub enum DistanceOutcome {
    Success {
        distance_km: f64,
        duration_text: String,
    },
    Failure {
        error: String,
    },
}

impl DistanceOutcome {
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DistanceOutcomeWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<DistanceOutcome> for DistanceOutcomeWire {
    fn from(outcome: DistanceOutcome) -> Self {
        match outcome {
            DistanceOutcome::Success {
                distance_km,
                duration_text,
            } => Self {
                success: true,
                distance_km: Some(distance_km),
                duration_text: Some(duration_text),
                error: None,
            },
            DistanceOutcome::Failure { error } => Self {
                success: false,
                distance_km: None,
                duration_text: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<DistanceOutcomeWire> for DistanceOutcome {
    type Error = String;

    fn try_from(wire: DistanceOutcomeWire) -> Result<Self, Self::Error> {
        if wire.success {
            let distance_km = wire
                .distance_km
                .ok_or_else(|| "successful outcome is missing distanceKm".to_owned())?;
            Ok(Self::Success {
                distance_km,
                duration_text: wire.duration_text.unwrap_or_default(),
            })
        } else {
            Ok(Self::Failure {
                error: wire.error.unwrap_or_else(|| "unknown error".to_owned()),
            })
        }
    }
}

/// Error returned when selecting a method that is not on offer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shipping method: {0}")]
pub struct UnknownShippingMethod(pub String);

/// The shipping methods offered to one checkout.
///
/// The dynamic method, when present, is listed first. It is rebuilt on
/// every address selection and cleared whenever a lookup fails, so a
/// price computed for an earlier address is never offered for a later one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodList {
    static_methods: Vec<ShippingMethod>,
    dynamic_method: Option<ShippingMethod>,
    selected_id: Option<String>,
}

impl ShippingMethodList {
    #[must_use]
    pub const fn new(static_methods: Vec<ShippingMethod>) -> Self {
        Self {
            static_methods,
            dynamic_method: None,
            selected_id: None,
        }
    }

    /// Dynamic method (if any) followed by the static methods.
    #[must_use]
    pub fn methods(&self) -> Vec<ShippingMethod> {
        self.dynamic_method
            .iter()
            .chain(self.static_methods.iter())
            .cloned()
            .collect()
    }

    #[must_use]
    pub const fn dynamic_method(&self) -> Option<&ShippingMethod> {
        self.dynamic_method.as_ref()
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&ShippingMethod> {
        let id = self.selected_id.as_deref()?;
        self.find(id)
    }

    fn find(&self, id: &str) -> Option<&ShippingMethod> {
        self.dynamic_method
            .iter()
            .chain(self.static_methods.iter())
            .find(|m| m.id == id)
    }

    /// Select a method by id.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownShippingMethod`] if no listed method has that id.
    pub fn select(&mut self, id: &str) -> Result<&ShippingMethod, UnknownShippingMethod> {
        if self.find(id).is_none() {
            return Err(UnknownShippingMethod(id.to_owned()));
        }
        self.selected_id = Some(id.to_owned());
        self.find(id).ok_or_else(|| UnknownShippingMethod(id.to_owned()))
    }

    /// Swap in the store's current fixed-price couriers.
    ///
    /// A selection that no longer exists is dropped.
    pub fn replace_static_methods(&mut self, static_methods: Vec<ShippingMethod>) {
        self.static_methods = static_methods;
        if let Some(id) = self.selected_id.as_deref()
            && self.find(id).is_none()
        {
            self.selected_id = None;
        }
    }

    /// Install a freshly computed dynamic method and auto-select it.
    pub fn set_dynamic(&mut self, method: ShippingMethod) {
        self.selected_id = Some(method.id.clone());
        self.dynamic_method = Some(method);
    }

    /// Remove the dynamic method. A selection pointing at it is dropped.
    pub fn clear_dynamic(&mut self) {
        self.dynamic_method = None;
        if self.selected_id.as_deref() == Some(DYNAMIC_METHOD_ID) {
            self.selected_id = None;
        }
    }

    /// Feed a distance lookup result through the cost formula.
    ///
    /// On success the computed method replaces any earlier one and is
    /// selected. On failure the earlier one is cleared.
    pub fn apply_outcome(&mut self, outcome: &DistanceOutcome, settings: &ShippingSettings) {
        match outcome {
            DistanceOutcome::Success {
                distance_km,
                duration_text,
            } => {
                let price = settings.cost_for(*distance_km);
                self.set_dynamic(ShippingMethod::dynamic(*distance_km, duration_text, price));
            }
            DistanceOutcome::Failure { .. } => self.clear_dynamic(),
        }
    }
}
