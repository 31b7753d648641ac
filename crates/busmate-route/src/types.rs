//! Typed records for the directions provider's route schema.
//!
//! Only the fields the analyzer and the display layer read are modelled.
//! Everything else in the provider payload is ignored during decoding.

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// Line label used when the provider omits a short name.
pub const FALLBACK_LINE_LABEL: &str = "Bus";

// =============================================================================
// Scalars
// =============================================================================

/// A provider quantity with its machine value and human text,
/// e.g. `{"text": "12 phút", "value": 720}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    #[serde(default)]
    pub text: String,
    pub value: u64,
}

/// A provider timestamp: epoch seconds plus a local display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    #[serde(default)]
    pub text: String,
    pub value: i64,
}

/// How a step is travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    Walking,
    Transit,
    /// Any other provider mode (driving, bicycling, ...). Not counted.
    #[serde(other)]
    Other,
}

// =============================================================================
// Transit details
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TransitLine {
    /// The identifier shown to riders, falling back to [`FALLBACK_LINE_LABEL`].
    pub fn label(&self) -> &str {
        self.short_name.as_deref().unwrap_or(FALLBACK_LINE_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitStop {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitDetails {
    pub line: TransitLine,
    pub departure_time: TimePoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_stop: Option<TransitStop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_stop: Option<TransitStop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_stops: Option<u32>,
}

// =============================================================================
// Step / Leg / Route
// =============================================================================

/// An atomic segment of travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub travel_mode: TravelMode,
    pub distance: Measure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_details: Option<TransitDetails>,
}

impl Step {
    pub fn is_walking(&self) -> bool {
        self.travel_mode == TravelMode::Walking
    }

    pub fn is_transit(&self) -> bool {
        self.travel_mode == TravelMode::Transit
    }
}

/// One continuous portion of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub duration: Measure,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_address: Option<String>,
}

impl Leg {
    /// Every TRANSIT step must carry its transit details.
    fn validate(&self) -> Result<(), String> {
        match self
            .steps
            .iter()
            .position(|s| s.is_transit() && s.transit_details.is_none())
        {
            Some(pos) => Err(format!("transit step {} has no transit_details", pos)),
            None => Ok(()),
        }
    }
}

/// One alternative path returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRoute {
    pub legs: Vec<Leg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl RawRoute {
    /// Decode the `index`-th route of a provider response.
    pub fn from_value(index: usize, value: &serde_json::Value) -> Result<Self, RouteError> {
        RawRoute::deserialize(value).map_err(|e| RouteError::malformed(index, e.to_string()))
    }

    /// Consume the route, returning its validated primary leg.
    ///
    /// Only the first leg is summarized; later legs are dropped.
    pub fn into_primary_leg(self, index: usize) -> Result<Leg, RouteError> {
        let leg = self
            .legs
            .into_iter()
            .next()
            .ok_or_else(|| RouteError::malformed(index, "route has no legs"))?;
        leg.validate()
            .map_err(|reason| RouteError::malformed(index, reason))?;
        Ok(leg)
    }
}

/// Decode and validate one provider route down to its primary leg.
pub fn ingest_route(index: usize, value: &serde_json::Value) -> Result<Leg, RouteError> {
    RawRoute::from_value(index, value)?.into_primary_leg(index)
}
