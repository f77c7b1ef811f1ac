//! Fuel insight request and response shapes.

use serde::{Deserialize, Serialize};

use super::Trip;

/// Per-trip figures sent to the insight backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub distance_km: f64,
    pub idle_minutes: f64,
    pub average_speed_kmh: f64,
}

impl From<&Trip> for TripSummary {
    fn from(trip: &Trip) -> Self {
        Self {
            distance_km: trip.distance,
            idle_minutes: trip.idle_time / 60.0,
            average_speed_kmh: trip.average_speed_kmh(),
        }
    }
}

/// Everything the backend needs to estimate consumption.
///
/// Construct through [`crate::insights::request_for`], which validates the inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelInsightsRequest {
    pub trips: Vec<TripSummary>,
    pub fuel_efficiency_km_per_liter: f64,
}

/// The backend's answer.
///
/// Field names on the wire follow the output schema the model is asked to fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelInsights {
    #[serde(rename = "estimatedFuelConsumption")]
    pub estimated_fuel_consumption_liters: f64,

    #[serde(rename = "drivingStyleInsights")]
    pub driving_style_insights: String,
}
