//! Fuel insights: estimated consumption and driving-style feedback.
//!
//! The trip history is reduced to per-trip summaries, validated, and handed
//! to an [`InsightsClient`]. The shipped client asks a hosted language model
//! (see [`gemini`]) to fill a fixed JSON shape.

mod gemini;

use std::fmt::Write as _;

use crate::model::{FuelInsights, FuelInsightsRequest, Trip, TripSummary};

pub use gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiClient};

/// Upper bound accepted for fuel efficiency, in km per liter.
pub const MAX_FUEL_EFFICIENCY: f64 = 100.0;

/// Efficiency assumed when none is configured.
pub const DEFAULT_FUEL_EFFICIENCY: f64 = 12.0;

#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error("You need at least one completed trip to get fuel insights")]
    NoTrips,

    #[error("fuel efficiency must be above 0 and at most 100 km/L, got {0}")]
    InvalidFuelEfficiency(f64),

    #[error("no API key: set the {0} environment variable")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, InsightsError>;

/// Something that can turn a request into insights.
pub trait InsightsClient {
    fn fuel_insights(&self, request: &FuelInsightsRequest) -> Result<FuelInsights>;
}

/// Builds a validated request from finished trips.
pub fn request_for(trips: &[Trip], fuel_efficiency_km_per_liter: f64) -> Result<FuelInsightsRequest> {
    if trips.is_empty() {
        return Err(InsightsError::NoTrips);
    }
    let efficiency = fuel_efficiency_km_per_liter;
    if !(efficiency > 0.0 && efficiency <= MAX_FUEL_EFFICIENCY) {
        return Err(InsightsError::InvalidFuelEfficiency(efficiency));
    }
    Ok(FuelInsightsRequest {
        trips: trips.iter().map(TripSummary::from).collect(),
        fuel_efficiency_km_per_liter: efficiency,
    })
}

/// The analyst prompt for a request.
pub fn render_prompt(request: &FuelInsightsRequest) -> String {
    let mut prompt = String::from(
        "You are an expert in analyzing car trip data and providing fuel consumption insights.\n\n\
         Analyze the following trip history and estimate the total fuel consumption.\n\
         Also, provide insights into the user's driving style and its impact on fuel consumption, \
         considering factors like idle time and average speed.",
    );
    let _ = write!(
        prompt,
        " The fuel efficiency of the car is {} kilometers per liter.\n\nTrip History:\n",
        request.fuel_efficiency_km_per_liter
    );
    for trip in &request.trips {
        let _ = writeln!(
            prompt,
            "- Distance: {} km, Idle Time: {} minutes, Average Speed: {} km/h",
            trip.distance_km, trip.idle_minutes, trip.average_speed_kmh
        );
    }
    prompt.push_str(
        "\nBased on this data, provide the estimated total fuel consumption in liters \
         and driving style insights.\n\
         Ensure the output is concise and easy to understand.\n",
    );
    prompt
}
