//! Core data model for tripid.
//!
//! Trips and their points are what gets persisted; notices and insight
//! requests are what flows between the tracker and the outside world.

mod insights;
mod notice;
mod trip;

pub use insights::{FuelInsights, FuelInsightsRequest, TripSummary};
pub use notice::Notice;
pub use trip::{Trip, TripId, TripPoint};
