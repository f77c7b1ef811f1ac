//! Trip types: the unit of recording in tripid.

use std::fmt;

use jiff::{Timestamp, tz::TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a trip, derived from its start time.
///
/// Rendered as an ISO-8601 UTC timestamp with millisecond precision, the
/// same shape the web app used, so existing histories keep their ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(String);

impl TripId {
    pub fn from_start(start: Timestamp) -> Self {
        let utc = start.to_zoned(TimeZone::UTC);
        Self(format!(
            "{}.{:03}Z",
            utc.strftime("%Y-%m-%dT%H:%M:%S"),
            utc.millisecond()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TripId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One observed position sample within a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPoint {
    pub lat: f64,
    pub lng: f64,

    /// Speed in km/h, zero when the source reported none.
    #[serde(default, deserialize_with = "speed_or_zero")]
    pub speed: f64,

    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
}

/// Older histories may hold `null` speeds; they read as standing still.
fn speed_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// One recorded journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: TripId,

    /// Epoch milliseconds.
    pub start_time: i64,

    /// Epoch milliseconds. `None` while the trip is being recorded.
    pub end_time: Option<i64>,

    /// Samples in arrival order.
    pub points: Vec<TripPoint>,

    /// Cumulative distance in kilometers.
    pub distance: f64,

    /// Cumulative seconds spent at or below the idle speed threshold.
    pub idle_time: f64,

    pub name: String,
}

impl Trip {
    /// A fresh, empty trip starting at `start`, named in the given time zone.
    pub fn begin(start: Timestamp, tz: &TimeZone) -> Self {
        let local = start.to_zoned(tz.clone());
        Self {
            id: TripId::from_start(start),
            start_time: start.as_millisecond(),
            end_time: None,
            points: Vec::new(),
            distance: 0.0,
            idle_time: 0.0,
            name: format!("Trip - {}", local.strftime("%b %-d, %Y %-I:%M %p")),
        }
    }

    /// Wall-clock duration in milliseconds; zero while the trip is open.
    pub fn duration_ms(&self) -> i64 {
        self.end_time
            .map_or(0, |end| end.saturating_sub(self.start_time).max(0))
    }

    /// Mean of the recorded point speeds in km/h, zero without points.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_speed_kmh(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let total: f64 = self.points.iter().map(|p| p.speed).sum();
        total / self.points.len() as f64
    }

    /// Most recent point, if any.
    pub fn last_point(&self) -> Option<&TripPoint> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> Timestamp {
        // 2024-03-09T14:05:07.250Z
        Timestamp::from_millisecond(1_709_993_107_250).unwrap()
    }

    #[test]
    fn id_is_iso_timestamp_with_millis() {
        let id = TripId::from_start(start());
        assert_eq!(id.as_str(), "2024-03-09T14:05:07.250Z");
    }

    #[test]
    fn begin_creates_empty_open_trip() {
        let trip = Trip::begin(start(), &TimeZone::UTC);

        assert_eq!(trip.start_time, 1_709_993_107_250);
        assert!(trip.end_time.is_none());
        assert!(trip.points.is_empty());
        assert!(trip.distance.abs() < f64::EPSILON);
        assert!(trip.idle_time.abs() < f64::EPSILON);
        assert_eq!(trip.name, "Trip - Mar 9, 2024 2:05 PM");
    }

    #[test]
    fn name_uses_time_zone() {
        let tz = TimeZone::fixed(jiff::tz::offset(-5));
        let trip = Trip::begin(start(), &tz);
        assert_eq!(trip.name, "Trip - Mar 9, 2024 9:05 AM");
    }

    #[test]
    fn average_speed_is_mean_of_points() {
        let mut trip = Trip::begin(start(), &TimeZone::UTC);
        trip.points = vec![
            TripPoint { lat: 0.0, lng: 0.0, speed: 30.0, timestamp: 0 },
            TripPoint { lat: 0.0, lng: 0.0, speed: 0.0, timestamp: 1 },
        ];
        assert!((trip.average_speed_kmh() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let trip = Trip::begin(start(), &TimeZone::UTC);
        let json = serde_json::to_value(&trip).unwrap();

        assert!(json.get("startTime").is_some());
        assert!(json.get("idleTime").is_some());
        assert!(json["endTime"].is_null());
        assert_eq!(json["id"], "2024-03-09T14:05:07.250Z");
    }

    #[test]
    fn reads_history_written_by_the_web_app() {
        let json = r#"{
            "id": "2024-03-09T14:05:07.250Z",
            "startTime": 1709993107250,
            "endTime": 1709993167250,
            "points": [{"lat": 55.67, "lng": 12.56, "speed": null, "timestamp": 1709993110000}],
            "distance": 0,
            "idleTime": 0,
            "name": "Trip - Mar 9, 2024 2:05 PM"
        }"#;
        let trip: Trip = serde_json::from_str(json).unwrap();

        assert_eq!(trip.duration_ms(), 60_000);
        assert!(trip.points[0].speed.abs() < f64::EPSILON);
    }

    #[test]
    fn point_speed_is_always_written_as_a_number() {
        let json: serde_json::Value = serde_json::from_str(
            r#"{"lat": 1.0, "lng": 2.0, "timestamp": 5}"#,
        )
        .and_then(|v: TripPoint| serde_json::to_value(v))
        .unwrap();

        assert_eq!(json["speed"], 0.0);
    }
}
