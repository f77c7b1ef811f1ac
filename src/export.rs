//! GeoJSON export of trips, for handing routes to a map.
//!
//! A trip becomes one `Feature`: a `LineString` of its points, a `Point` when
//! it has a single point, and no geometry when it has none. Positions are
//! `[lng, lat]` as GeoJSON requires.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::model::Trip;

pub fn trip_feature(trip: &Trip) -> Feature {
    let mut positions: Vec<Vec<f64>> = trip.points.iter().map(|p| vec![p.lng, p.lat]).collect();
    let geometry = match positions.len() {
        0 => None,
        1 => positions.pop().map(|p| Geometry::new(Value::Point(p))),
        _ => Some(Geometry::new(Value::LineString(positions))),
    };

    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), json!(trip.name));
    properties.insert("distanceKm".to_string(), json!(trip.distance));
    properties.insert("idleSeconds".to_string(), json!(trip.idle_time));
    properties.insert("startTime".to_string(), json!(trip.start_time));
    properties.insert("endTime".to_string(), json!(trip.end_time));

    Feature {
        bbox: None,
        geometry,
        id: Some(geojson::feature::Id::String(trip.id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// All trips as one collection, in the order given.
pub fn history_collection(trips: &[Trip]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: trips.iter().map(trip_feature).collect(),
        foreign_members: None,
    }
}
