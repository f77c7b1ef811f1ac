//! Output formatting for CLI display.

use crate::model::Trip;

/// Distance for display: meters below one kilometer, else km with two decimals.
pub(super) fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{km:.2} km")
    }
}

pub(super) fn format_speed(kmh: f64) -> String {
    format!("{kmh:.0} km/h")
}

/// Idle seconds as minutes with one decimal.
pub(super) fn format_idle(seconds: f64) -> String {
    format!("{:.1} min", seconds / 60.0)
}

/// Compact duration: `1h 05m`, `4m 12s` or `12s`.
pub(super) fn format_duration(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

/// One line per trip for `trip list`.
pub(super) fn format_trip_row(trip: &Trip) -> String {
    format!(
        "{}  {:>9}  {:>7}  {}",
        trip.id,
        format_distance(trip.distance),
        format_duration(trip.duration_ms()),
        trip.name
    )
}

/// Multi-line details for `trip show`.
pub(super) fn format_trip_details(trip: &Trip) -> String {
    let mut lines = vec![
        trip.name.clone(),
        format!("  id:         {}", trip.id),
        format!("  distance:   {}", format_distance(trip.distance)),
        format!("  duration:   {}", format_duration(trip.duration_ms())),
        format!("  idle:       {}", format_idle(trip.idle_time)),
        format!("  avg speed:  {}", format_speed(trip.average_speed_kmh())),
        format!("  points:     {}", trip.points.len()),
    ];
    if let (Some(first), Some(last)) = (trip.points.first(), trip.last_point()) {
        lines.push(format!("  from:       {:.5}, {:.5}", first.lat, first.lng));
        lines.push(format!("  to:         {:.5}, {:.5}", last.lat, last.lng));
    }
    lines.join("\n")
}

/// Live progress line while recording.
pub(super) fn format_progress(trip: &Trip, speed_kmh: f64) -> String {
    format!(
        "{}  {}  idle {}",
        format_distance(trip.distance),
        format_speed(speed_kmh),
        format_idle(trip.idle_time)
    )
}
