//! Position sources: the device capability that produces location fixes.
//!
//! A source is watched with a set of [`WatchOptions`] and delivers
//! [`PositionUpdate`]s over a channel, one at a time and in emission order.
//! Clearing the watch stops delivery.

mod feed;

use std::sync::mpsc::Sender;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use feed::FeedSource;

/// Default per-sample timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One fix as delivered by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,

    /// Ground speed in meters per second, when the source knows it.
    #[serde(default)]
    pub speed: Option<f64>,

    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
}

impl PositionSample {
    /// Speed converted to km/h. Missing or non-finite speeds read as zero.
    pub fn speed_kmh(&self) -> f64 {
        self.speed.filter(|s| s.is_finite()).map_or(0.0, |s| s * 3.6)
    }
}

/// Out-of-band failures reported by a source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositionError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("timeout expired after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// What a watch delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionUpdate {
    Sample(PositionSample),
    Error(PositionError),
}

/// Subscription parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,

    /// How long to wait for each fix before reporting a timeout.
    pub timeout: Duration,

    /// Oldest cached fix the source may hand out. Zero means every fix is fresh.
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Handle returned by [`PositionSource::watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// A continuous location capability.
pub trait PositionSource {
    /// Whether the device exposes this capability at all.
    fn is_available(&self) -> bool;

    /// Starts delivering updates into `updates` until [`clear_watch`](Self::clear_watch).
    fn watch(
        &mut self,
        options: &WatchOptions,
        updates: Sender<PositionUpdate>,
    ) -> Result<WatchId, PositionError>;

    /// Stops a watch. Unknown or already-cleared ids are ignored.
    fn clear_watch(&mut self, id: WatchId);
}

/// A device without location capability. Lets history-only commands drive
/// a tracker without a feed.
#[derive(Debug, Default)]
pub struct NoPositionSource;

impl PositionSource for NoPositionSource {
    fn is_available(&self) -> bool {
        false
    }

    fn watch(
        &mut self,
        _options: &WatchOptions,
        _updates: Sender<PositionUpdate>,
    ) -> Result<WatchId, PositionError> {
        Err(PositionError::Unavailable("no position source".to_string()))
    }

    fn clear_watch(&mut self, _id: WatchId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(speed: Option<f64>) -> PositionSample {
        PositionSample {
            latitude: 0.0,
            longitude: 0.0,
            speed,
            timestamp: 0,
        }
    }

    #[test]
    fn speed_converts_meters_per_second_to_kmh() {
        let kmh = sample(Some(10.0)).speed_kmh();
        assert!((kmh - 36.0).abs() < 1e-9);
    }

    #[test]
    fn missing_zero_or_nan_speed_is_zero() {
        for speed in [None, Some(0.0), Some(f64::NAN)] {
            assert!(sample(speed).speed_kmh().abs() < f64::EPSILON, "{speed:?}");
        }
    }

    #[test]
    fn default_options_match_live_tracking() {
        let options = WatchOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::ZERO);
    }

    #[test]
    fn no_position_source_refuses_watches() {
        let mut source = NoPositionSource;
        let (tx, _rx) = std::sync::mpsc::channel();
        assert!(!source.is_available());
        assert!(source.watch(&WatchOptions::default(), tx).is_err());
    }

    #[test]
    fn sample_parses_without_speed() {
        let s: PositionSample =
            serde_json::from_str(r#"{"latitude": 1.5, "longitude": 2.5, "timestamp": 10}"#)
                .unwrap();
        assert_eq!(s.speed, None);
    }
}
