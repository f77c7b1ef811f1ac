//! Trip tracking: the state machine that turns a position stream into trips.
//!
//! The tracker is either idle or recording one trip. While recording it
//! owns a watch on the [`PositionSource`] and folds every delivered sample
//! into the active trip: Haversine distance from the previous point, and
//! idle time from the elapsed time between samples whenever the new speed
//! is at or below the idle threshold. Stopping prepends the finished trip
//! to the persisted history (or discards it if nothing was recorded).
//!
//! Every outcome the user should see is reported through the [`Notifier`];
//! none of the failure paths leave the tracker in a half-updated state.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};

use jiff::tz::TimeZone;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::geo::haversine_distance;
use crate::model::{Notice, Trip, TripId, TripPoint};
use crate::notify::Notifier;
use crate::position::{
    PositionError, PositionSample, PositionSource, PositionUpdate, WatchId, WatchOptions,
};
use crate::storage::{KeyValueStore, TripHistory};

/// Speeds at or below this many km/h count as idling.
pub const IDLE_SPEED_THRESHOLD_KMH: f64 = 5.0;

/// Tunables for a tracker.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub idle_speed_threshold_kmh: f64,
    pub watch: WatchOptions,

    /// Zone used to name trips after their local start time.
    pub time_zone: TimeZone,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            idle_speed_threshold_kmh: IDLE_SPEED_THRESHOLD_KMH,
            watch: WatchOptions::default(),
            time_zone: TimeZone::system(),
        }
    }
}

/// Errors that abort [`Tracker::start`] before any state changes.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("geolocation is not available on this device")]
    GeolocationUnavailable,

    #[error("a trip is already being tracked")]
    AlreadyTracking,

    #[error("could not watch position: {0}")]
    Watch(#[from] PositionError),
}

/// What a call to [`Tracker::stop`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The trip had points and was added to the history.
    Saved(TripId),

    /// The trip had no points and was dropped.
    Cancelled,

    /// Nothing was being tracked.
    NotTracking,
}

/// State changes, delivered to listeners registered with [`Tracker::on_change`].
#[derive(Debug)]
pub enum TrackerEvent<'a> {
    Started(&'a Trip),
    Moved {
        trip: &'a Trip,
        position: &'a PositionSample,
    },
    Ended(&'a Trip),
    Cancelled,
    Deleted(&'a TripId),
}

type Listener = Box<dyn FnMut(&TrackerEvent<'_>)>;

/// The recording in progress.
struct Session {
    trip: Trip,
    watch: WatchId,
    updates: Receiver<PositionUpdate>,
}

enum State {
    Idle,
    Tracking(Session),
}

/// Records trips from a position source into a persisted history.
pub struct Tracker<S: PositionSource, K: KeyValueStore> {
    source: S,
    store: TripHistory<K>,
    history: Vec<Trip>,
    state: State,
    current_position: Option<PositionSample>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
    settings: TrackerSettings,
    listeners: Vec<Listener>,
}

impl<S: PositionSource, K: KeyValueStore> Tracker<S, K> {
    /// Creates an idle tracker, reading the persisted history once.
    pub fn new(
        source: S,
        store: TripHistory<K>,
        notifier: Box<dyn Notifier>,
        clock: Box<dyn Clock>,
        settings: TrackerSettings,
    ) -> Self {
        let history = store.load();
        debug!(trips = history.len(), "loaded trip history");
        Self {
            source,
            store,
            history,
            state: State::Idle,
            current_position: None,
            notifier,
            clock,
            settings,
            listeners: Vec::new(),
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, State::Tracking(_))
    }

    /// Finished trips, most recent first.
    pub fn history(&self) -> &[Trip] {
        &self.history
    }

    /// The last sample received, kept after the trip ends.
    pub fn current_position(&self) -> Option<&PositionSample> {
        self.current_position.as_ref()
    }

    /// Registers a listener for state changes.
    pub fn on_change(&mut self, listener: impl FnMut(&TrackerEvent<'_>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Begins recording a new trip.
    ///
    /// Fails without touching any state when the device has no position
    /// capability, when the watch is refused, or when a trip is already
    /// being recorded.
    pub fn start(&mut self) -> Result<(), TrackerError> {
        if self.is_tracking() {
            warn!("start requested while already tracking");
            return Err(TrackerError::AlreadyTracking);
        }

        if !self.source.is_available() {
            self.notifier
                .notify(Notice::error("Geolocation is not available on this device"));
            return Err(TrackerError::GeolocationUnavailable);
        }

        let (tx, rx) = mpsc::channel();
        let watch = match self.source.watch(&self.settings.watch, tx) {
            Ok(watch) => watch,
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Geolocation error: {e}")));
                return Err(e.into());
            }
        };

        let trip = Trip::begin(self.clock.now(), &self.settings.time_zone);
        info!(trip = %trip.id, "trip started");
        self.state = State::Tracking(Session {
            trip,
            watch,
            updates: rx,
        });

        if let State::Tracking(session) = &self.state {
            emit(&mut self.listeners, &TrackerEvent::Started(&session.trip));
        }
        self.notifier.notify(
            Notice::info("Trip started!").with_description("We are now tracking your journey."),
        );
        Ok(())
    }

    /// Applies one update from the position source.
    pub fn apply(&mut self, update: PositionUpdate) -> Option<StopOutcome> {
        match update {
            PositionUpdate::Sample(sample) => {
                self.on_sample(sample);
                None
            }
            PositionUpdate::Error(e) => Some(self.on_error(&e)),
        }
    }

    /// Folds one sample into the active trip. Ignored while idle.
    pub fn on_sample(&mut self, sample: PositionSample) {
        let State::Tracking(session) = &mut self.state else {
            debug!("sample received while idle, ignoring");
            return;
        };

        let point = TripPoint {
            lat: sample.latitude,
            lng: sample.longitude,
            speed: sample.speed_kmh(),
            timestamp: sample.timestamp,
        };

        let trip = &mut session.trip;
        if let Some(previous) = trip.points.last() {
            trip.distance += haversine_distance(previous, &point);

            // Out-of-order fixes contribute no idle time.
            #[allow(clippy::cast_precision_loss)]
            let elapsed_secs = (point.timestamp - previous.timestamp).max(0) as f64 / 1000.0;
            if point.speed <= self.settings.idle_speed_threshold_kmh {
                trip.idle_time += elapsed_secs;
            }
        }
        debug!(
            lat = point.lat,
            lng = point.lng,
            distance_km = trip.distance,
            idle_secs = trip.idle_time,
            "position sample"
        );
        trip.points.push(point);

        let position = &*self.current_position.insert(sample);
        emit(
            &mut self.listeners,
            &TrackerEvent::Moved {
                trip: &session.trip,
                position,
            },
        );
    }

    /// Reports a stream failure and ends the trip, keeping what was recorded.
    pub fn on_error(&mut self, error: &PositionError) -> StopOutcome {
        if !self.is_tracking() {
            debug!(%error, "position error while idle, ignoring");
            return StopOutcome::NotTracking;
        }
        warn!(%error, "position stream failed, stopping trip");
        self.notifier
            .notify(Notice::error(format!("Geolocation error: {error}")));
        self.stop()
    }

    /// Ends the active trip. Does nothing when idle.
    pub fn stop(&mut self) -> StopOutcome {
        let State::Tracking(session) = std::mem::replace(&mut self.state, State::Idle) else {
            return StopOutcome::NotTracking;
        };
        self.source.clear_watch(session.watch);

        let mut trip = session.trip;
        if trip.points.is_empty() {
            info!(trip = %trip.id, "trip cancelled, no points recorded");
            emit(&mut self.listeners, &TrackerEvent::Cancelled);
            self.notifier.notify(
                Notice::info("Trip cancelled").with_description("Not enough data was recorded."),
            );
            return StopOutcome::Cancelled;
        }

        let now = self.clock.now().as_millisecond();
        trip.end_time = Some(now.max(trip.start_time));
        let id = trip.id.clone();
        info!(
            trip = %id,
            points = trip.points.len(),
            distance_km = trip.distance,
            idle_secs = trip.idle_time,
            "trip ended"
        );

        self.history.insert(0, trip);
        self.persist();

        emit(&mut self.listeners, &TrackerEvent::Ended(&self.history[0]));
        self.notifier
            .notify(Notice::info("Trip ended!").with_description("Your journey has been saved."));
        StopOutcome::Saved(id)
    }

    /// Removes a trip from the history. Unknown ids leave the history as is.
    pub fn delete_trip(&mut self, id: &TripId) -> bool {
        let before = self.history.len();
        self.history.retain(|trip| trip.id != *id);
        let removed = self.history.len() != before;

        if removed {
            info!(trip = %id, "trip deleted");
            self.persist();
            emit(&mut self.listeners, &TrackerEvent::Deleted(id));
        }
        self.notifier.notify(Notice::info("Trip deleted."));
        removed
    }

    /// Blocks, applying updates in delivery order, until the trip ends.
    ///
    /// The trip ends when the source closes its stream, reports an error,
    /// or stays silent for longer than the watch timeout.
    pub fn follow(&mut self) -> StopOutcome {
        let timeout = self.settings.watch.timeout;
        loop {
            let received = match &self.state {
                State::Tracking(session) => session.updates.recv_timeout(timeout),
                State::Idle => return StopOutcome::NotTracking,
            };
            match received {
                Ok(update) => {
                    if let Some(outcome) = self.apply(update) {
                        return outcome;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    return self.on_error(&PositionError::Timeout(timeout));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("position stream closed");
                    return self.stop();
                }
            }
        }
    }

    /// Writes the in-memory history through to the store.
    ///
    /// A failed write is reported but does not roll back the in-memory change.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.history) {
            error!(error = %e, "failed to save trip history");
            self.notifier.notify(
                Notice::error("Could not save trip history").with_description(e.to_string()),
            );
        }
    }
}

impl<S: PositionSource, K: KeyValueStore> Drop for Tracker<S, K> {
    /// Releases the position watch on every exit path. The trip is not saved.
    fn drop(&mut self) {
        if let State::Tracking(session) = &self.state {
            debug!(trip = %session.trip.id, "tracker dropped while tracking, releasing watch");
            self.source.clear_watch(session.watch);
        }
    }
}

fn emit(listeners: &mut [Listener], event: &TrackerEvent<'_>) {
    for listener in listeners {
        listener(event);
    }
}
