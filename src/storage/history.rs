//! Trip history: the persisted list of finished trips, most recent first.

use tracing::warn;

use crate::model::Trip;

use super::{JsonStore, KeyValueStore, Result};

/// Store key holding the JSON-serialized history list.
pub const HISTORY_KEY: &str = "tripHistory";

/// Typed view of the history document in a [`KeyValueStore`].
pub struct TripHistory<K> {
    store: K,
}

impl<K: KeyValueStore> TripHistory<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Reads the history.
    ///
    /// Never fails: a missing, unreadable or unparsable document reads as an
    /// empty history.
    pub fn load(&self) -> Vec<Trip> {
        match self.store.load_json::<Vec<Trip>>(HISTORY_KEY) {
            Ok(trips) => trips,
            Err(e) => {
                warn!(error = %e, "trip history unreadable, starting empty");
                Vec::new()
            }
        }
    }

    /// Replaces the whole history document.
    pub fn save(&self, trips: &[Trip]) -> Result<()> {
        self.store.save_json(HISTORY_KEY, trips)
    }

    /// Wipes the underlying store, not just the history key.
    pub fn clear_all(&self) -> Result<()> {
        self.store.clear()
    }
}
