//! JSON-lines position feed: one [`PositionSample`] object per line.
//!
//! The feed is read on a helper thread and handed to the watcher over the
//! watch channel. End of input closes the channel. A malformed line or a
//! read failure is delivered as a [`PositionError`] and ends the feed.
//!
//! ```text
//! {"latitude": 55.6761, "longitude": 12.5683, "speed": 13.4, "timestamp": 1709993110000}
//! {"latitude": 55.6764, "longitude": 12.5690, "speed": null, "timestamp": 1709993111000}
//! ```

use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use tracing::{debug, warn};

use super::{PositionError, PositionSample, PositionSource, PositionUpdate, WatchId, WatchOptions};

type Reader = Box<dyn BufRead + Send>;

/// A position source backed by a line-oriented reader (a file, a pipe, stdin).
///
/// The reader is consumed by the first watch; the source reports itself
/// unavailable afterwards.
pub struct FeedSource {
    reader: Option<Reader>,
    next_id: u64,
    active: Option<(WatchId, Arc<AtomicBool>)>,
}

impl FeedSource {
    pub fn new(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            reader: Some(Box::new(reader)),
            next_id: 1,
            active: None,
        }
    }
}

impl PositionSource for FeedSource {
    fn is_available(&self) -> bool {
        self.reader.is_some()
    }

    fn watch(
        &mut self,
        options: &WatchOptions,
        updates: Sender<PositionUpdate>,
    ) -> Result<WatchId, PositionError> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| PositionError::Unavailable("feed already consumed".to_string()))?;

        let id = WatchId(self.next_id);
        self.next_id += 1;
        let cancelled = Arc::new(AtomicBool::new(false));
        self.active = Some((id, Arc::clone(&cancelled)));

        debug!(watch = id.0, ?options, "watching position feed");
        thread::spawn(move || pump(reader, &updates, &cancelled));
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        if let Some((active, cancelled)) = &self.active
            && *active == id
        {
            cancelled.store(true, Ordering::SeqCst);
            self.active = None;
            debug!(watch = id.0, "cleared position watch");
        }
    }
}

/// Reads lines until end of input, cancellation, a bad line, or a closed receiver.
fn pump(reader: Reader, updates: &Sender<PositionUpdate>, cancelled: &AtomicBool) {
    for (index, line) in reader.lines().enumerate() {
        if cancelled.load(Ordering::SeqCst) {
            return;
        }
        let update = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match parse_line(&line, index + 1) {
                Ok(sample) => PositionUpdate::Sample(sample),
                Err(e) => PositionUpdate::Error(e),
            },
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                PositionUpdate::Error(PositionError::PermissionDenied)
            }
            Err(e) => PositionUpdate::Error(PositionError::Unavailable(format!(
                "failed to read feed: {e}"
            ))),
        };
        let failed = matches!(update, PositionUpdate::Error(_));
        if failed {
            warn!(line = index + 1, "position feed failed");
        }
        if updates.send(update).is_err() || failed {
            return;
        }
    }
}

fn parse_line(line: &str, number: usize) -> Result<PositionSample, PositionError> {
    serde_json::from_str(line)
        .map_err(|e| PositionError::Unavailable(format!("malformed fix on line {number}: {e}")))
}
