//! Notification sink: where user-facing notices go.

use tracing::{info, warn};

use crate::model::Notice;

/// Fire-and-forget delivery of notices to the user.
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Prints notices to stderr, keeping stdout free for command output.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            warn!(title = %notice.title, "notice");
        } else {
            info!(title = %notice.title, "notice");
        }
        match &notice.description {
            Some(description) => eprintln!("{}: {description}", notice.title),
            None => eprintln!("{}", notice.title),
        }
    }
}
