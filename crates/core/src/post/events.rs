//! Feed refresh signal.

use std::sync::Arc;

use tokio::sync::watch;

/// Broadcasts a revision counter that moves every time the feed changes.
///
/// Readers hold a [`watch::Receiver`] and re-query the feed when it changes.
/// Intermediate revisions may be skipped; only the latest one is observed.
#[derive(Debug, Clone)]
pub struct FeedEvents {
    sender: Arc<watch::Sender<u64>>,
}

impl FeedEvents {
    /// Create a signal at revision 0.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Bump the revision. Succeeds with or without subscribers.
    pub fn notify(&self) {
        self.sender.send_modify(|revision| *revision += 1);
    }

    /// Subscribe to revision changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }

    /// Current revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.sender.borrow()
    }
}

impl Default for FeedEvents {
    fn default() -> Self {
        Self::new()
    }
}
