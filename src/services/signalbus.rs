//! # Signal Bus
//!
//! A lightweight in-process publish/subscribe mechanism used to wake a
//! reconciler immediately after a relevant mutation instead of waiting for
//! its next tick. At most one wake is pending per topic: notifying a topic
//! that already has an undelivered wake merges with it, so a pass is never
//! queued twice.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

/// In-process signal bus keyed by topic name.
#[derive(Default)]
pub struct SignalBus {
    topics: Mutex<HashMap<String, Arc<Notify>>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn topic(&self, name: &str) -> Arc<Notify> {
        self.topics
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Wake the subscribers of the named signal. A wake published before
    /// anyone is waiting is retained and delivered to the next waiter.
    pub fn notify(&self, name: &str) {
        self.topic(name).notify_one();
    }

    /// Create a subscription for the named signal.
    pub fn subscribe(&self, name: &str) -> Signal {
        Signal {
            notify: self.topic(name),
        }
    }
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("topics", &self.topics.lock().len())
            .finish()
    }
}

/// A subscription to one signal bus topic.
pub struct Signal {
    notify: Arc<Notify>,
}

impl Signal {
    /// Wait for the next wake on this topic.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}
