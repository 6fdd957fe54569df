//! In-process snapshot fan-out between the transport and the widget.
//!
//! The WebSocket task publishes decoded updates into a `SnapshotFeed`; each
//! subscriber gets its own unbounded channel that the UI thread drains once
//! per frame. Deliveries to one subscriber keep publication order.
//!
//! Dropping (or disposing) a `Subscription` removes its sender from the
//! feed, so nothing can reach a widget after it unmounted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::protocol::SnapshotUpdate;

/// Subscribe-only source of snapshot updates.
pub trait PushChannel {
    fn subscribe(&self) -> Subscription;
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<(u64, mpsc::UnboundedSender<SnapshotUpdate>)>,
}

/// Cloneable publisher handle; all clones share one subscriber registry.
#[derive(Clone, Default)]
pub struct SnapshotFeed {
    registry: Arc<Mutex<Registry>>,
}

impl SnapshotFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `update` to every live subscriber. Returns the delivery count.
    pub fn publish(&self, update: SnapshotUpdate) -> usize {
        let mut registry = lock(&self.registry);
        registry
            .subscribers
            .retain(|(_, tx)| tx.send(update.clone()).is_ok());
        trace!(target: "feed", delivered = registry.subscribers.len(), "Snapshot published");
        registry.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).subscribers.len()
    }
}

impl PushChannel for SnapshotFeed {
    fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.subscribers.push((id, tx));
            id
        };
        debug!(target: "feed", id, "Subscribed");
        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }
}

/// A live registration on a `SnapshotFeed`.
///
/// Ownership is the disposer: it can be released exactly once, either by
/// `dispose` or by dropping it.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<SnapshotUpdate>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Next pending update, without blocking.
    pub fn try_next(&mut self) -> Option<SnapshotUpdate> {
        self.rx.try_recv().ok()
    }

    pub fn dispose(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).subscribers.retain(|(id, _)| *id != self.id);
        }
        debug!(target: "feed", id = self.id, "Unsubscribed");
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
