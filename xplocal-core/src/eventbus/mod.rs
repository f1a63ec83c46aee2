//! src/eventbus/mod.rs
//!
//! In-process event bus with guaranteed delivery to multiple subscribers via
//! bounded MPSC queues. The ledger publishes an event for every activity-log
//! append; subscribers (live owner feed, future webhooks) consume at their
//! own pace. Delivery is best-effort freshness only; correctness never
//! depends on it.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use uuid::Uuid;

/// Events the ledger publishes as XP moves through the system.
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    /// XP credited for an earning task (check-in scan or one-time task).
    XpCredited {
        venue_id: Uuid,
        user_id: Uuid,
        amount: i64,
        action: String,
        timestamp: DateTime<Utc>,
    },

    /// XP spent on a reward purchase.
    XpSpent {
        venue_id: Uuid,
        user_id: Uuid,
        amount: i64,
        reward_label: String,
        code: String,
        timestamp: DateTime<Utc>,
    },

    /// A redemption code was verified by staff. No balance change.
    RewardFulfilled {
        venue_id: Uuid,
        user_id: Uuid,
        redemption_id: Uuid,
        reward_label: String,
        timestamp: DateTime<Utc>,
    },

    /// Administrative broadcast, mostly for debugging.
    SystemMessage(String),
}

impl LedgerEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::XpCredited { .. } => "xp.credited",
            LedgerEvent::XpSpent { .. } => "xp.spent",
            LedgerEvent::RewardFulfilled { .. } => "reward.fulfilled",
            LedgerEvent::SystemMessage(_) => "system_message",
        }
    }

    pub fn venue_id(&self) -> Option<Uuid> {
        match self {
            LedgerEvent::XpCredited { venue_id, .. }
            | LedgerEvent::XpSpent { venue_id, .. }
            | LedgerEvent::RewardFulfilled { venue_id, .. } => Some(*venue_id),
            LedgerEvent::SystemMessage(_) => None,
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<LedgerEvent>`.
///
/// - If the subscriber's channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - If the subscriber has dropped the `Receiver`, the channel is closed
///   and sending returns an error, which we ignore.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<LedgerEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 10000;

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<LedgerEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: LedgerEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
