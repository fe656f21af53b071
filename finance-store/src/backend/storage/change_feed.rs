//! In-process change notification hub.
//!
//! Each (table, user) pair gets its own broadcast channel, so a subscriber
//! only ever sees changes for the rows it filtered on. Notifications are
//! published by the REST webhook when the hosted backend reports a row
//! change.

use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

use super::traits::{ChangeEvent, ChangeFeed, Table};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
pub struct BroadcastChangeFeed {
    channels: Mutex<HashMap<(Table, String), broadcast::Sender<ChangeEvent>>>,
}

impl BroadcastChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (table, user) channels currently held
    pub fn channel_count(&self) -> usize {
        self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    /// Number of live receivers on the channel for `(table, user_id)`
    pub fn subscriber_count(&self, table: Table, user_id: &str) -> usize {
        let channels = self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .get(&(table, user_id.to_string()))
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl ChangeFeed for BroadcastChangeFeed {
    fn subscribe(&self, table: Table, user_id: &str) -> broadcast::Receiver<ChangeEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Drop channels whose subscribers have all gone away
        channels.retain(|_, sender| sender.receiver_count() > 0);
        channels
            .entry((table, user_id.to_string()))
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn publish(&self, event: ChangeEvent) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let key = (event.table, event.user_id.clone());
        let Some(sender) = channels.get(&key) else {
            return 0;
        };
        if sender.receiver_count() == 0 {
            channels.remove(&key);
            return 0;
        }

        let table = event.table;
        let delivered = sender.send(event).unwrap_or(0);
        debug!("Change on {} delivered to {} subscriber(s)", table.as_str(), delivered);
        delivered
    }
}
