use crate::docs::error::DocumentStoreError;
use crate::models::{RelationKind, RelationRecord, VideoEntry};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, error};

/// Live view of a collection as a sequence of full snapshots.
///
/// The first call to [`next`] yields the snapshot current at subscription
/// time; later calls wait for the next write. Intermediate snapshots may be
/// skipped when writes arrive faster than they are consumed. Dropping the
/// subscription unsubscribes.
///
/// [`next`]: Subscription::next
pub struct Subscription<T> {
    receiver: watch::Receiver<Vec<T>>,
    delivered_initial: bool,
}

/// The `videos` collection ordered by creation time, newest first
pub type VideoSubscription = Subscription<VideoEntry>;

/// One user's relation records of one kind, most recent action first
pub type RelationSubscription = Subscription<RelationRecord>;

impl<T: Clone> Subscription<T> {
    pub fn new(receiver: watch::Receiver<Vec<T>>) -> Self {
        Self {
            receiver,
            delivered_initial: false,
        }
    }

    /// Wait for the next snapshot. Returns `None` once the store has gone away.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        if !self.delivered_initial {
            self.delivered_initial = true;
            return Some(self.receiver.borrow_and_update().clone());
        }

        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// The latest snapshot without waiting
    pub fn current(&self) -> Vec<T> {
        self.receiver.borrow().clone()
    }
}

type RelationFeedKey = (String, RelationKind);

/// Per-user relation channels, created on first subscription.
///
/// Stores call [`publish`] after every relation write while still holding
/// their write lock. A channel is only refreshed while someone listens and
/// is dropped once its last subscriber is gone.
///
/// [`publish`]: RelationFeeds::publish
#[derive(Default)]
pub struct RelationFeeds {
    senders: Mutex<HashMap<RelationFeedKey, watch::Sender<Vec<RelationRecord>>>>,
}

impl RelationFeeds {
    /// Subscribe to `(user_id, kind)`. `load` reads the current records when
    /// no channel is open yet.
    pub fn subscribe<F>(
        &self,
        user_id: &str,
        kind: RelationKind,
        load: F,
    ) -> Result<RelationSubscription, DocumentStoreError>
    where
        F: FnOnce() -> Result<Vec<RelationRecord>, DocumentStoreError>,
    {
        let mut senders = self.senders.lock().map_err(|_| {
            error!("Failed to acquire relation feed lock");
            DocumentStoreError::Locked
        })?;

        let key = (user_id.to_string(), kind);
        if let Some(sender) = senders.get(&key) {
            return Ok(Subscription::new(sender.subscribe()));
        }

        let (sender, receiver) = watch::channel(load()?);
        senders.insert(key, sender);
        debug!("Opened {} feed for user {user_id}", kind.collection());
        Ok(Subscription::new(receiver))
    }

    /// Push a fresh snapshot to the subscribers of `(user_id, kind)`
    pub fn publish<F>(&self, user_id: &str, kind: RelationKind, load: F)
    where
        F: FnOnce() -> Result<Vec<RelationRecord>, DocumentStoreError>,
    {
        let Ok(mut senders) = self.senders.lock() else {
            error!("Failed to acquire relation feed lock");
            return;
        };

        let key = (user_id.to_string(), kind);
        let Some(sender) = senders.get(&key) else {
            return;
        };
        if sender.receiver_count() == 0 {
            senders.remove(&key);
            debug!("Closed {} feed for user {user_id}", kind.collection());
            return;
        }

        match load() {
            Ok(records) => {
                sender.send_replace(records);
            }
            Err(e) => error!("Failed to publish {} snapshot: {e}", kind.collection()),
        }
    }
}
