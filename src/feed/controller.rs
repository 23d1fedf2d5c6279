use crate::docs::{DocumentStore, DocumentStoreError, VideoSubscription};
use crate::models::VideoEntry;
use crate::prefs::{Preferences, PreferencesError};
use tracing::{debug, info};

/// Visible ratio at which a card becomes the active one
pub const DEFAULT_ACTIVE_THRESHOLD: f64 = 0.6;

/// Active card before and after an event, by position and by entry id.
///
/// A snapshot can put a different video under the same index, so the ids
/// decide whether the active card changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveChange {
    pub previous: Option<usize>,
    pub current: Option<usize>,
    pub previous_id: Option<String>,
    pub current_id: Option<String>,
}

impl ActiveChange {
    pub fn is_change(&self) -> bool {
        self.previous_id != self.current_id
    }
}

/// Drives the scrolling feed: the live list of entries and which single card
/// is active.
///
/// Snapshots replace the list wholesale. The active index follows the most
/// recent visibility report at or above the threshold; when a snapshot shrinks
/// the list the index is clamped to the last entry.
pub struct FeedController {
    entries: Vec<VideoEntry>,
    active: Option<usize>,
    threshold: f64,
    prefs: Preferences,
    subscription: Option<VideoSubscription>,
}

impl FeedController {
    pub fn new(prefs: Preferences, threshold: f64) -> Self {
        Self {
            entries: Vec::new(),
            active: None,
            threshold,
            prefs,
            subscription: None,
        }
    }

    /// Subscribe to the feed and apply the initial snapshot
    pub async fn attach<D: DocumentStore + ?Sized>(
        &mut self,
        store: &D,
    ) -> Result<ActiveChange, DocumentStoreError> {
        let mut subscription = store.subscribe_videos().await?;
        let initial = subscription.next().await.unwrap_or_default();
        self.subscription = Some(subscription);
        info!("Feed attached with {} videos", initial.len());
        Ok(self.apply_snapshot(initial))
    }

    /// Wait for the next snapshot and apply it. `None` when detached or the
    /// store has gone away.
    pub async fn next_snapshot(&mut self) -> Option<ActiveChange> {
        let snapshot = self.subscription.as_mut()?.next().await;
        match snapshot {
            Some(entries) => Some(self.apply_snapshot(entries)),
            None => {
                debug!("Feed subscription closed");
                self.subscription = None;
                None
            }
        }
    }

    /// Replace the list with a fresh snapshot
    pub fn apply_snapshot(&mut self, entries: Vec<VideoEntry>) -> ActiveChange {
        let previous = self.active;
        let previous_id = self.active_id();
        self.entries = entries;
        self.active = match (self.entries.len(), previous) {
            (0, _) => None,
            (_, None) => Some(0),
            (len, Some(index)) => Some(index.min(len - 1)),
        };
        let current_id = self.active_id();
        debug!(
            "Feed snapshot of {} videos, active {:?} -> {:?}",
            self.entries.len(),
            previous_id,
            current_id
        );
        ActiveChange {
            previous,
            current: self.active,
            previous_id,
            current_id,
        }
    }

    fn active_id(&self) -> Option<String> {
        self.active_entry().map(|entry| entry.id.clone())
    }

    pub fn entries(&self) -> &[VideoEntry] {
        &self.entries
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_entry(&self) -> Option<&VideoEntry> {
        self.active.and_then(|index| self.entries.get(index))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Record a visibility report for the card at `index`. Returns the change
    /// when this report makes a different card active.
    pub fn report_visibility(&mut self, index: usize, ratio: f64) -> Option<ActiveChange> {
        if index >= self.entries.len() || ratio < self.threshold || self.active == Some(index) {
            return None;
        }
        let previous = self.active;
        let previous_id = self.active_id();
        self.active = Some(index);
        Some(ActiveChange {
            previous,
            current: self.active,
            previous_id,
            current_id: self.active_id(),
        })
    }

    /// The card at `index` finished playing. Returns the index to scroll to
    /// when auto-advance applies.
    pub fn on_playback_ended(&self, index: usize) -> Option<usize> {
        if self.active != Some(index) || !self.prefs.auto_advance() {
            return None;
        }
        let next = index + 1;
        (next < self.entries.len()).then_some(next)
    }

    pub fn auto_advance(&self) -> bool {
        self.prefs.auto_advance()
    }

    /// Flip and persist the auto-advance preference; returns the new value
    pub async fn toggle_auto_advance(&self) -> Result<bool, PreferencesError> {
        let enabled = !self.prefs.auto_advance();
        self.prefs.set_auto_advance(enabled).await?;
        Ok(enabled)
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Drop the live subscription
    pub fn teardown(&mut self) {
        if self.subscription.take().is_some() {
            debug!("Feed subscription dropped");
        }
    }
}
