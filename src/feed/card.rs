use crate::auth::{AdminAllowList, Session};
use crate::docs::{DocumentStore, DocumentStoreError};
use crate::feed::error::{CardError, PlaybackError};
use crate::feed::relations::{relation_exists, write_relation};
use crate::feed::toggle::RelationToggle;
use crate::models::{RelationKind, VideoEntry};
use crate::objects::path::path_from_download_url;
use crate::objects::ObjectStore;
use crate::prefs::Preferences;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// The media element a card drives
#[async_trait]
pub trait Playback: Send + Sync + 'static {
    /// Start playback from the current position
    async fn play(&self, muted: bool) -> Result<(), PlaybackError>;

    fn pause(&self);

    fn seek_to_start(&self);

    fn set_muted(&self, muted: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// Result of a like/save toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The store accepted the write; holds the new value
    Applied(bool),
    /// The store rejected the write and the prior value was restored
    Reverted { value: bool, reason: String },
    /// A toggle for the same relation was still in flight
    Busy,
}

/// Result of an admin delete once the document is gone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub video_id: String,
    /// Path of the removed object, `None` when object cleanup failed
    pub removed_object: Option<String>,
}

#[derive(Debug)]
struct CardState {
    playback: PlaybackState,
    muted: bool,
    force_muted: bool,
    liked: RelationToggle,
    saved: RelationToggle,
}

fn relation_toggle(state: &mut CardState, kind: RelationKind) -> &mut RelationToggle {
    match kind {
        RelationKind::Like => &mut state.liked,
        RelationKind::Saved => &mut state.saved,
    }
}

/// State of one card in the feed. Methods take `&self` so event handlers can
/// run concurrently; state is never locked across an await.
pub struct VideoCard<D: DocumentStore + ?Sized, P: Playback> {
    entry: VideoEntry,
    store: Arc<D>,
    player: P,
    prefs: Preferences,
    session: Option<Session>,
    state: Mutex<CardState>,
}

impl<D: DocumentStore + ?Sized, P: Playback> VideoCard<D, P> {
    /// Mount a card and read the viewer's like/save state once
    pub async fn mount(
        entry: VideoEntry,
        store: Arc<D>,
        player: P,
        prefs: Preferences,
        session: Option<Session>,
    ) -> Self {
        let muted = prefs.muted();
        let card = Self {
            entry,
            store,
            player,
            prefs,
            session,
            state: Mutex::new(CardState {
                playback: PlaybackState::Idle,
                muted,
                force_muted: false,
                liked: RelationToggle::new(false),
                saved: RelationToggle::new(false),
            }),
        };
        card.load_relations().await;
        card
    }

    async fn load_relations(&self) {
        let Some(session) = &self.session else {
            return;
        };
        for kind in [RelationKind::Like, RelationKind::Saved] {
            match relation_exists(&*self.store, &session.uid, kind, &self.entry.id).await {
                Ok(exists) => {
                    let mut state = self.lock();
                    relation_toggle(&mut state, kind).load(exists);
                }
                Err(e) => warn!(
                    "Failed to read {} for video {}: {}",
                    kind.collection(),
                    self.entry.id,
                    e
                ),
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CardState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn entry(&self) -> &VideoEntry {
        &self.entry
    }

    pub fn playback(&self) -> PlaybackState {
        self.lock().playback
    }

    pub fn is_muted(&self) -> bool {
        self.lock().muted
    }

    pub fn is_force_muted(&self) -> bool {
        self.lock().force_muted
    }

    pub fn is_liked(&self) -> bool {
        self.lock().liked.is_on()
    }

    pub fn is_saved(&self) -> bool {
        self.lock().saved.is_on()
    }

    /// The card became active: play with the mute preference, falling back
    /// to muted playback once if sound is blocked
    pub async fn activate(&self) -> Result<(), CardError> {
        let muted = self.prefs.muted();
        let (muted, force_muted) = match self.player.play(muted).await {
            Ok(()) => (muted, false),
            Err(PlaybackError::SoundBlocked) if !muted => {
                debug!("Sound blocked for {}, retrying muted", self.entry.id);
                self.player.play(true).await?;
                (true, true)
            }
            Err(e) => return Err(e.into()),
        };

        let mut state = self.lock();
        state.playback = PlaybackState::Playing;
        state.muted = muted;
        state.force_muted = force_muted;
        Ok(())
    }

    /// The card left the active slot: pause and rewind
    pub fn deactivate(&self) {
        self.player.pause();
        self.player.seek_to_start();
        let mut state = self.lock();
        if state.playback != PlaybackState::Idle {
            state.playback = PlaybackState::Paused;
        }
    }

    /// A direct tap on the card. Clears a forced mute and restores the mute
    /// preference; returns whether a forced mute was cleared.
    pub fn tap(&self) -> bool {
        let mut state = self.lock();
        if !state.force_muted {
            return false;
        }
        state.force_muted = false;
        state.muted = self.prefs.muted();
        self.player.set_muted(state.muted);
        true
    }

    /// Flip mute, persist it as the viewer's preference and apply it now.
    /// Returns the new mute value.
    pub async fn toggle_mute(&self) -> Result<bool, CardError> {
        let muted = !self.is_muted();
        self.prefs.set_muted(muted).await?;
        let mut state = self.lock();
        state.muted = muted;
        state.force_muted = false;
        self.player.set_muted(muted);
        Ok(muted)
    }

    pub async fn toggle_like(&self) -> Result<ToggleOutcome, CardError> {
        self.toggle_relation(RelationKind::Like).await
    }

    pub async fn toggle_save(&self) -> Result<ToggleOutcome, CardError> {
        self.toggle_relation(RelationKind::Saved).await
    }

    async fn toggle_relation(&self, kind: RelationKind) -> Result<ToggleOutcome, CardError> {
        let session = self.session.as_ref().ok_or(CardError::NotSignedIn)?;
        let pending = {
            let mut state = self.lock();
            relation_toggle(&mut state, kind).begin()
        };
        let Some(pending) = pending else {
            debug!("{} toggle for {} still pending", kind.collection(), self.entry.id);
            return Ok(ToggleOutcome::Busy);
        };

        let target = pending.target;
        let result = write_relation(&*self.store, &session.uid, kind, &self.entry, target).await;

        let mut state = self.lock();
        let toggle = relation_toggle(&mut state, kind);
        match result {
            Ok(()) => Ok(ToggleOutcome::Applied(toggle.finish(pending, true))),
            Err(e) => {
                warn!(
                    "Reverting {} for video {}: {}",
                    kind.collection(),
                    self.entry.id,
                    e
                );
                Ok(ToggleOutcome::Reverted {
                    value: toggle.finish(pending, false),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Whether the delete control is shown to this viewer
    pub fn can_delete(&self, admins: &AdminAllowList) -> bool {
        self.session
            .as_ref()
            .map(|session| admins.permits(session))
            .unwrap_or(false)
    }

    /// Remove this video for everyone
    pub async fn admin_delete<O: ObjectStore + ?Sized>(
        &self,
        objects: &O,
        admins: &AdminAllowList,
    ) -> Result<DeleteOutcome, CardError> {
        if !self.can_delete(admins) {
            return Err(CardError::NotAuthorized);
        }
        self.player.pause();
        Ok(delete_video_entry(&*self.store, objects, &self.entry).await?)
    }
}

/// Delete the feed document, then its backing object.
///
/// The object is first removed through the store's own reference parse; if
/// that fails the path is decoded from the URL and the delete retried. Object
/// removal is best-effort and never restores the document.
pub async fn delete_video_entry<D, O>(
    store: &D,
    objects: &O,
    entry: &VideoEntry,
) -> Result<DeleteOutcome, DocumentStoreError>
where
    D: DocumentStore + ?Sized,
    O: ObjectStore + ?Sized,
{
    store.delete_video(&entry.id).await?;
    info!("Deleted video document {}", entry.id);

    let direct = match objects.reference_from_url(&entry.url) {
        Ok(path) => match objects.delete_object(&path).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Direct delete of {} failed: {}", path, e);
                None
            }
        },
        Err(e) => {
            debug!("No direct reference for {}: {}", entry.url, e);
            None
        }
    };
    if direct.is_some() {
        return Ok(DeleteOutcome {
            video_id: entry.id.clone(),
            removed_object: direct,
        });
    }

    let removed_object = match path_from_download_url(&entry.url) {
        Ok(path) => match objects.delete_object(&path).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Object {} for video {} left behind: {}", path, entry.id, e);
                None
            }
        },
        Err(e) => {
            warn!("Cannot locate object for video {}: {}", entry.id, e);
            None
        }
    };

    Ok(DeleteOutcome {
        video_id: entry.id.clone(),
        removed_object,
    })
}
