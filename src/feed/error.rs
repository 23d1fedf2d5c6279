use crate::docs::DocumentStoreError;
use crate::prefs::PreferencesError;
use thiserror::Error;

/// Errors surfaced by the background selector at mount
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BackgroundError {
    #[error("Background poster path is not configured")]
    MissingPoster,
}

/// Rejections reported by the playback environment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Playback with sound was blocked")]
    SoundBlocked,

    #[error("Playback failed: {0}")]
    Failed(String),
}

/// Errors reported by a video card
#[derive(Error, Debug)]
pub enum CardError {
    #[error("Sign in to like or save videos")]
    NotSignedIn,

    #[error("Only admins can delete videos")]
    NotAuthorized,

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Preferences(#[from] PreferencesError),

    #[error(transparent)]
    Store(#[from] DocumentStoreError),
}
