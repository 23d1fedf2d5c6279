use crate::feed::error::BackgroundError;
use rand::Rng;
use tracing::{debug, warn};

/// What the background layer shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundView {
    Video { source: String },
    Poster { path: String },
}

/// What the host should do to the background element after a visibility change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityAction {
    Pause,
    Resume,
    Nothing,
}

/// Full-screen background video picked once per mount.
///
/// Falls back to the poster when there is nothing to play, when reduced
/// motion is requested, or when the chosen source fails. It never picks
/// another source without a remount.
#[derive(Debug, Clone)]
pub struct BackgroundVideo {
    view: BackgroundView,
    poster: String,
    paused: bool,
}

impl BackgroundVideo {
    pub fn mount<R: Rng>(
        sources: &[String],
        poster: &str,
        reduced_motion: bool,
        rng: &mut R,
    ) -> Result<Self, BackgroundError> {
        let poster = poster.trim();
        if poster.is_empty() {
            return Err(BackgroundError::MissingPoster);
        }

        let pool: Vec<&String> = sources.iter().filter(|s| !s.trim().is_empty()).collect();
        let view = if reduced_motion || pool.is_empty() {
            debug!(
                "Background shows poster (reduced_motion={}, sources={})",
                reduced_motion,
                pool.len()
            );
            BackgroundView::Poster {
                path: poster.to_string(),
            }
        } else {
            let source = pool[rng.random_range(0..pool.len())].clone();
            debug!("Background picked {}", source);
            BackgroundView::Video { source }
        };

        Ok(Self {
            view,
            poster: poster.to_string(),
            paused: false,
        })
    }

    pub fn view(&self) -> &BackgroundView {
        &self.view
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The chosen source failed to decode or play; show the poster for the
    /// rest of this mount
    pub fn on_playback_error(&mut self) {
        if let BackgroundView::Video { source } = &self.view {
            warn!("Background video {} failed, showing poster", source);
            self.view = BackgroundView::Poster {
                path: self.poster.clone(),
            };
        }
    }

    pub fn on_visibility_change(&mut self, visible: bool) -> VisibilityAction {
        if !matches!(self.view, BackgroundView::Video { .. }) {
            return VisibilityAction::Nothing;
        }
        match (visible, self.paused) {
            (false, false) => {
                self.paused = true;
                VisibilityAction::Pause
            }
            (true, true) => {
                self.paused = false;
                VisibilityAction::Resume
            }
            _ => VisibilityAction::Nothing,
        }
    }
}
