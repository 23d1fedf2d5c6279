pub mod background;
pub mod card;
pub mod controller;
pub mod error;
pub mod relations;
pub mod toggle;

pub use background::{BackgroundVideo, BackgroundView, VisibilityAction};
pub use card::{delete_video_entry, DeleteOutcome, Playback, PlaybackState, ToggleOutcome, VideoCard};
pub use controller::{ActiveChange, FeedController, DEFAULT_ACTIVE_THRESHOLD};
pub use error::{BackgroundError, CardError, PlaybackError};
pub use relations::{load_saved, SavedList};
pub use toggle::{RelationToggle, ToggleState};
