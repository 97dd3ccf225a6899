//! Playback reconciliation
//!
//! Raw playback submissions are matched against the catalog; confident
//! matches attach canonical recording and release group ids, everything
//! else is stored as a broken playback that can be re-resolved later.

pub mod boundary;
pub mod error;
pub mod matching;
pub mod model;
pub mod patch;
pub mod repository;
pub mod submission;
pub mod view;

pub use boundary::PlaybackBoundary;
pub use error::PlaybackError;
pub use model::{AccumulatedBrokenPlayback, BatchResultItem, NowPlaying, Playback, RawPlaybackData, User};
pub use patch::{FieldPatch, PlaybackPatch};
pub use repository::{CatalogMirror, PlaybackRepository};
pub use submission::PlaybackSubmission;
pub use view::{NowPlayingView, PlaybackView, RecordingView, ReleaseGroupView};
