//! Storage seams of the playback boundary

use std::collections::HashMap;

use async_trait::async_trait;
use cfm_common::catalog::ScoredMatch;
use cfm_common::pagination::{Page, PageRequest};
use cfm_common::Result;
use uuid::Uuid;

use super::model::{AccumulatedBrokenPlayback, NowPlaying, Playback};
use super::view::{RecordingView, ReleaseGroupView};

/// Playback store
#[async_trait]
pub trait PlaybackRepository: Send + Sync {
    async fn insert(&self, playback: &Playback) -> Result<()>;

    async fn find(&self, id: Uuid) -> Result<Option<Playback>>;

    /// Overwrite every mutable column of an existing playback
    async fn update(&self, playback: &Playback) -> Result<()>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn list_all(&self, page: &PageRequest) -> Result<Page<Playback>>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        only_broken: bool,
        page: &PageRequest,
    ) -> Result<Page<Playback>>;

    /// Broken playbacks grouped by raw details, most frequent first
    async fn accumulated_broken(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<Page<AccumulatedBrokenPlayback>>;

    /// Insert or replace the user's now-playing entry
    async fn save_now_playing(&self, now_playing: &NowPlaying) -> Result<()>;

    async fn find_now_playing(&self, user_id: Uuid) -> Result<Option<NowPlaying>>;
}

/// Local read-only copy of catalog data from accepted matches
#[async_trait]
pub trait CatalogMirror: Send + Sync {
    /// Store recording, release group and artist credit of a match
    async fn remember(&self, matched: &ScoredMatch) -> Result<()>;

    async fn recordings(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, RecordingView>>;

    async fn release_groups(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, ReleaseGroupView>>;
}
