//! Display projections of playbacks

use cfm_common::catalog::ArtistCredit;
use serde::Serialize;
use uuid::Uuid;

use super::model::{NowPlaying, Playback};

/// Mirrored catalog recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingView {
    pub id: Uuid,
    pub title: String,
    pub length: Option<i64>,
    pub artist_credit: Option<ArtistCredit>,
}

/// Mirrored catalog release group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseGroupView {
    pub id: Uuid,
    pub title: String,
    pub artist_credit: Option<ArtistCredit>,
}

/// Playback as shown to clients
///
/// Resolved playbacks show canonical names from the catalog mirror,
/// broken ones show what was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackView {
    pub id: Uuid,
    pub artists: Vec<String>,
    pub recording_title: String,
    pub release_title: String,
    pub timestamp: i64,
    pub play_time: Option<i64>,
    pub track_length: Option<i64>,
    pub disc_number: Option<i32>,
    pub track_number: Option<i32>,
    pub source: Option<String>,
    pub broken: bool,
    pub recording_id: Option<Uuid>,
    pub release_group_id: Option<Uuid>,
}

impl PlaybackView {
    /// View built from the submitted fields only
    pub fn from_raw(playback: &Playback) -> Self {
        let raw = &playback.original;
        Self {
            id: playback.id,
            artists: raw.artists.clone(),
            recording_title: raw.recording_title.clone(),
            release_title: raw.release_title.clone(),
            timestamp: playback.timestamp,
            play_time: playback.play_time,
            track_length: raw.length,
            disc_number: raw.disc_number,
            track_number: raw.track_number,
            source: playback.source.clone(),
            broken: playback.is_broken(),
            recording_id: playback.recording_id,
            release_group_id: playback.release_group_id,
        }
    }

    /// View with canonical names
    pub fn from_catalog(
        playback: &Playback,
        recording: &RecordingView,
        release_group: &ReleaseGroupView,
    ) -> Self {
        let mut view = Self::from_raw(playback);
        if let Some(name) = credited_name(recording, release_group) {
            view.artists = vec![name];
        }
        view.recording_title = recording.title.clone();
        view.release_title = release_group.title.clone();
        view.track_length = recording.length.or(view.track_length);
        view
    }
}

/// Now-playing entry as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingView {
    pub artists: Vec<String>,
    pub recording_title: String,
    pub release_title: String,
    pub expires_at: i64,
    pub broken: bool,
    pub recording_id: Option<Uuid>,
    pub release_group_id: Option<Uuid>,
}

impl NowPlayingView {
    pub fn from_raw(now_playing: &NowPlaying) -> Self {
        Self {
            artists: now_playing.artists.clone(),
            recording_title: now_playing.recording_title.clone(),
            release_title: now_playing.release_title.clone(),
            expires_at: now_playing.expires_at,
            broken: now_playing.is_broken(),
            recording_id: now_playing.recording_id,
            release_group_id: now_playing.release_group_id,
        }
    }

    pub fn from_catalog(
        now_playing: &NowPlaying,
        recording: &RecordingView,
        release_group: &ReleaseGroupView,
    ) -> Self {
        let mut view = Self::from_raw(now_playing);
        if let Some(name) = credited_name(recording, release_group) {
            view.artists = vec![name];
        }
        view.recording_title = recording.title.clone();
        view.release_title = release_group.title.clone();
        view
    }
}

fn credited_name(recording: &RecordingView, release_group: &ReleaseGroupView) -> Option<String> {
    recording
        .artist_credit
        .as_ref()
        .or(release_group.artist_credit.as_ref())
        .map(|credit| credit.name.clone())
}
