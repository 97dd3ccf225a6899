//! Playback domain model

use cfm_common::catalog::IdentifyQuery;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds a now-playing entry stays valid when the track length is unknown
pub const DEFAULT_NOW_PLAYING_SECONDS: i64 = 600;

/// Authenticated caller, as forwarded by the fronting gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// May list playbacks across all users
    pub admin: bool,
}

impl User {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            admin: false,
        }
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }
}

/// Playback details exactly as submitted by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlaybackData {
    pub artists: Vec<String>,
    pub recording_title: String,
    pub release_title: String,
    /// Track length in seconds
    pub length: Option<i64>,
    pub disc_number: Option<i32>,
    pub track_number: Option<i32>,
}

impl RawPlaybackData {
    pub fn identify_query(&self) -> IdentifyQuery {
        IdentifyQuery {
            artists: self.artists.clone(),
            recording_title: self.recording_title.clone(),
            release_title: self.release_title.clone(),
        }
    }
}

/// A recorded playback event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playback {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Unix epoch seconds
    pub timestamp: i64,
    /// Seconds actually played
    pub play_time: Option<i64>,
    /// Submitting client (e.g. a player plugin name)
    pub source: Option<String>,
    pub original: RawPlaybackData,
    /// Canonical recording (track) id
    pub recording_id: Option<Uuid>,
    pub release_group_id: Option<Uuid>,
}

impl Playback {
    /// True while no canonical ids are attached
    pub fn is_broken(&self) -> bool {
        self.recording_id.is_none() || self.release_group_id.is_none()
    }

    /// Attach canonical ids (always both)
    pub fn resolve(&mut self, recording_id: Uuid, release_group_id: Uuid) {
        self.recording_id = Some(recording_id);
        self.release_group_id = Some(release_group_id);
    }

    pub fn is_resolved_to(&self, recording_id: Uuid, release_group_id: Uuid) -> bool {
        self.recording_id == Some(recording_id) && self.release_group_id == Some(release_group_id)
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        self.user_id == user.id
    }
}

/// Broken playbacks of one user sharing the same raw details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatedBrokenPlayback {
    pub artists: Vec<String>,
    pub recording_title: String,
    pub release_title: String,
    pub occurrences: i64,
}

/// What a user is listening to right now (at most one per user)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    #[serde(skip)]
    pub user_id: Uuid,
    pub artists: Vec<String>,
    pub recording_title: String,
    pub release_title: String,
    /// Unix epoch seconds after which the entry is stale
    pub expires_at: i64,
    pub recording_id: Option<Uuid>,
    pub release_group_id: Option<Uuid>,
}

impl NowPlaying {
    pub fn is_broken(&self) -> bool {
        self.recording_id.is_none() || self.release_group_id.is_none()
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

/// Outcome of one item in a batch import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResultItem {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl BatchResultItem {
    pub fn created(id: Uuid) -> Self {
        Self {
            success: true,
            id: Some(id),
        }
    }

    pub fn skipped() -> Self {
        Self {
            success: false,
            id: None,
        }
    }
}
