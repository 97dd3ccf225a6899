//! Incoming playback payloads and their validation

use cfm_common::time::now_epoch_seconds;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PlaybackError;
use super::model::{Playback, RawPlaybackData};

/// Playback as submitted by a client
///
/// Fields are optional at the wire level; missing or blank values are
/// reported by [`PlaybackSubmission::validate`]. Wrongly typed values
/// fail deserialization and are rejected before reaching it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSubmission {
    /// Client-chosen id (batch imports); generated when absent
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub recording_title: Option<String>,
    #[serde(default)]
    pub release_title: Option<String>,
    /// Track length in seconds
    #[serde(default)]
    pub track_length: Option<i64>,
    /// Seconds played; defaults to the track length
    #[serde(default)]
    pub play_time: Option<i64>,
    #[serde(default)]
    pub disc_number: Option<i32>,
    #[serde(default)]
    pub track_number: Option<i32>,
    /// Unix epoch seconds; defaults to now
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub id: Option<Uuid>,
    pub raw: RawPlaybackData,
    pub timestamp: Option<i64>,
    pub play_time: Option<i64>,
    pub source: Option<String>,
}

impl PlaybackSubmission {
    pub fn new(artists: Vec<String>, recording_title: &str, release_title: &str) -> Self {
        Self {
            artists,
            recording_title: Some(recording_title.to_string()),
            release_title: Some(release_title.to_string()),
            ..Default::default()
        }
    }

    pub fn validate(self) -> Result<ValidatedSubmission, PlaybackError> {
        let artists = validate_artists(self.artists)?;
        let recording_title = validate_title("recordingTitle", self.recording_title)?;
        let release_title = validate_title("releaseTitle", self.release_title)?;

        validate_non_negative("trackLength", self.track_length)?;
        validate_non_negative("playTime", self.play_time)?;
        validate_non_negative("timestamp", self.timestamp)?;
        validate_position("discNumber", self.disc_number)?;
        validate_position("trackNumber", self.track_number)?;

        Ok(ValidatedSubmission {
            id: self.id,
            raw: RawPlaybackData {
                artists,
                recording_title,
                release_title,
                length: self.track_length,
                disc_number: self.disc_number,
                track_number: self.track_number,
            },
            timestamp: self.timestamp,
            play_time: self.play_time,
            source: self.source.filter(|s| !s.trim().is_empty()),
        })
    }
}

impl ValidatedSubmission {
    /// Build an unresolved playback owned by `user_id`
    pub fn into_playback(self, user_id: Uuid) -> Playback {
        let play_time = self.play_time.or(self.raw.length);
        Playback {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            user_id,
            timestamp: self.timestamp.unwrap_or_else(now_epoch_seconds),
            play_time,
            source: self.source,
            original: self.raw,
            recording_id: None,
            release_group_id: None,
        }
    }
}

pub(crate) fn validate_artists(artists: Vec<String>) -> Result<Vec<String>, PlaybackError> {
    if artists.is_empty() {
        return Err(PlaybackError::Validation(
            "artists must contain at least one name".to_string(),
        ));
    }
    if artists.iter().any(|a| a.trim().is_empty()) {
        return Err(PlaybackError::Validation(
            "artists must not contain blank names".to_string(),
        ));
    }
    Ok(artists)
}

pub(crate) fn validate_title(field: &str, title: Option<String>) -> Result<String, PlaybackError> {
    match title {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(PlaybackError::Validation(format!("{} is required", field))),
    }
}

pub(crate) fn validate_non_negative(field: &str, value: Option<i64>) -> Result<(), PlaybackError> {
    match value {
        Some(v) if v < 0 => Err(PlaybackError::Validation(format!(
            "{} must not be negative, got {}",
            field, v
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn validate_position(field: &str, value: Option<i32>) -> Result<(), PlaybackError> {
    match value {
        Some(v) if v < 1 => Err(PlaybackError::Validation(format!(
            "{} must be >= 1, got {}",
            field, v
        ))),
        _ => Ok(()),
    }
}
