//! Partial updates of stored playbacks
//!
//! `FieldPatch` keeps "not mentioned" apart from "explicitly cleared":
//! an absent JSON key leaves the field alone, `null` clears it.

use serde::{Deserialize, Deserializer};

use super::error::PlaybackError;
use super::model::Playback;
use super::submission::{validate_artists, validate_non_negative, validate_position, validate_title};

/// Change to a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Leave the stored value unchanged
    Keep,
    /// Remove the stored value
    Clear,
    /// Replace the stored value
    Set(T),
}

impl<T> Default for FieldPatch<T> {
    fn default() -> Self {
        FieldPatch::Keep
    }
}

impl<T> FieldPatch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldPatch::Keep)
    }

    /// Apply to an optional field
    fn apply_optional(self, current: Option<T>) -> Option<T> {
        match self {
            FieldPatch::Keep => current,
            FieldPatch::Clear => None,
            FieldPatch::Set(value) => Some(value),
        }
    }

    /// Apply to a required field; clearing is rejected
    fn apply_required(self, field: &str, current: T) -> Result<T, PlaybackError> {
        match self {
            FieldPatch::Keep => Ok(current),
            FieldPatch::Clear => Err(PlaybackError::Validation(format!(
                "{} cannot be cleared",
                field
            ))),
            FieldPatch::Set(value) => Ok(value),
        }
    }
}

impl<T> From<Option<T>> for FieldPatch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            None => FieldPatch::Clear,
            Some(v) => FieldPatch::Set(v),
        }
    }
}

// Only called for keys present in the payload; absent keys fall back to
// `Default` (Keep) through `#[serde(default)]`.
impl<'de, T> Deserialize<'de> for FieldPatch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(FieldPatch::from)
    }
}

/// Body of a playback update
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlaybackPatch {
    #[serde(default)]
    pub artists: FieldPatch<Vec<String>>,
    #[serde(default)]
    pub recording_title: FieldPatch<String>,
    #[serde(default)]
    pub release_title: FieldPatch<String>,
    #[serde(default)]
    pub track_length: FieldPatch<i64>,
    #[serde(default)]
    pub play_time: FieldPatch<i64>,
    #[serde(default)]
    pub disc_number: FieldPatch<i32>,
    #[serde(default)]
    pub track_number: FieldPatch<i32>,
    #[serde(default)]
    pub timestamp: FieldPatch<i64>,
    #[serde(default)]
    pub source: FieldPatch<String>,
}

impl PlaybackPatch {
    /// True when the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.artists.is_keep()
            && self.recording_title.is_keep()
            && self.release_title.is_keep()
            && self.track_length.is_keep()
            && self.play_time.is_keep()
            && self.disc_number.is_keep()
            && self.track_number.is_keep()
            && self.timestamp.is_keep()
            && self.source.is_keep()
    }

    /// Produce the patched playback without touching `playback`
    ///
    /// Validation covers every field before anything is returned, so a
    /// rejected patch never applies partially. Canonical ids are untouched.
    pub fn apply(self, playback: &Playback) -> Result<Playback, PlaybackError> {
        let mut patched = playback.clone();
        let raw = &mut patched.original;

        raw.artists = match self.artists {
            FieldPatch::Set(artists) => validate_artists(artists)?,
            other => other.apply_required("artists", raw.artists.clone())?,
        };

        raw.recording_title = match self.recording_title {
            FieldPatch::Set(t) => validate_title("recordingTitle", Some(t))?,
            other => other.apply_required("recordingTitle", raw.recording_title.clone())?,
        };
        raw.release_title = match self.release_title {
            FieldPatch::Set(t) => validate_title("releaseTitle", Some(t))?,
            other => other.apply_required("releaseTitle", raw.release_title.clone())?,
        };

        raw.length = self.track_length.apply_optional(raw.length);
        validate_non_negative("trackLength", raw.length)?;
        raw.disc_number = self.disc_number.apply_optional(raw.disc_number);
        validate_position("discNumber", raw.disc_number)?;
        raw.track_number = self.track_number.apply_optional(raw.track_number);
        validate_position("trackNumber", raw.track_number)?;

        patched.play_time = self.play_time.apply_optional(patched.play_time);
        validate_non_negative("playTime", patched.play_time)?;
        patched.timestamp = self.timestamp.apply_required("timestamp", patched.timestamp)?;
        validate_non_negative("timestamp", Some(patched.timestamp))?;
        patched.source = self.source.apply_optional(patched.source);

        Ok(patched)
    }
}
