//! Catalog types shared with the mbs lookup service
//!
//! The recorder never edits catalog data. These types describe what the
//! catalog hands out: scored identification candidates and the artist
//! credits attached to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Lowest confidence score the catalog reports
pub const MIN_SCORE: i32 = 0;

/// Highest confidence score the catalog reports
pub const MAX_SCORE: i32 = 100;

/// Artist credit as recorded in the MusicBrainz catalog
///
/// A named grouping of one or more artists as credited on a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistCredit {
    /// Catalog row id
    pub id: i64,
    /// Display string for the credited artists (e.g. "Artist A feat. Artist B")
    pub name: String,
    /// Number of distinct artists contributing to this credit
    pub artist_count: i32,
    /// Number of catalog records referencing this credit
    pub ref_count: i32,
    /// First appearance in the catalog
    pub created: DateTime<Utc>,
}

impl ArtistCredit {
    /// Check the catalog invariants (`artist_count >= 1`, `ref_count >= 0`)
    pub fn validate(&self) -> Result<()> {
        if self.artist_count < 1 {
            return Err(Error::InvalidInput(format!(
                "artist credit {} has artist_count {} (must be >= 1)",
                self.id, self.artist_count
            )));
        }
        if self.ref_count < 0 {
            return Err(Error::InvalidInput(format!(
                "artist credit {} has negative ref_count {}",
                self.id, self.ref_count
            )));
        }
        Ok(())
    }
}

/// Raw playback text to identify against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyQuery {
    pub artists: Vec<String>,
    pub recording_title: String,
    pub release_title: String,
}

/// One identification candidate with its confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMatch {
    /// Confidence in `MIN_SCORE..=MAX_SCORE`
    pub score: i32,
    /// Canonical recording (track) id
    pub recording_id: Uuid,
    /// Canonical release group id
    pub release_group_id: Uuid,
    pub recording_title: String,
    pub release_group_title: String,
    /// Recording length in seconds
    #[serde(default)]
    pub length: Option<i64>,
    #[serde(default)]
    pub artist_credit: Option<ArtistCredit>,
}

impl ScoredMatch {
    /// Clamp the score into the catalog's score range
    pub fn normalized(mut self) -> Self {
        self.score = self.score.clamp(MIN_SCORE, MAX_SCORE);
        self
    }
}

/// Body of the mbs identify endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifyResponse {
    #[serde(default)]
    pub candidates: Vec<ScoredMatch>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credit(artist_count: i32, ref_count: i32) -> ArtistCredit {
        ArtistCredit {
            id: 7,
            name: "Abc".to_string(),
            artist_count,
            ref_count,
            created: Utc.with_ymd_and_hms(2012, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_artist_credit_valid() {
        assert!(credit(1, 0).validate().is_ok());
        assert!(credit(3, 120).validate().is_ok());
    }

    #[test]
    fn test_artist_credit_rejects_zero_artists() {
        assert!(credit(0, 5).validate().is_err());
    }

    #[test]
    fn test_artist_credit_rejects_negative_ref_count() {
        assert!(credit(1, -1).validate().is_err());
    }

    #[test]
    fn test_scored_match_wire_format() {
        let json = r#"{
            "candidates": [{
                "score": 92,
                "recordingId": "6f1f4b5e-0d3c-4b8e-9a41-1d2f3c4b5a69",
                "releaseGroupId": "0c2a9d8e-7b6f-4e5d-8c4b-3a2f1e0d9c8b",
                "recordingTitle": "Xyz",
                "releaseGroupTitle": "The Album",
                "artistCredit": {
                    "id": 7, "name": "Abc", "artistCount": 1, "refCount": 12,
                    "created": "2012-05-01T00:00:00Z"
                }
            }]
        }"#;

        let response: IdentifyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.candidates.len(), 1);
        let candidate = &response.candidates[0];
        assert_eq!(candidate.score, 92);
        assert_eq!(candidate.length, None);
        assert_eq!(candidate.artist_credit.as_ref().unwrap().ref_count, 12);
    }

    #[test]
    fn test_scored_match_normalized_clamps() {
        let json = r#"{"score": 140, "recordingId": "6f1f4b5e-0d3c-4b8e-9a41-1d2f3c4b5a69",
            "releaseGroupId": "0c2a9d8e-7b6f-4e5d-8c4b-3a2f1e0d9c8b",
            "recordingTitle": "Xyz", "releaseGroupTitle": "The Album"}"#;
        let high: ScoredMatch = serde_json::from_str(json).unwrap();
        assert_eq!(high.normalized().score, MAX_SCORE);

        let mut low: ScoredMatch = serde_json::from_str(json).unwrap();
        low.score = -3;
        assert_eq!(low.normalized().score, MIN_SCORE);
    }
}
