//! Threshold-based candidate selection

use cfm_common::catalog::{ScoredMatch, MAX_SCORE, MIN_SCORE};

use super::error::PlaybackError;

/// Reject thresholds outside the catalog's score range
pub fn validate_threshold(threshold: i32) -> Result<(), PlaybackError> {
    if (MIN_SCORE..=MAX_SCORE).contains(&threshold) {
        Ok(())
    } else {
        Err(PlaybackError::Validation(format!(
            "threshold must be within {}..={}, got {}",
            MIN_SCORE, MAX_SCORE, threshold
        )))
    }
}

/// Highest scoring candidate; the first one wins ties
pub fn best_candidate(candidates: Vec<ScoredMatch>) -> Option<ScoredMatch> {
    candidates
        .into_iter()
        .reduce(|best, candidate| if candidate.score > best.score { candidate } else { best })
}

/// Top candidate if its score reaches `threshold`
pub fn accept_match(candidates: Vec<ScoredMatch>, threshold: i32) -> Option<ScoredMatch> {
    best_candidate(candidates).filter(|best| best.score >= threshold)
}
