//! Playback service errors

use thiserror::Error;

use crate::mbs::LookupError;

/// Errors reported by the playback boundary
///
/// A catalog miss is not an error; it produces a broken playback.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Unknown identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller does not own the record
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Catalog lookup service could not be reached; retry later
    #[error("Catalog lookup unavailable: {0}")]
    LookupUnavailable(#[from] LookupError),

    /// Malformed submission, patch or threshold
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Playback store failure
    #[error("Storage error: {0}")]
    Storage(cfm_common::Error),
}

impl From<cfm_common::Error> for PlaybackError {
    /// Row gone or key taken between check and write are caller errors
    fn from(e: cfm_common::Error) -> Self {
        match e {
            cfm_common::Error::NotFound(msg) => PlaybackError::NotFound(msg),
            cfm_common::Error::Conflict(msg) => PlaybackError::Validation(msg),
            other => PlaybackError::Storage(other),
        }
    }
}

impl PlaybackError {
    /// Whether the same request may succeed when retried unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlaybackError::LookupUnavailable(_))
    }
}
