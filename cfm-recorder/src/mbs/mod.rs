//! Catalog lookup (mbs)
//!
//! The mbs service scores raw playback text against the MusicBrainz
//! catalog. The recorder only consumes candidates; it never writes to the
//! catalog.

pub mod client;

use async_trait::async_trait;
use cfm_common::catalog::{IdentifyQuery, ScoredMatch};
use thiserror::Error;

pub use client::MbsClient;

/// Catalog lookup failures
///
/// "No candidates" is not a failure; it is an empty result.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Unreachable, timed out or overloaded
    #[error("mbs unavailable: {0}")]
    Unavailable(String),

    /// Response body could not be understood
    #[error("invalid mbs response: {0}")]
    InvalidResponse(String),
}

/// Scored identification of raw playback details
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Candidates for `query`, in the order the catalog returned them
    async fn identify(&self, query: &IdentifyQuery) -> Result<Vec<ScoredMatch>, LookupError>;
}
