//! SQLite storage for the recorder
//!
//! Implements the playback repository and the catalog mirror on top of
//! the schema created by `cfm_common::db`.

mod catalog;
mod playbacks;

pub use catalog::SqliteCatalogMirror;
pub use playbacks::SqlitePlaybackRepository;

use cfm_common::{Error, Result};
use uuid::Uuid;

/// Parse a stored TEXT uuid column
pub(crate) fn parse_uuid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("corrupt {} value '{}': {}", column, value, e)))
}

pub(crate) fn parse_optional_uuid(column: &str, value: Option<String>) -> Result<Option<Uuid>> {
    value.map(|v| parse_uuid(column, &v)).transpose()
}
