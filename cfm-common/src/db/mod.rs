//! Database pool initialization and schema

pub mod init;
pub mod schema;

pub use init::*;
pub use schema::{create_schema, SCHEMA_VERSION};
