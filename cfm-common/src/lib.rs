//! # CFM Common Library
//!
//! Shared code for the cfm services:
//! - Catalog wire types exchanged with the mbs lookup service
//! - Configuration loading and data folder resolution
//! - SQLite pool initialization and schema
//! - Pagination request/response types
//! - Error type and time helpers

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod pagination;
pub mod time;

pub use catalog::{ArtistCredit, IdentifyQuery, ScoredMatch};
pub use error::{Error, Result};
pub use pagination::{Page, PageRequest, SortDirection};
