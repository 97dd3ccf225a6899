//! cfm-recorder library - playback recording and reconciliation
//!
//! Stores what users listened to and links each playback to the canonical
//! catalog recording and release group when the mbs lookup is confident
//! enough.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod mbs;
pub mod playback;

use db::{SqliteCatalogMirror, SqlitePlaybackRepository};
use mbs::CatalogLookup;
use playback::PlaybackBoundary;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub boundary: PlaybackBoundary,
    /// Matching threshold for requests that do not carry one
    pub default_threshold: i32,
    pub startup_time: Instant,
}

impl AppState {
    /// Wire the SQLite stores and the given catalog lookup into a boundary
    pub fn new(db: SqlitePool, lookup: Arc<dyn CatalogLookup>, default_threshold: i32) -> Self {
        let boundary = PlaybackBoundary::new(
            Arc::new(SqlitePlaybackRepository::new(db.clone())),
            Arc::new(SqliteCatalogMirror::new(db.clone())),
            lookup,
        );

        Self {
            db,
            boundary,
            default_threshold,
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .merge(api::playback_routes())
        .merge(api::now_playing_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
