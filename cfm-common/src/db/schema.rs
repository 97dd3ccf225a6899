//! Table definitions
//!
//! All statements are idempotent (`IF NOT EXISTS`), so `create_schema`
//! runs on every startup.
//!
//! Identifiers are stored as TEXT UUIDs, playback timestamps as epoch
//! seconds, and artist lists as JSON arrays.

use crate::Result;
use sqlx::SqlitePool;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Create every table and index used by the recorder
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    // Read-only mirror of catalog data seen in accepted matches
    create_artist_credits_table(pool).await?;
    create_recordings_table(pool).await?;
    create_release_groups_table(pool).await?;

    create_playbacks_table(pool).await?;
    create_now_playing_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_artist_credits_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artist_credits (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            artist_count INTEGER NOT NULL CHECK (artist_count >= 1),
            ref_count INTEGER NOT NULL CHECK (ref_count >= 0),
            created TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_recordings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recordings (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            length INTEGER,
            artist_credit_id INTEGER REFERENCES artist_credits(id),
            last_updated TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_release_groups_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS release_groups (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            artist_credit_id INTEGER REFERENCES artist_credits(id),
            last_updated TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_playbacks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playbacks (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            play_time INTEGER,
            source TEXT,
            artists_json TEXT NOT NULL,
            recording_title TEXT NOT NULL,
            release_title TEXT NOT NULL,
            length INTEGER,
            disc_number INTEGER,
            track_number INTEGER,
            recording_id TEXT,
            release_group_id TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_playbacks_user_timestamp ON playbacks(user_id, timestamp)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_playbacks_timestamp ON playbacks(timestamp)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_now_playing_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS now_playing (
            user_id TEXT PRIMARY KEY,
            artists_json TEXT NOT NULL,
            recording_title TEXT NOT NULL,
            release_title TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            recording_id TEXT,
            release_group_id TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
