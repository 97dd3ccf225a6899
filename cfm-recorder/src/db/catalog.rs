//! Local mirror of catalog data
//!
//! Rows are only ever written from accepted catalog matches, never from
//! user input.

use std::collections::HashMap;

use async_trait::async_trait;
use cfm_common::catalog::{ArtistCredit, ScoredMatch};
use cfm_common::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::parse_uuid;
use crate::playback::{CatalogMirror, RecordingView, ReleaseGroupView};

/// Catalog mirror backed by the `artist_credits`, `recordings` and
/// `release_groups` tables
#[derive(Clone)]
pub struct SqliteCatalogMirror {
    pool: SqlitePool,
}

impl SqliteCatalogMirror {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn upsert_artist_credit(
    tx: &mut Transaction<'_, Sqlite>,
    credit: &ArtistCredit,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO artist_credits (id, name, artist_count, ref_count, created)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            artist_count = excluded.artist_count,
            ref_count = excluded.ref_count
        "#,
    )
    .bind(credit.id)
    .bind(&credit.name)
    .bind(credit.artist_count)
    .bind(credit.ref_count)
    .bind(credit.created)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Credit columns of a LEFT JOIN, aliased with the `ac_` prefix
fn credit_from_row(row: &SqliteRow) -> Option<ArtistCredit> {
    let id: Option<i64> = row.get("ac_id");
    let created: Option<DateTime<Utc>> = row.get("ac_created");
    Some(ArtistCredit {
        id: id?,
        name: row.get("ac_name"),
        artist_count: row.get("ac_artist_count"),
        ref_count: row.get("ac_ref_count"),
        created: created?,
    })
}

/// `?, ?, ...` for an IN clause
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn unique_ids(ids: &[Uuid]) -> Vec<String> {
    let mut unique: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    unique.sort();
    unique.dedup();
    unique
}

#[async_trait]
impl CatalogMirror for SqliteCatalogMirror {
    async fn remember(&self, matched: &ScoredMatch) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(credit) = &matched.artist_credit {
            upsert_artist_credit(&mut tx, credit).await?;
        }
        let credit_id = matched.artist_credit.as_ref().map(|c| c.id);

        sqlx::query(
            r#"
            INSERT INTO recordings (guid, title, length, artist_credit_id, last_updated)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(guid) DO UPDATE SET
                title = excluded.title,
                length = excluded.length,
                artist_credit_id = excluded.artist_credit_id,
                last_updated = CURRENT_TIMESTAMP
            "#,
        )
        .bind(matched.recording_id.to_string())
        .bind(&matched.recording_title)
        .bind(matched.length)
        .bind(credit_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO release_groups (guid, title, artist_credit_id, last_updated)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(guid) DO UPDATE SET
                title = excluded.title,
                artist_credit_id = COALESCE(excluded.artist_credit_id, release_groups.artist_credit_id),
                last_updated = CURRENT_TIMESTAMP
            "#,
        )
        .bind(matched.release_group_id.to_string())
        .bind(&matched.release_group_title)
        .bind(credit_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            recording_id = %matched.recording_id,
            release_group_id = %matched.release_group_id,
            "Catalog match mirrored"
        );

        Ok(())
    }

    async fn recordings(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, RecordingView>> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            r#"
            SELECT r.guid, r.title, r.length,
                   ac.id AS ac_id, ac.name AS ac_name, ac.artist_count AS ac_artist_count,
                   ac.ref_count AS ac_ref_count, ac.created AS ac_created
            FROM recordings r
            LEFT JOIN artist_credits ac ON ac.id = r.artist_credit_id
            WHERE r.guid IN ({})
            "#,
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in &ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut views = HashMap::with_capacity(rows.len());
        for row in &rows {
            let guid: String = row.get("guid");
            let id = parse_uuid("recordings.guid", &guid)?;
            views.insert(
                id,
                RecordingView {
                    id,
                    title: row.get("title"),
                    length: row.get("length"),
                    artist_credit: credit_from_row(row),
                },
            );
        }

        Ok(views)
    }

    async fn release_groups(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, ReleaseGroupView>> {
        let ids = unique_ids(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            r#"
            SELECT rg.guid, rg.title,
                   ac.id AS ac_id, ac.name AS ac_name, ac.artist_count AS ac_artist_count,
                   ac.ref_count AS ac_ref_count, ac.created AS ac_created
            FROM release_groups rg
            LEFT JOIN artist_credits ac ON ac.id = rg.artist_credit_id
            WHERE rg.guid IN ({})
            "#,
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in &ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut views = HashMap::with_capacity(rows.len());
        for row in &rows {
            let guid: String = row.get("guid");
            let id = parse_uuid("release_groups.guid", &guid)?;
            views.insert(
                id,
                ReleaseGroupView {
                    id,
                    title: row.get("title"),
                    artist_credit: credit_from_row(row),
                },
            );
        }

        Ok(views)
    }
}
