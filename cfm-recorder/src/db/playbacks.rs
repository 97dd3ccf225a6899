//! Playback and now-playing persistence

use async_trait::async_trait;
use cfm_common::pagination::{calculate_pagination, Page, PageRequest};
use cfm_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_optional_uuid, parse_uuid};
use crate::playback::{
    AccumulatedBrokenPlayback, NowPlaying, Playback, PlaybackRepository, RawPlaybackData,
};

const PLAYBACK_COLUMNS: &str = "guid, user_id, timestamp, play_time, source, artists_json, \
     recording_title, release_title, length, disc_number, track_number, \
     recording_id, release_group_id";

const BROKEN_CONDITION: &str = "(recording_id IS NULL OR release_group_id IS NULL)";

/// Playback repository backed by the `playbacks` and `now_playing` tables
#[derive(Clone)]
pub struct SqlitePlaybackRepository {
    pool: SqlitePool,
}

impl SqlitePlaybackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Count and fetch one page of playbacks matching `condition`
    ///
    /// `condition` is a fixed SQL fragment; the optional user id is the
    /// only bound parameter.
    async fn list_where(
        &self,
        condition: &str,
        user_id: Option<Uuid>,
        request: &PageRequest,
    ) -> Result<Page<Playback>> {
        let count_sql = format!("SELECT COUNT(*) FROM playbacks WHERE {}", condition);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(user_id) = user_id {
            count_query = count_query.bind(user_id.to_string());
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let pagination = calculate_pagination(total, request);
        let direction = request.direction.as_sql();
        let select_sql = format!(
            "SELECT {} FROM playbacks WHERE {} ORDER BY timestamp {}, guid {} LIMIT ? OFFSET ?",
            PLAYBACK_COLUMNS, condition, direction, direction
        );

        let mut select_query = sqlx::query(&select_sql);
        if let Some(user_id) = user_id {
            select_query = select_query.bind(user_id.to_string());
        }
        let rows = select_query
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        let items = rows.iter().map(playback_from_row).collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, pagination, total))
    }
}

fn playback_from_row(row: &SqliteRow) -> Result<Playback> {
    let guid: String = row.get("guid");
    let user_id: String = row.get("user_id");
    let artists_json: String = row.get("artists_json");

    Ok(Playback {
        id: parse_uuid("guid", &guid)?,
        user_id: parse_uuid("user_id", &user_id)?,
        timestamp: row.get("timestamp"),
        play_time: row.get("play_time"),
        source: row.get("source"),
        original: RawPlaybackData {
            artists: parse_artists(&artists_json)?,
            recording_title: row.get("recording_title"),
            release_title: row.get("release_title"),
            length: row.get("length"),
            disc_number: row.get("disc_number"),
            track_number: row.get("track_number"),
        },
        recording_id: parse_optional_uuid("recording_id", row.get("recording_id"))?,
        release_group_id: parse_optional_uuid("release_group_id", row.get("release_group_id"))?,
    })
}

fn parse_artists(json: &str) -> Result<Vec<String>> {
    serde_json::from_str(json)
        .map_err(|e| Error::Internal(format!("corrupt artists_json '{}': {}", json, e)))
}

fn optional_uuid_text(id: Option<Uuid>) -> Option<String> {
    id.map(|id| id.to_string())
}

#[async_trait]
impl PlaybackRepository for SqlitePlaybackRepository {
    async fn insert(&self, playback: &Playback) -> Result<()> {
        let raw = &playback.original;
        sqlx::query(
            r#"
            INSERT INTO playbacks (
                guid, user_id, timestamp, play_time, source, artists_json,
                recording_title, release_title, length, disc_number, track_number,
                recording_id, release_group_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(playback.id.to_string())
        .bind(playback.user_id.to_string())
        .bind(playback.timestamp)
        .bind(playback.play_time)
        .bind(&playback.source)
        .bind(serde_json::to_string(&raw.artists)?)
        .bind(&raw.recording_title)
        .bind(&raw.release_title)
        .bind(raw.length)
        .bind(raw.disc_number)
        .bind(raw.track_number)
        .bind(optional_uuid_text(playback.recording_id))
        .bind(optional_uuid_text(playback.release_group_id))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::Conflict(format!("playback {} already exists", playback.id))
            }
            other => Error::Database(other),
        })?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Playback>> {
        let sql = format!("SELECT {} FROM playbacks WHERE guid = ?", PLAYBACK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(playback_from_row).transpose()
    }

    async fn update(&self, playback: &Playback) -> Result<()> {
        let raw = &playback.original;
        let result = sqlx::query(
            r#"
            UPDATE playbacks SET
                timestamp = ?, play_time = ?, source = ?, artists_json = ?,
                recording_title = ?, release_title = ?, length = ?,
                disc_number = ?, track_number = ?,
                recording_id = ?, release_group_id = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE guid = ?
            "#,
        )
        .bind(playback.timestamp)
        .bind(playback.play_time)
        .bind(&playback.source)
        .bind(serde_json::to_string(&raw.artists)?)
        .bind(&raw.recording_title)
        .bind(&raw.release_title)
        .bind(raw.length)
        .bind(raw.disc_number)
        .bind(raw.track_number)
        .bind(optional_uuid_text(playback.recording_id))
        .bind(optional_uuid_text(playback.release_group_id))
        .bind(playback.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("playback {}", playback.id)));
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM playbacks WHERE guid = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self, page: &PageRequest) -> Result<Page<Playback>> {
        self.list_where("1 = 1", None, page).await
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        only_broken: bool,
        page: &PageRequest,
    ) -> Result<Page<Playback>> {
        if only_broken {
            let condition = format!("user_id = ? AND {}", BROKEN_CONDITION);
            self.list_where(&condition, Some(user_id), page).await
        } else {
            self.list_where("user_id = ?", Some(user_id), page).await
        }
    }

    async fn accumulated_broken(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<Page<AccumulatedBrokenPlayback>> {
        let count_sql = format!(
            r#"
            SELECT COUNT(*) FROM (
                SELECT 1 FROM playbacks
                WHERE user_id = ? AND {}
                GROUP BY artists_json, recording_title, release_title
            )
            "#,
            BROKEN_CONDITION
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        let pagination = calculate_pagination(total, page);
        let select_sql = format!(
            r#"
            SELECT artists_json, recording_title, release_title, COUNT(*) AS occurrences
            FROM playbacks
            WHERE user_id = ? AND {}
            GROUP BY artists_json, recording_title, release_title
            ORDER BY occurrences DESC, recording_title ASC, release_title ASC
            LIMIT ? OFFSET ?
            "#,
            BROKEN_CONDITION
        );
        let rows = sqlx::query(&select_sql)
            .bind(user_id.to_string())
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(|row| {
                let artists_json: String = row.get("artists_json");
                Ok(AccumulatedBrokenPlayback {
                    artists: parse_artists(&artists_json)?,
                    recording_title: row.get("recording_title"),
                    release_title: row.get("release_title"),
                    occurrences: row.get("occurrences"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, pagination, total))
    }

    async fn save_now_playing(&self, now_playing: &NowPlaying) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO now_playing (
                user_id, artists_json, recording_title, release_title, expires_at,
                recording_id, release_group_id, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(user_id) DO UPDATE SET
                artists_json = excluded.artists_json,
                recording_title = excluded.recording_title,
                release_title = excluded.release_title,
                expires_at = excluded.expires_at,
                recording_id = excluded.recording_id,
                release_group_id = excluded.release_group_id,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(now_playing.user_id.to_string())
        .bind(serde_json::to_string(&now_playing.artists)?)
        .bind(&now_playing.recording_title)
        .bind(&now_playing.release_title)
        .bind(now_playing.expires_at)
        .bind(optional_uuid_text(now_playing.recording_id))
        .bind(optional_uuid_text(now_playing.release_group_id))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_now_playing(&self, user_id: Uuid) -> Result<Option<NowPlaying>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, artists_json, recording_title, release_title, expires_at,
                   recording_id, release_group_id
            FROM now_playing
            WHERE user_id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let artists_json: String = row.get("artists_json");
                Ok(Some(NowPlaying {
                    user_id,
                    artists: parse_artists(&artists_json)?,
                    recording_title: row.get("recording_title"),
                    release_title: row.get("release_title"),
                    expires_at: row.get("expires_at"),
                    recording_id: parse_optional_uuid("recording_id", row.get("recording_id"))?,
                    release_group_id: parse_optional_uuid(
                        "release_group_id",
                        row.get("release_group_id"),
                    )?,
                }))
            }
            None => Ok(None),
        }
    }
}
