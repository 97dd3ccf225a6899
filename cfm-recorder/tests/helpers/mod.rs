//! Shared fixtures for cfm-recorder integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cfm_common::catalog::{ArtistCredit, IdentifyQuery, ScoredMatch};
use cfm_common::db::init_memory_database;
use cfm_common::pagination::{Page, PageRequest};
use cfm_recorder::db::{SqliteCatalogMirror, SqlitePlaybackRepository};
use cfm_recorder::mbs::{CatalogLookup, LookupError};
use cfm_recorder::playback::{
    AccumulatedBrokenPlayback, NowPlaying, Playback, PlaybackBoundary, PlaybackRepository,
    PlaybackSubmission, User,
};
use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Scripted catalog lookup
#[derive(Default)]
pub struct FakeCatalog {
    candidates: Mutex<Vec<ScoredMatch>>,
    queued: Mutex<VecDeque<Vec<ScoredMatch>>>,
    unavailable: Mutex<bool>,
    calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, candidates: Vec<ScoredMatch>) {
        *self.candidates.lock().unwrap() = candidates;
        *self.unavailable.lock().unwrap() = false;
    }

    /// Answer for the next call only; later calls fall back to [`Self::answer`]
    pub fn answer_next(&self, candidates: Vec<ScoredMatch>) {
        self.queued.lock().unwrap().push_back(candidates);
    }

    pub fn go_down(&self) {
        *self.unavailable.lock().unwrap() = true;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogLookup for FakeCatalog {
    async fn identify(&self, _query: &IdentifyQuery) -> Result<Vec<ScoredMatch>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.unavailable.lock().unwrap() {
            return Err(LookupError::Unavailable("connection refused".to_string()));
        }
        if let Some(next) = self.queued.lock().unwrap().pop_front() {
            return Ok(next);
        }
        Ok(self.candidates.lock().unwrap().clone())
    }
}

pub struct TestBoundary {
    pub boundary: PlaybackBoundary,
    pub catalog: Arc<FakeCatalog>,
    pub pool: SqlitePool,
}

pub async fn setup_boundary() -> TestBoundary {
    let pool = init_memory_database().await.expect("memory database");
    let catalog = FakeCatalog::new();
    let boundary = PlaybackBoundary::new(
        Arc::new(SqlitePlaybackRepository::new(pool.clone())),
        Arc::new(SqliteCatalogMirror::new(pool.clone())),
        catalog.clone(),
    );
    TestBoundary {
        boundary,
        catalog,
        pool,
    }
}

/// Playback store where another writer gets in between read and write
pub struct RacingPlaybacks {
    inner: SqlitePlaybackRepository,
    /// Delete the row right before each update
    pub delete_before_update: AtomicBool,
    /// Report every playback as missing on lookup
    pub hide_on_find: AtomicBool,
}

impl RacingPlaybacks {
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        Arc::new(Self {
            inner: SqlitePlaybackRepository::new(pool),
            delete_before_update: AtomicBool::new(false),
            hide_on_find: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl PlaybackRepository for RacingPlaybacks {
    async fn insert(&self, playback: &Playback) -> cfm_common::Result<()> {
        self.inner.insert(playback).await
    }

    async fn find(&self, id: Uuid) -> cfm_common::Result<Option<Playback>> {
        if self.hide_on_find.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find(id).await
    }

    async fn update(&self, playback: &Playback) -> cfm_common::Result<()> {
        if self.delete_before_update.load(Ordering::SeqCst) {
            self.inner.delete(playback.id).await?;
        }
        self.inner.update(playback).await
    }

    async fn delete(&self, id: Uuid) -> cfm_common::Result<bool> {
        self.inner.delete(id).await
    }

    async fn list_all(&self, page: &PageRequest) -> cfm_common::Result<Page<Playback>> {
        self.inner.list_all(page).await
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        only_broken: bool,
        page: &PageRequest,
    ) -> cfm_common::Result<Page<Playback>> {
        self.inner.list_for_user(user_id, only_broken, page).await
    }

    async fn accumulated_broken(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> cfm_common::Result<Page<AccumulatedBrokenPlayback>> {
        self.inner.accumulated_broken(user_id, page).await
    }

    async fn save_now_playing(&self, now_playing: &NowPlaying) -> cfm_common::Result<()> {
        self.inner.save_now_playing(now_playing).await
    }

    async fn find_now_playing(&self, user_id: Uuid) -> cfm_common::Result<Option<NowPlaying>> {
        self.inner.find_now_playing(user_id).await
    }
}

pub struct RacingBoundary {
    pub boundary: PlaybackBoundary,
    pub catalog: Arc<FakeCatalog>,
    pub playbacks: Arc<RacingPlaybacks>,
}

pub async fn setup_racing_boundary() -> RacingBoundary {
    let pool = init_memory_database().await.expect("memory database");
    let catalog = FakeCatalog::new();
    let playbacks = RacingPlaybacks::new(pool.clone());
    let boundary = PlaybackBoundary::new(
        playbacks.clone(),
        Arc::new(SqliteCatalogMirror::new(pool)),
        catalog.clone(),
    );
    RacingBoundary {
        boundary,
        catalog,
        playbacks,
    }
}

pub fn user(name: &str) -> User {
    User::new(Uuid::new_v4(), name)
}

pub fn credit(name: &str) -> ArtistCredit {
    ArtistCredit {
        id: 1001,
        name: name.to_string(),
        artist_count: 1,
        ref_count: 12,
        created: Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn candidate(score: i32) -> ScoredMatch {
    ScoredMatch {
        score,
        recording_id: Uuid::new_v4(),
        release_group_id: Uuid::new_v4(),
        recording_title: "Xyz".to_string(),
        release_group_title: "The Album".to_string(),
        length: Some(215),
        artist_credit: Some(credit("Abc")),
    }
}

/// `{artist: "Abc", track: "Xyz"}` on "The Album"
pub fn submission() -> PlaybackSubmission {
    let mut s = PlaybackSubmission::new(vec!["abc".to_string()], "xyz", "the album");
    s.track_length = Some(210);
    s.track_number = Some(2);
    s.timestamp = Some(1_600_000_000);
    s
}
