//! Playback boundary service
//!
//! Entry point for every playback operation. Owns the matching policy;
//! storage and catalog access go through the injected traits.

use std::collections::HashSet;
use std::sync::Arc;

use cfm_common::catalog::ScoredMatch;
use cfm_common::pagination::{Page, PageRequest};
use cfm_common::time::now_epoch_seconds;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::PlaybackError;
use super::matching::{accept_match, validate_threshold};
use super::model::{
    AccumulatedBrokenPlayback, BatchResultItem, NowPlaying, Playback, RawPlaybackData, User,
    DEFAULT_NOW_PLAYING_SECONDS,
};
use super::patch::PlaybackPatch;
use super::repository::{CatalogMirror, PlaybackRepository};
use super::submission::PlaybackSubmission;
use super::view::{NowPlayingView, PlaybackView};
use crate::mbs::CatalogLookup;

/// Playback service
#[derive(Clone)]
pub struct PlaybackBoundary {
    playbacks: Arc<dyn PlaybackRepository>,
    mirror: Arc<dyn CatalogMirror>,
    lookup: Arc<dyn CatalogLookup>,
}

impl PlaybackBoundary {
    pub fn new(
        playbacks: Arc<dyn PlaybackRepository>,
        mirror: Arc<dyn CatalogMirror>,
        lookup: Arc<dyn CatalogLookup>,
    ) -> Self {
        Self {
            playbacks,
            mirror,
            lookup,
        }
    }

    /// Record a playback, resolving it against the catalog when possible
    ///
    /// A missing or low-scoring match stores the playback as broken. An
    /// unreachable catalog does the same; the record can be re-resolved
    /// later with [`Self::detect_and_update_mb_details`].
    pub async fn create_playback(
        &self,
        user: &User,
        submission: PlaybackSubmission,
        threshold: i32,
    ) -> Result<Playback, PlaybackError> {
        validate_threshold(threshold)?;
        let validated = submission.validate()?;

        if let Some(id) = validated.id {
            if self.playbacks.find(id).await?.is_some() {
                return Err(PlaybackError::Validation(format!(
                    "playback {} already exists",
                    id
                )));
            }
        }

        let mut playback = validated.into_playback(user.id);

        match self.identify(&playback.original, threshold).await {
            Ok(Some(matched)) => {
                playback.resolve(matched.recording_id, matched.release_group_id);
            }
            Ok(None) => {}
            Err(PlaybackError::LookupUnavailable(e)) => {
                warn!(
                    playback_id = %playback.id,
                    error = %e,
                    "Catalog lookup failed, storing playback as broken"
                );
            }
            Err(e) => return Err(e),
        }

        self.playbacks.insert(&playback).await?;

        info!(
            playback_id = %playback.id,
            user_id = %user.id,
            broken = playback.is_broken(),
            "Playback created"
        );

        Ok(playback)
    }

    /// Create several playbacks
    ///
    /// Items succeed or fail independently and in order. A failed item
    /// is reported with `success: false` and stores nothing; the items
    /// after it are still processed.
    pub async fn batch_create_playbacks(
        &self,
        user: &User,
        submissions: Vec<PlaybackSubmission>,
        threshold: i32,
    ) -> Result<Vec<BatchResultItem>, PlaybackError> {
        validate_threshold(threshold)?;

        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(submissions.len());

        for submission in submissions {
            if let Some(id) = submission.id {
                if !seen.insert(id) {
                    debug!(playback_id = %id, "Duplicate id in batch, skipping");
                    results.push(BatchResultItem::skipped());
                    continue;
                }
            }

            match self.create_playback(user, submission, threshold).await {
                Ok(playback) => results.push(BatchResultItem::created(playback.id)),
                Err(PlaybackError::Validation(reason)) => {
                    debug!(reason = %reason, "Skipping invalid batch item");
                    results.push(BatchResultItem::skipped());
                }
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "Batch item failed");
                    results.push(BatchResultItem::skipped());
                }
            }
        }

        info!(
            user_id = %user.id,
            total = results.len(),
            created = results.iter().filter(|r| r.success).count(),
            "Batch import finished"
        );

        Ok(results)
    }

    /// Every playback of every user
    pub async fn find_all(&self, page: &PageRequest) -> Result<Page<Playback>, PlaybackError> {
        Ok(self.playbacks.list_all(page).await?)
    }

    /// Playbacks of `user`, optionally only the broken ones
    pub async fn find_all_for_user(
        &self,
        user: &User,
        only_broken: bool,
        page: &PageRequest,
    ) -> Result<Page<Playback>, PlaybackError> {
        Ok(self
            .playbacks
            .list_for_user(user.id, only_broken, page)
            .await?)
    }

    pub async fn get_playback(&self, id: Uuid, user: &User) -> Result<Playback, PlaybackError> {
        self.load_owned(id, user).await
    }

    /// Permanently remove a playback owned by `user`
    pub async fn delete_playback(&self, id: Uuid, user: &User) -> Result<(), PlaybackError> {
        self.load_owned(id, user).await?;

        if !self.playbacks.delete(id).await? {
            return Err(PlaybackError::NotFound(format!("playback {}", id)));
        }

        info!(playback_id = %id, user_id = %user.id, "Playback deleted");
        Ok(())
    }

    /// Apply a partial update
    ///
    /// Resolved ids are left alone even when titles change; use
    /// [`Self::detect_and_update_mb_details`] to re-resolve.
    pub async fn update_playback(
        &self,
        id: Uuid,
        patch: PlaybackPatch,
        user: &User,
    ) -> Result<Playback, PlaybackError> {
        let current = self.load_owned(id, user).await?;
        if patch.is_empty() {
            return Ok(current);
        }
        let updated = patch.apply(&current)?;

        if updated != current {
            self.playbacks.update(&updated).await?;
            info!(playback_id = %id, user_id = %user.id, "Playback updated");
        } else {
            debug!(playback_id = %id, "Patch left playback unchanged");
        }

        Ok(updated)
    }

    /// Re-run catalog matching on the raw details
    ///
    /// Writes only when an accepted match changes the resolved ids, so
    /// repeated calls leave the store as the first one did.
    pub async fn detect_and_update_mb_details(
        &self,
        id: Uuid,
        threshold: i32,
        user: &User,
    ) -> Result<Playback, PlaybackError> {
        validate_threshold(threshold)?;
        let mut playback = self.load_owned(id, user).await?;

        let Some(matched) = self.identify(&playback.original, threshold).await? else {
            debug!(playback_id = %id, "No match above threshold, playback unchanged");
            return Ok(playback);
        };

        if playback.is_resolved_to(matched.recording_id, matched.release_group_id) {
            return Ok(playback);
        }

        playback.resolve(matched.recording_id, matched.release_group_id);
        self.playbacks.update(&playback).await?;

        info!(
            playback_id = %id,
            recording_id = %matched.recording_id,
            release_group_id = %matched.release_group_id,
            "Playback resolved"
        );

        Ok(playback)
    }

    /// Broken playbacks of `user` grouped by their raw details
    pub async fn accumulated_broken_playbacks(
        &self,
        user: &User,
        page: &PageRequest,
    ) -> Result<Page<AccumulatedBrokenPlayback>, PlaybackError> {
        Ok(self.playbacks.accumulated_broken(user.id, page).await?)
    }

    /// Replace what `user` is currently listening to
    pub async fn set_now_playing(
        &self,
        user: &User,
        submission: PlaybackSubmission,
        threshold: i32,
    ) -> Result<NowPlaying, PlaybackError> {
        validate_threshold(threshold)?;
        let validated = submission.validate()?;

        let started = validated.timestamp.unwrap_or_else(now_epoch_seconds);
        let duration = validated.raw.length.unwrap_or(DEFAULT_NOW_PLAYING_SECONDS);

        let mut now_playing = NowPlaying {
            user_id: user.id,
            artists: validated.raw.artists.clone(),
            recording_title: validated.raw.recording_title.clone(),
            release_title: validated.raw.release_title.clone(),
            expires_at: started.saturating_add(duration),
            recording_id: None,
            release_group_id: None,
        };

        match self.identify(&validated.raw, threshold).await {
            Ok(Some(matched)) => {
                now_playing.recording_id = Some(matched.recording_id);
                now_playing.release_group_id = Some(matched.release_group_id);
            }
            Ok(None) => {}
            Err(PlaybackError::LookupUnavailable(e)) => {
                warn!(user_id = %user.id, error = %e, "Catalog lookup failed for now playing")
            }
            Err(e) => return Err(e),
        }

        self.playbacks.save_now_playing(&now_playing).await?;
        debug!(user_id = %user.id, expires_at = now_playing.expires_at, "Now playing updated");

        Ok(now_playing)
    }

    /// Current entry of `user`; expired entries count as absent
    pub async fn get_now_playing(&self, user: &User) -> Result<NowPlaying, PlaybackError> {
        match self.playbacks.find_now_playing(user.id).await? {
            Some(np) if !np.is_expired(now_epoch_seconds()) => Ok(np),
            _ => Err(PlaybackError::NotFound(format!(
                "nothing playing for user {}",
                user.id
            ))),
        }
    }

    /// Now-playing entry with canonical names once resolved
    pub async fn now_playing_view(
        &self,
        now_playing: &NowPlaying,
    ) -> Result<NowPlayingView, PlaybackError> {
        let (Some(recording_id), Some(release_group_id)) =
            (now_playing.recording_id, now_playing.release_group_id)
        else {
            return Ok(NowPlayingView::from_raw(now_playing));
        };

        let recording = self.mirror.recordings(&[recording_id]).await?.remove(&recording_id);
        let release_group = self
            .mirror
            .release_groups(&[release_group_id])
            .await?
            .remove(&release_group_id);

        Ok(match (recording, release_group) {
            (Some(rec), Some(rg)) => NowPlayingView::from_catalog(now_playing, &rec, &rg),
            _ => NowPlayingView::from_raw(now_playing),
        })
    }

    /// Display projections, using canonical names for resolved playbacks
    pub async fn make_views(
        &self,
        playbacks: &[Playback],
    ) -> Result<Vec<PlaybackView>, PlaybackError> {
        let recording_ids: Vec<Uuid> = playbacks.iter().filter_map(|p| p.recording_id).collect();
        let release_group_ids: Vec<Uuid> =
            playbacks.iter().filter_map(|p| p.release_group_id).collect();

        let recordings = self.mirror.recordings(&recording_ids).await?;
        let release_groups = self.mirror.release_groups(&release_group_ids).await?;

        Ok(playbacks
            .iter()
            .map(|p| {
                let recording = p.recording_id.and_then(|id| recordings.get(&id));
                let release_group = p.release_group_id.and_then(|id| release_groups.get(&id));
                match (recording, release_group) {
                    (Some(rec), Some(rg)) => PlaybackView::from_catalog(p, rec, rg),
                    _ => PlaybackView::from_raw(p),
                }
            })
            .collect())
    }

    async fn load_owned(&self, id: Uuid, user: &User) -> Result<Playback, PlaybackError> {
        let playback = self
            .playbacks
            .find(id)
            .await?
            .ok_or_else(|| PlaybackError::NotFound(format!("playback {}", id)))?;

        if !playback.is_owned_by(user) {
            return Err(PlaybackError::Forbidden(format!(
                "playback {} belongs to another user",
                id
            )));
        }

        Ok(playback)
    }

    /// Accepted match for `raw`, mirrored locally before it is returned
    async fn identify(
        &self,
        raw: &RawPlaybackData,
        threshold: i32,
    ) -> Result<Option<ScoredMatch>, PlaybackError> {
        let candidates = self
            .lookup
            .identify(&raw.identify_query())
            .await?;
        let count = candidates.len();

        let Some(matched) = accept_match(candidates, threshold) else {
            debug!(
                recording = %raw.recording_title,
                candidates = count,
                threshold,
                "No catalog match accepted"
            );
            return Ok(None);
        };

        info!(
            recording = %raw.recording_title,
            recording_id = %matched.recording_id,
            score = matched.score,
            threshold,
            "Catalog match accepted"
        );

        self.mirror.remember(&matched).await?;
        Ok(Some(matched))
    }
}
