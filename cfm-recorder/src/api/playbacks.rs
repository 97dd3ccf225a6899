//! Playback endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use cfm_common::pagination::{Page, PageRequest, SortDirection, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::identity::{AdminUser, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::playback::{
    AccumulatedBrokenPlayback, BatchResultItem, Playback, PlaybackPatch, PlaybackSubmission,
    PlaybackView,
};
use crate::AppState;

/// Listing parameters
///
/// Kept flat (no `#[serde(flatten)]`) so numbers parse from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub direction: Option<SortDirection>,
    /// Only playbacks without canonical ids
    #[serde(default)]
    pub broken: bool,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.size.unwrap_or(DEFAULT_PAGE_SIZE))
            .with_direction(self.direction.unwrap_or_default())
    }
}

/// Matching threshold override
#[derive(Debug, Default, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<i32>,
}

impl ThresholdQuery {
    pub(crate) fn resolve(&self, state: &AppState) -> i32 {
        self.threshold.unwrap_or(state.default_threshold)
    }
}

async fn single_view(state: &AppState, playback: Playback) -> ApiResult<PlaybackView> {
    state
        .boundary
        .make_views(std::slice::from_ref(&playback))
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal(format!("no view for playback {}", playback.id)))
}

async fn page_views(state: &AppState, page: Page<Playback>) -> ApiResult<Page<PlaybackView>> {
    let views = state.boundary.make_views(&page.items).await?;
    let mut views = views.into_iter();
    Ok(page.map(|p| views.next().unwrap_or_else(|| PlaybackView::from_raw(&p))))
}

/// POST /api/v1/playbacks
pub async fn create_playback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(threshold): ApiQuery<ThresholdQuery>,
    ApiJson(submission): ApiJson<PlaybackSubmission>,
) -> ApiResult<(StatusCode, Json<PlaybackView>)> {
    let playback = state
        .boundary
        .create_playback(&user, submission, threshold.resolve(&state))
        .await?;
    let view = single_view(&state, playback).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// POST /api/v1/playbacks/batch
pub async fn batch_create_playbacks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(threshold): ApiQuery<ThresholdQuery>,
    ApiJson(submissions): ApiJson<Vec<PlaybackSubmission>>,
) -> ApiResult<Json<Vec<BatchResultItem>>> {
    let results = state
        .boundary
        .batch_create_playbacks(&user, submissions, threshold.resolve(&state))
        .await?;
    Ok(Json(results))
}

/// GET /api/v1/playbacks
pub async fn list_playbacks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Page<PlaybackView>>> {
    let page = state
        .boundary
        .find_all_for_user(&user, query.broken, &query.page_request())
        .await?;
    Ok(Json(page_views(&state, page).await?))
}

/// GET /api/v1/playbacks/all
pub async fn list_all_playbacks(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Page<PlaybackView>>> {
    let page = state.boundary.find_all(&query.page_request()).await?;
    Ok(Json(page_views(&state, page).await?))
}

/// GET /api/v1/playbacks/broken/accumulated
pub async fn accumulated_broken_playbacks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Page<AccumulatedBrokenPlayback>>> {
    let page = state
        .boundary
        .accumulated_broken_playbacks(&user, &query.page_request())
        .await?;
    Ok(Json(page))
}

/// GET /api/v1/playbacks/:id
pub async fn get_playback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<PlaybackView>> {
    let playback = state.boundary.get_playback(id, &user).await?;
    Ok(Json(single_view(&state, playback).await?))
}

/// PATCH /api/v1/playbacks/:id
pub async fn update_playback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<PlaybackPatch>,
) -> ApiResult<Json<PlaybackView>> {
    let playback = state.boundary.update_playback(id, patch, &user).await?;
    Ok(Json(single_view(&state, playback).await?))
}

/// DELETE /api/v1/playbacks/:id
pub async fn delete_playback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.boundary.delete_playback(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/playbacks/:id/detect
pub async fn detect_mb_details(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(threshold): ApiQuery<ThresholdQuery>,
) -> ApiResult<Json<PlaybackView>> {
    let playback = state
        .boundary
        .detect_and_update_mb_details(id, threshold.resolve(&state), &user)
        .await?;
    Ok(Json(single_view(&state, playback).await?))
}

/// Build playback routes
pub fn playback_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/playbacks", post(create_playback).get(list_playbacks))
        .route("/api/v1/playbacks/batch", post(batch_create_playbacks))
        .route("/api/v1/playbacks/all", get(list_all_playbacks))
        .route(
            "/api/v1/playbacks/broken/accumulated",
            get(accumulated_broken_playbacks),
        )
        .route(
            "/api/v1/playbacks/:id",
            get(get_playback).patch(update_playback).delete(delete_playback),
        )
        .route("/api/v1/playbacks/:id/detect", post(detect_mb_details))
}
