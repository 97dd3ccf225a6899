//! Now-playing endpoints

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::identity::CurrentUser;
use crate::api::playbacks::ThresholdQuery;
use crate::error::ApiResult;
use crate::playback::{NowPlayingView, PlaybackSubmission};
use crate::AppState;

/// PUT /api/v1/now-playing
pub async fn set_now_playing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(threshold): ApiQuery<ThresholdQuery>,
    ApiJson(submission): ApiJson<PlaybackSubmission>,
) -> ApiResult<Json<NowPlayingView>> {
    let now_playing = state
        .boundary
        .set_now_playing(&user, submission, threshold.resolve(&state))
        .await?;
    Ok(Json(state.boundary.now_playing_view(&now_playing).await?))
}

/// GET /api/v1/now-playing
pub async fn get_now_playing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<NowPlayingView>> {
    let now_playing = state.boundary.get_now_playing(&user).await?;
    Ok(Json(state.boundary.now_playing_view(&now_playing).await?))
}

pub fn now_playing_routes() -> Router<AppState> {
    Router::new().route(
        "/api/v1/now-playing",
        get(get_now_playing).put(set_now_playing),
    )
}
