use axum::{
    extract::{Query, State},
    Json,
};
use repopulse_engine::{RefreshResult, TrackedView};
use serde::{Deserialize, Serialize};

use super::{error_response, ApiResult};
use crate::state::ApiState;

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RepoRequest {
    pub repo_full_name: String,
    #[serde(default)]
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub results: Vec<RefreshResult>,
}

/// Tracked repositories with activity from their latest snapshots
pub async fn tracked_repos(
    State(state): State<ApiState>,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Vec<TrackedView>> {
    let days = state.lookback(query.days).map_err(error_response)?;
    let views = state.tracker.tracked_views(days).await.map_err(error_response)?;
    Ok(Json(views))
}

pub async fn track_repo(
    State(state): State<ApiState>,
    Json(payload): Json<RepoRequest>,
) -> ApiResult<MessageResponse> {
    let added = state
        .tracker
        .track(&payload.repo_full_name)
        .await
        .map_err(error_response)?;

    let message = if added {
        "Repository tracked successfully"
    } else {
        "Repository is already tracked"
    };
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

pub async fn untrack_repo(
    State(state): State<ApiState>,
    Json(payload): Json<RepoRequest>,
) -> ApiResult<MessageResponse> {
    let removed = state
        .tracker
        .untrack(&payload.repo_full_name)
        .await
        .map_err(error_response)?;

    let message = if removed {
        "Repository untracked successfully"
    } else {
        "Repository was not tracked"
    };
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

/// Refresh every tracked repository; per-repository failures are reported, not fatal
pub async fn refresh_activities(
    State(state): State<ApiState>,
    Query(query): Query<DaysQuery>,
) -> ApiResult<RefreshResponse> {
    let days = state.lookback(query.days).map_err(error_response)?;
    let results = state.tracker.refresh_all(days).await.map_err(error_response)?;

    let failed = results.iter().filter(|r| !r.success).count();
    Ok(Json(RefreshResponse {
        message: format!(
            "Refreshed {} of {} repositories",
            results.len() - failed,
            results.len()
        ),
        results,
    }))
}

pub async fn refresh_repo_activities(
    State(state): State<ApiState>,
    Json(payload): Json<RepoRequest>,
) -> ApiResult<RefreshResult> {
    let days = state.lookback(payload.days).map_err(error_response)?;
    let result = state
        .tracker
        .refresh_repo(&payload.repo_full_name, days)
        .await
        .map_err(error_response)?;
    Ok(Json(result))
}
