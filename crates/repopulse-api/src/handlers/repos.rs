use axum::{
    extract::{Query, State},
    Json,
};
use repopulse_core::RepoSummary;
use repopulse_engine::DEFAULT_SEARCH_LIMIT;
use serde::Deserialize;

use super::{error_response, ApiResult};
use crate::state::ApiState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<u8>,
}

/// Trending repositories, fetched live; the latest capture stands in when GitHub fails
pub async fn hot_repos(State(state): State<ApiState>) -> ApiResult<Vec<RepoSummary>> {
    match state.trending.trending().await {
        Ok(repos) => {
            tracing::info!("Returning {} trending repositories", repos.len());
            Ok(Json(repos))
        }
        Err(e) => match state.trending.latest_capture().await {
            Ok(Some(capture)) => {
                tracing::warn!(
                    captured_at = %capture.captured_at,
                    "Live trending fetch failed, serving last capture: {}",
                    e
                );
                Ok(Json(capture.repositories))
            }
            _ => Err(error_response(e)),
        },
    }
}

pub async fn search(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<RepoSummary>> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, 100);
    let repos = state.trending.search(&query.q, limit).await.map_err(error_response)?;
    Ok(Json(repos))
}
