use axum::{
    extract::{Query, State},
    Json,
};
use repopulse_core::UpdateReport;
use repopulse_engine::Error;
use serde::Serialize;

use super::{error_response, tracked::DaysQuery, ApiResult};
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub days: u32,
    pub repositories: usize,
    pub summary: String,
}

/// Model-written report over the tracked repositories' latest snapshots
pub async fn tracked_summary(
    State(state): State<ApiState>,
    Query(query): Query<DaysQuery>,
) -> ApiResult<SummaryResponse> {
    let Some(service) = &state.summary else {
        return Err(error_response(Error::ConfigurationIncomplete(
            "no language model configured".to_string(),
        )));
    };

    let days = state.lookback(query.days).map_err(error_response)?;
    let reports: Vec<UpdateReport> = state
        .tracker
        .tracked_views(days)
        .await
        .map_err(error_response)?
        .into_iter()
        .map(|view| UpdateReport {
            repository: view.full_name,
            has_updates: view.has_updates,
            activities: view.activities,
        })
        .collect();

    let summary = service
        .tracked_repos_summary(&reports)
        .await
        .map_err(error_response)?;

    Ok(Json(SummaryResponse {
        days,
        repositories: reports.len(),
        summary,
    }))
}
