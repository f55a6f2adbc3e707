use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use repopulse_core::{NotificationTask, TaskRequest};
use repopulse_engine::DispatchOutcome;

use super::{error_response, ApiError, ApiResult};
use crate::state::ApiState;

pub async fn list_tasks(State(state): State<ApiState>) -> ApiResult<Vec<NotificationTask>> {
    let tasks = state.dispatcher.list().await.map_err(error_response)?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<ApiState>,
    Json(payload): Json<TaskRequest>,
) -> Result<(StatusCode, Json<NotificationTask>), ApiError> {
    let task = state.dispatcher.create(payload).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<ApiState>,
    Path(task_id): Path<String>,
    Json(payload): Json<TaskRequest>,
) -> ApiResult<NotificationTask> {
    let task = state
        .dispatcher
        .update(&task_id, payload)
        .await
        .map_err(error_response)?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<ApiState>,
    Path(task_id): Path<String>,
) -> ApiResult<NotificationTask> {
    let task = state.dispatcher.delete(&task_id).await.map_err(error_response)?;
    Ok(Json(task))
}

/// Run a task now through the same path as its scheduled firing
pub async fn execute_task(
    State(state): State<ApiState>,
    Path(task_id): Path<String>,
) -> ApiResult<DispatchOutcome> {
    let outcome = state
        .dispatcher
        .execute_now(&task_id)
        .await
        .map_err(error_response)?;
    Ok(Json(outcome))
}
