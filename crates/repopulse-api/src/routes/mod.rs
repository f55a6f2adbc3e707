use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::ApiState};

pub fn create_router(state: ApiState) -> Router {
    let cors = cors_layer(&state.settings.cors_origins);

    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))

        // Repository discovery
        .route("/api/hot-repos", get(handlers::repos::hot_repos))
        .route("/api/search", get(handlers::repos::search))

        // Tracked repositories
        .route("/api/tracked-repos", get(handlers::tracked::tracked_repos))
        .route("/api/track-repo", post(handlers::tracked::track_repo))
        .route("/api/untrack-repo", post(handlers::tracked::untrack_repo))
        .route("/api/refresh-activities", post(handlers::tracked::refresh_activities))
        .route("/api/refresh-repo-activities", post(handlers::tracked::refresh_repo_activities))

        // Summaries
        .route("/api/summary", get(handlers::summary::tracked_summary))

        // Notification tasks
        .route(
            "/api/scheduled-tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/api/scheduled-tasks/:task_id",
            put(handlers::tasks::update_task).delete(handlers::tasks::delete_task),
        )
        .route("/api/scheduled-tasks/:task_id/execute", post(handlers::tasks::execute_task))

        // Add state
        .with_state(state)

        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Permissive unless origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
