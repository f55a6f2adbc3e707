pub mod health;
pub mod repos;
pub mod summary;
pub mod tasks;
pub mod tracked;

use axum::{http::StatusCode, Json};
use repopulse_engine::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Map an engine error onto an HTTP status
pub fn error_response(error: impl Into<Error>) -> ApiError {
    let error = error.into();
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    }
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn status_for(error: &Error) -> StatusCode {
    if error.is_invalid_input() {
        return StatusCode::BAD_REQUEST;
    }
    if error.is_not_found() {
        return StatusCode::NOT_FOUND;
    }

    match error {
        Error::GitHub(e) => match e.root() {
            repopulse_github::Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            repopulse_github::Error::AuthError(_) => StatusCode::UNAUTHORIZED,
            repopulse_github::Error::RepoNotFound(_) => StatusCode::NOT_FOUND,
            repopulse_github::Error::Core(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        },
        Error::Ai(repopulse_ai::Error::RateLimitExceeded) => StatusCode::TOO_MANY_REQUESTS,
        Error::Ai(_) | Error::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
        Error::ConfigurationIncomplete(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let rate_limited = Error::GitHub(repopulse_github::Error::CollectionFailed {
            repository: "a/b".to_string(),
            cause: Box::new(repopulse_github::Error::RateLimited("slow down".to_string())),
        });
        assert_eq!(status_for(&rate_limited), StatusCode::TOO_MANY_REQUESTS);

        let auth = Error::GitHub(repopulse_github::Error::AuthError("bad token".to_string()));
        assert_eq!(status_for(&auth), StatusCode::UNAUTHORIZED);

        let invalid = Error::Core(repopulse_core::Error::InvalidWindow("days".to_string()));
        assert_eq!(status_for(&invalid), StatusCode::BAD_REQUEST);

        let missing = Error::ConfigurationIncomplete("no model".to_string());
        assert_eq!(status_for(&missing), StatusCode::SERVICE_UNAVAILABLE);

        let upstream = Error::GitHub(repopulse_github::Error::ApiError("500".to_string()));
        assert_eq!(status_for(&upstream), StatusCode::BAD_GATEWAY);
    }
}
