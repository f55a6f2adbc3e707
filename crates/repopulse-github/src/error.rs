use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error: {0}")]
    ApiError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Collection failed for {repository}: {cause}")]
    CollectionFailed {
        repository: String,
        #[source]
        cause: Box<Error>,
    },

    #[error("Octocrab error: {0}")]
    Octocrab(#[from] octocrab::Error),

    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] repopulse_core::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// The underlying failure, looking through `CollectionFailed`
    pub fn root(&self) -> &Error {
        match self {
            Error::CollectionFailed { cause, .. } => cause.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
