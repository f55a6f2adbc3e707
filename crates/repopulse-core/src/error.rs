use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Invalid lookback window: {0}")]
    InvalidWindow(String),

    #[error("Invalid repository name: {0}")]
    InvalidRepository(String),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Invalid notification task: {0}")]
    InvalidTask(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
