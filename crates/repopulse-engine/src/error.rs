use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Configuration incomplete: {0}")]
    ConfigurationIncomplete(String),

    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    GitHub(#[from] repopulse_github::Error),

    #[error(transparent)]
    Store(#[from] repopulse_store::Error),

    #[error(transparent)]
    Ai(#[from] repopulse_ai::Error),

    #[error(transparent)]
    Core(#[from] repopulse_core::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Message error: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Store(repopulse_store::Error::TaskNotFound(_)))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::Core(
                repopulse_core::Error::InvalidTask(_)
                    | repopulse_core::Error::InvalidRepository(_)
                    | repopulse_core::Error::InvalidQuery(_)
                    | repopulse_core::Error::InvalidWindow(_)
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
