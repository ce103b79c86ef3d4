use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("URL is required")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProbeError {
    /// Whether the error was caused by the caller's input rather than by the probe itself
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProbeError::MissingUrl | ProbeError::InvalidUrl(_) | ProbeError::InvalidRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
