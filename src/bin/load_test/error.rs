//! Error types for the load test.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
