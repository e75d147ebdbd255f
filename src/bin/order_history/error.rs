//! Error types for the order history tracker.

use termmax_tools::error::DescriptorError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("Interface descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
