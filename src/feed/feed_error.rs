use crate::errors::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a category's dataset could not be retrieved.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FeedError {
    /// Server errors and dropped connections are worth another attempt;
    /// a 404 or a broken file is not.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Network(_) => true,
            FeedError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
