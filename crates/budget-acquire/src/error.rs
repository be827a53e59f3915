use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("could not repair markup: {0}")]
    Repair(String),

    #[error("malformed table row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("discovery returned no entries: {0}")]
    DiscoveryEmpty(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AcquireError>;
