use thiserror::Error;

/// Errors at the crate's boundaries. Scoring itself never fails.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LookupError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid binary dataset: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("recognition cancelled")]
    Cancelled,
}
