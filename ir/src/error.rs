use thiserror::Error;

/// Errors at the wire-format boundary.
#[derive(Error, Debug)]
pub enum BrilError {
    #[error("malformed program document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
