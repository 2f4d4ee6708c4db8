use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CanvasError>;

/// Failures surfaced at the persistence boundary.
///
/// Graph mutations never produce these; they report unknown ids and
/// no-op requests through `bool`/`Option` returns instead.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Home directory not found")]
    NoHomeDirectory,

    #[error("Canvas not found at path: {0}")]
    CanvasNotFound(PathBuf),
}
