use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for visaid-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Annotation document error: {0}")]
    Annotation(String),

    #[error("Timeline contract violation: {0}")]
    Contract(String),

    #[error("Command '{0}' failed: {1}")]
    CommandFailed(String, String),

    #[error("ffprobe failed for {path}: {message}")]
    FfprobeFailed { path: PathBuf, message: String },

    #[error("No video stream found in {0}")]
    NoVideoStream(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for visaid-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;
