use std::result;
use thiserror::Error;

pub type Result<T> = result::Result<T, AppError>;

/// Application-wide error enum
///
/// The command runner and the dependency validator never produce these; their
/// failures are folded into `ProcessResult` and `ProbeFailure` instead.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("No download directory selected")]
    MissingDownloadDir,

    #[error("Invalid extra arguments: {0}")]
    InvalidArgs(String),

    #[error("Missing dependency: {0}")]
    Dependency(String),
}
