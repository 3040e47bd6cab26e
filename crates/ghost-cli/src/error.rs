use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ghost_core::Error),
    #[error(transparent)]
    Api(#[from] ghost_core::api::ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Nothing to send: provide a message or at least one --file")]
    EmptyShare,
    #[error("Failed to read {path}: {source}")]
    ReadFile { path: String, source: io::Error },
    #[error("{0}")]
    InvalidField(String),
    #[error("{count} upload(s) failed: {details}")]
    UploadsFailed { count: usize, details: String },
    #[error("Share link was not created: {0}")]
    ShareRejected(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
