//! Error types for ghost-core

use thiserror::Error;

use crate::api::ApiError;

/// Result type alias using ghost-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ghost-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote API error
    #[error(transparent)]
    Api(#[from] ApiError),
}
