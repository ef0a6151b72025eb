//! Common error types for content blocks

use thiserror::Error;

/// Common result type for content block operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across content block crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Value is not a usable CSS classname
    #[error("Invalid CSS classname: {0:?}")]
    InvalidClassname(String),

    /// Uploaded file is bigger than the configured limit
    #[error("Please keep filesize under {limit}. Current filesize {size}")]
    SizeExceeded { limit: String, size: String },
}
