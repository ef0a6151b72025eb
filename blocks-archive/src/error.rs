//! Error types for archive validation and extraction

use thiserror::Error;

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Archive error type
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Magic bytes do not match a ZIP container
    #[error("Submitted file is not a ZIP archive file")]
    NotAZip,

    /// ZIP structure could not be read
    #[error("Submitted ZIP file is invalid")]
    InvalidZip(#[source] zip::result::ZipError),

    /// A member failed its integrity check
    #[error("File '{0}' in ZIP archive is corrupted")]
    CorruptedMember(String),

    /// Member could not be read from the archive
    #[error("Error reading '{name}' from archive: {reason}")]
    UnreadableMember { name: String, reason: String },

    /// Bytes are not a structurally valid image
    #[error("Error verifying image: {0}")]
    InvalidImage(String),

    /// Shared validation error (size limit)
    #[error(transparent)]
    Common(#[from] blocks_common::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
