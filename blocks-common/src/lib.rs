//! # Content Blocks Common Library
//!
//! Shared code for the content-block crates including:
//! - Error type shared by every crate
//! - Settings loading (TOML) and data folder resolution
//! - Validators for CSS classnames, image filenames and upload sizes
//! - Naive media format detection for thumbnail rendering

pub mod config;
pub mod error;
pub mod media;
pub mod validators;

pub use config::BlocksSettings;
pub use error::{Error, Result};
pub use media::MediaFormat;
