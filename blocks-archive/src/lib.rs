//! Mass upload of images from a ZIP archive
//!
//! The pipeline is split in three steps:
//! 1. [`validation`]: size limit and ZIP integrity checks on the uploaded file
//! 2. [`extract`]: every valid image of the archive becomes a [`PendingImage`]
//! 3. [`PendingImage::bind`]: pending images are bound to their parent once the
//!    parent has been saved and has an id
//!
//! [`MassUpload`] wires these steps the way an album or slider edit form does.

pub mod error;
pub mod extract;
pub mod mass_upload;
pub mod structure;
pub mod validation;

pub use error::{ArchiveError, ArchiveResult};
pub use extract::{extract_images, verify_image, BoundChild, ExtractOptions, PendingImage};
pub use mass_upload::{MassUpload, UploadedFile};
pub use structure::check_structure;
pub use validation::{validate_archive, validate_archive_into, ArchiveHolder, UploadedArchive};
