//! Image extraction from a validated archive
//!
//! Extraction never fails as a whole: a member that can not be read, is not a
//! valid image, or that the caller factory refuses is logged and skipped. A
//! missing archive simply means there is nothing to extract.

use crate::error::{ArchiveError, ArchiveResult};
use crate::structure::check_structure;
use crate::validation::UploadedArchive;
use blocks_common::validators::is_valid_image_filename;
use blocks_common::BlocksSettings;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::{debug, error, info};

/// Extraction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Image extensions to extract, compared case-insensitively
    pub allowed_extensions: Vec<String>,
    /// Fill [`PendingImage::label`] with the member path
    pub with_label: bool,
}

impl ExtractOptions {
    pub fn from_settings(settings: &BlocksSettings) -> Self {
        Self {
            allowed_extensions: settings.allowed_image_extensions.clone(),
            with_label: false,
        }
    }

    pub fn with_label(mut self, with_label: bool) -> Self {
        self.with_label = with_label;
        self
    }
}

/// An image extracted from an archive, not yet linked to any parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    /// Full member path inside the archive
    pub member_name: String,
    /// Base name of the member, used as the stored file name
    pub file_name: String,
    pub data: Vec<u8>,
    pub format: ImageFormat,
    /// Member path when labels were requested
    pub label: Option<String>,
}

impl PendingImage {
    /// Bind this image to its saved parent
    pub fn bind<P>(self, parent: P) -> BoundChild<P> {
        BoundChild {
            parent,
            file_name: self.file_name,
            data: self.data,
            label: self.label,
        }
    }
}

/// A child record ready to be inserted under `parent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundChild<P> {
    pub parent: P,
    pub file_name: String,
    pub data: Vec<u8>,
    pub label: Option<String>,
}

/// Verify bytes are a structurally valid image without decoding pixels
///
/// **Algorithm:**
/// 1. Magic bytes must announce an image
/// 2. The format decoder parses headers to read non-zero dimensions
/// 3. The container structure is walked up to its end marker, so a file cut
///    anywhere in its image data is rejected
///
/// Full decoding is never done so a crafted image can not be used to exhaust
/// memory.
pub fn verify_image(data: &[u8]) -> ArchiveResult<ImageFormat> {
    if !infer::is_image(data) {
        return Err(ArchiveError::InvalidImage(
            "content is not a known image type".to_string(),
        ));
    }

    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let format = reader
        .format()
        .ok_or_else(|| ArchiveError::InvalidImage("unsupported image format".to_string()))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ArchiveError::InvalidImage(e.to_string()))?;

    if width == 0 || height == 0 {
        return Err(ArchiveError::InvalidImage(format!(
            "empty image dimensions {}x{}",
            width, height
        )));
    }

    check_structure(data, format)?;

    Ok(format)
}

/// Extract every valid image of an archive through `factory`
///
/// **Algorithm:**
/// 1. No archive: return an empty list
/// 2. Walk member names in lexicographic order
/// 3. Skip directories and names without an allowed image extension
/// 4. Read the member, skipping unreadable and empty ones
/// 5. Verify the image headers, skipping invalid images
/// 6. Build a [`PendingImage`] and hand it to `factory`; a factory error skips
///    the member
///
/// The archive is consumed and released before returning. Output order is the
/// member name order.
pub fn extract_images<C, F>(
    archive: Option<UploadedArchive>,
    options: &ExtractOptions,
    mut factory: F,
) -> Vec<C>
where
    F: FnMut(PendingImage) -> anyhow::Result<C>,
{
    let mut archive = match archive {
        Some(archive) => archive,
        None => {
            debug!("No archive given, nothing to extract");
            return Vec::new();
        }
    };

    let mut items = Vec::new();

    for name in archive.sorted_names() {
        if name.ends_with('/') || !is_valid_image_filename(&name, &options.allowed_extensions) {
            debug!("Skipping archive member '{}'", name);
            continue;
        }

        let data = match archive.read_member(&name) {
            Ok(data) => data,
            Err(e) => {
                error!("{}", e);
                continue;
            }
        };

        if data.is_empty() {
            debug!("Skipping empty archive member '{}'", name);
            continue;
        }

        let format = match verify_image(&data) {
            Ok(format) => format,
            Err(e) => {
                error!("{} ({})", e, name);
                continue;
            }
        };

        let pending = PendingImage {
            file_name: base_name(&name).to_string(),
            label: options.with_label.then(|| name.clone()),
            member_name: name,
            data,
            format,
        };

        match factory(pending) {
            Ok(item) => items.push(item),
            Err(e) => error!("Error creating item from file: {}", e),
        }
    }

    info!(
        "Extracted {} images from archive of {} members",
        items.len(),
        archive.len()
    );

    items
}

fn base_name(member_name: &str) -> &str {
    member_name.rsplit('/').next().unwrap_or(member_name)
}
