//! Naive media format detection
//!
//! Formats are guessed from the filename extension only, so renderers can pick
//! a thumbnail format without opening the file on every render. Uploads are
//! expected to have been verified beforehand.

use std::fmt;
use thiserror::Error;

/// Image formats known to the thumbnail renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
}

impl MediaFormat {
    /// Every format name accepted as an explicit thumbnail format
    pub const AVAILABLE: [MediaFormat; 4] = [
        MediaFormat::Png,
        MediaFormat::Jpeg,
        MediaFormat::Gif,
        MediaFormat::Svg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "JPEG",
            MediaFormat::Png => "PNG",
            MediaFormat::Gif => "GIF",
            MediaFormat::Svg => "SVG",
        }
    }

    /// Parse a format name, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        Self::AVAILABLE
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(name))
    }

    /// Vector formats never get a bitmap thumbnail
    pub fn is_vector(&self) -> bool {
        matches!(self, MediaFormat::Svg)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thumbnail format negotiation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaFormatError {
    #[error("Required format '{required}' does not match available formats: {available}")]
    InvalidFormat { required: String, available: String },

    #[error("Incompatible required format (Bitmap) with source format (SVG).")]
    IncompatibleSvgToBitmap,

    #[error("Incompatible required format (SVG) with source format (Bitmap).")]
    IncompatibleBitmapToSvg,
}

/// Outcome of thumbnail format negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFormat {
    /// Serve the source file as-is (SVG sources)
    Passthrough,
    /// Render a bitmap thumbnail in this format
    Render(MediaFormat),
}

/// Guess a media format from a filename extension
pub fn media_format(filename: &str) -> Option<MediaFormat> {
    let (_, ext) = filename.rsplit_once('.')?;

    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some(MediaFormat::Jpeg),
        "png" => Some(MediaFormat::Png),
        "gif" => Some(MediaFormat::Gif),
        "svg" => Some(MediaFormat::Svg),
        _ => None,
    }
}

/// Decide which thumbnail format to use for `filename`
///
/// `required` is either `auto` (use the source format) or an explicit format
/// name. An SVG can not be turned into a bitmap and a bitmap can not be turned
/// into an SVG. A source with an unknown extension under `auto` falls back to a
/// passthrough since there is nothing sensible to render.
pub fn resolve_thumbnail_format(
    filename: &str,
    required: &str,
) -> Result<ThumbnailFormat, MediaFormatError> {
    let source = media_format(filename);
    let source_is_svg = source.map(|f| f.is_vector()).unwrap_or(false);

    if required.is_empty() || required.eq_ignore_ascii_case("auto") {
        return Ok(match source {
            Some(format) if !format.is_vector() => ThumbnailFormat::Render(format),
            _ => ThumbnailFormat::Passthrough,
        });
    }

    let format = MediaFormat::from_name(required).ok_or_else(|| {
        MediaFormatError::InvalidFormat {
            required: required.to_lowercase(),
            available: MediaFormat::AVAILABLE
                .iter()
                .map(|f| f.as_str().to_lowercase())
                .collect::<Vec<_>>()
                .join(", "),
        }
    })?;

    match (format.is_vector(), source_is_svg) {
        (true, true) => Ok(ThumbnailFormat::Passthrough),
        (true, false) => Err(MediaFormatError::IncompatibleBitmapToSvg),
        (false, true) => Err(MediaFormatError::IncompatibleSvgToBitmap),
        (false, false) => Ok(ThumbnailFormat::Render(format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_format_from_extension() {
        assert_eq!(media_format("foo.jpg"), Some(MediaFormat::Jpeg));
        assert_eq!(media_format("foo.JPEG"), Some(MediaFormat::Jpeg));
        assert_eq!(media_format("path/to/foo.png"), Some(MediaFormat::Png));
        assert_eq!(media_format("foo.gif"), Some(MediaFormat::Gif));
        assert_eq!(media_format("foo.svg"), Some(MediaFormat::Svg));
        assert_eq!(media_format("foo.txt"), None);
        assert_eq!(media_format("foo"), None);
    }

    #[test]
    fn test_auto_uses_source_format() {
        assert_eq!(
            resolve_thumbnail_format("foo.png", "auto"),
            Ok(ThumbnailFormat::Render(MediaFormat::Png))
        );
        assert_eq!(
            resolve_thumbnail_format("foo.jpg", ""),
            Ok(ThumbnailFormat::Render(MediaFormat::Jpeg))
        );
        assert_eq!(
            resolve_thumbnail_format("foo.svg", "AUTO"),
            Ok(ThumbnailFormat::Passthrough)
        );
    }

    #[test]
    fn test_explicit_format() {
        assert_eq!(
            resolve_thumbnail_format("foo.png", "jpeg"),
            Ok(ThumbnailFormat::Render(MediaFormat::Jpeg))
        );
        assert_eq!(
            resolve_thumbnail_format("foo.svg", "SVG"),
            Ok(ThumbnailFormat::Passthrough)
        );
    }

    #[test]
    fn test_incompatible_formats() {
        assert_eq!(
            resolve_thumbnail_format("foo.png", "svg"),
            Err(MediaFormatError::IncompatibleBitmapToSvg)
        );
        assert_eq!(
            resolve_thumbnail_format("foo.svg", "png"),
            Err(MediaFormatError::IncompatibleSvgToBitmap)
        );
    }

    #[test]
    fn test_unknown_format() {
        let err = resolve_thumbnail_format("foo.png", "webp").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required format 'webp' does not match available formats: png, jpeg, gif, svg"
        );
    }
}
