//! Image container structure checks
//!
//! Walks the container layout of PNG, JPEG and GIF files up to their end
//! marker without decoding any pixel data. A file cut anywhere before its end
//! marker is rejected.

use crate::error::{ArchiveError, ArchiveResult};
use crc32fast::Hasher as Crc32Hasher;
use image::ImageFormat;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Check the whole container structure of an image in `format`
///
/// Formats without a structure walker are accepted as they are.
pub fn check_structure(data: &[u8], format: ImageFormat) -> ArchiveResult<()> {
    match format {
        ImageFormat::Png => check_png(data),
        ImageFormat::Jpeg => check_jpeg(data),
        ImageFormat::Gif => check_gif(data),
        _ => Ok(()),
    }
}

fn invalid(message: &str) -> ArchiveError {
    ArchiveError::InvalidImage(message.to_string())
}

fn read_u16_be(data: &[u8], pos: usize) -> Option<usize> {
    let bytes = data.get(pos..pos + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]) as usize)
}

fn read_u32_be(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// PNG: signature, then chunks `length | type | data | crc` until `IEND`
fn check_png(data: &[u8]) -> ArchiveResult<()> {
    if !data.starts_with(&PNG_SIGNATURE) {
        return Err(invalid("bad PNG signature"));
    }

    let mut pos = PNG_SIGNATURE.len();
    loop {
        let length = read_u32_be(data, pos).ok_or_else(|| invalid("truncated PNG chunk header"))?
            as usize;
        let body_start = pos + 4;
        let body_end = body_start
            .checked_add(4 + length)
            .ok_or_else(|| invalid("PNG chunk length overflow"))?;

        let body = data
            .get(body_start..body_end)
            .ok_or_else(|| invalid("truncated PNG chunk"))?;
        let stored_crc = read_u32_be(data, body_end).ok_or_else(|| invalid("truncated PNG chunk"))?;

        let mut hasher = Crc32Hasher::new();
        hasher.update(body);
        if hasher.finalize() != stored_crc {
            return Err(invalid("PNG chunk CRC mismatch"));
        }

        if &body[..4] == b"IEND" {
            return Ok(());
        }

        pos = body_end + 4;
    }
}

/// JPEG: segments from `SOI` to `EOI`, skipping entropy coded scan data
fn check_jpeg(data: &[u8]) -> ArchiveResult<()> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return Err(invalid("missing JPEG start of image"));
    }

    let mut pos = 2;
    loop {
        if data.get(pos) != Some(&0xFF) {
            return Err(invalid("truncated JPEG segment"));
        }

        // Fill bytes
        while data.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }

        let marker = *data
            .get(pos + 1)
            .ok_or_else(|| invalid("truncated JPEG segment"))?;
        pos += 2;

        match marker {
            0xD9 => return Ok(()),
            0x01 | 0xD0..=0xD7 => continue,
            _ => {}
        }

        let length = read_u16_be(data, pos).ok_or_else(|| invalid("truncated JPEG segment"))?;
        if length < 2 || pos + length > data.len() {
            return Err(invalid("truncated JPEG segment"));
        }
        pos += length;

        if marker == 0xDA {
            pos = skip_scan_data(data, pos).ok_or_else(|| invalid("truncated JPEG scan data"))?;
        }
    }
}

/// Position of the first marker after scan data
///
/// Stuffed `FF 00` bytes and restart markers belong to the scan.
fn skip_scan_data(data: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let offset = data.get(pos..)?.iter().position(|&b| b == 0xFF)?;
        pos += offset;

        match *data.get(pos + 1)? {
            0x00 | 0xD0..=0xD7 | 0xFF => pos += 1,
            _ => return Some(pos),
        }
    }
}

/// GIF: header, optional global color table, then blocks until the `;` trailer
fn check_gif(data: &[u8]) -> ArchiveResult<()> {
    if !(data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a")) {
        return Err(invalid("bad GIF signature"));
    }

    let flags = *data.get(10).ok_or_else(|| invalid("truncated GIF header"))?;
    let mut pos = 13 + color_table_size(flags);

    loop {
        match data.get(pos) {
            Some(0x3B) => return Ok(()),
            Some(0x21) => {
                pos = skip_sub_blocks(data, pos + 2)
                    .ok_or_else(|| invalid("truncated GIF extension"))?;
            }
            Some(0x2C) => {
                let flags = *data
                    .get(pos + 9)
                    .ok_or_else(|| invalid("truncated GIF image descriptor"))?;
                // Descriptor, local color table, LZW minimum code size
                pos += 10 + color_table_size(flags) + 1;
                pos = skip_sub_blocks(data, pos).ok_or_else(|| invalid("truncated GIF image data"))?;
            }
            Some(_) => return Err(invalid("unknown GIF block")),
            None => return Err(invalid("missing GIF trailer")),
        }
    }
}

fn color_table_size(flags: u8) -> usize {
    if flags & 0x80 == 0 {
        0
    } else {
        3 * (1 << ((flags & 0x07) + 1))
    }
}

/// Position right after a sub-block chain and its zero terminator
fn skip_sub_blocks(data: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let size = *data.get(pos)? as usize;
        pos += 1;
        if size == 0 {
            return Some(pos);
        }
        pos += size;
    }
}
