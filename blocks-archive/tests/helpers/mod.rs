//! Fixture builders for archive tests
//!
//! Archives and images are generated in memory so tests do not depend on
//! binary fixture files.

#![allow(dead_code)]

use image::{ImageFormat, RgbImage};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Encode a small solid image in the given format
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]))
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    image_bytes(width, height, ImageFormat::Jpeg)
}

/// Build a ZIP archive with members written in the given order
///
/// Names ending with `/` are added as directories.
pub fn zip_archive(members: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, content) in members {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Equivalent of a "basic" album archive: four images in one folder
pub fn basic_archive() -> Vec<u8> {
    zip_archive(&[
        ("basic/", Vec::new()),
        ("basic/120x120.png", png(120, 120)),
        ("basic/107x107.png", png(107, 107)),
        ("basic/120x100.jpg", jpeg(120, 100)),
        ("basic/120x100.png", png(120, 100)),
    ])
}
