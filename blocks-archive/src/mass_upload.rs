//! Mass upload form logic for albums and sliders
//!
//! An album (or slider) form accepts an optional ZIP file. Cleaning the form
//! validates the upload and keeps the archive; once the parent record is saved
//! the pending images are extracted and bound to the parent id.

use crate::error::ArchiveResult;
use crate::extract::{extract_images, BoundChild, ExtractOptions, PendingImage};
use crate::validation::{validate_archive_into, ArchiveHolder, UploadedArchive};
use blocks_common::validators::validate_file_size;
use blocks_common::BlocksSettings;
use std::path::Path;
use tracing::debug;

/// A file as received from an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            data,
        }
    }

    /// Read a file from disk as if it had been uploaded
    pub fn read(path: &Path) -> ArchiveResult<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self { name, data })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Mass upload state for one form submission
#[derive(Debug, Default)]
pub struct MassUpload {
    uploaded_zip: Option<UploadedArchive>,
}

impl ArchiveHolder for MassUpload {
    fn attach_archive(&mut self, archive: UploadedArchive) {
        self.uploaded_zip = Some(archive);
    }
}

impl MassUpload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the uploaded file: size limit first, then ZIP integrity
    pub fn clean(&mut self, file: UploadedFile, settings: &BlocksSettings) -> ArchiveResult<()> {
        validate_file_size(file.size(), settings.massupload_filesize_limit)?;

        debug!("Validating mass upload archive '{}'", file.name);
        validate_archive_into(file.data, self)
    }

    pub fn has_archive(&self) -> bool {
        self.uploaded_zip.is_some()
    }

    /// Extract pending images, consuming the kept archive
    ///
    /// Without a cleaned archive this returns an empty list.
    pub fn take_pending(&mut self, settings: &BlocksSettings, with_label: bool) -> Vec<PendingImage> {
        let options = ExtractOptions::from_settings(settings).with_label(with_label);
        extract_images(self.uploaded_zip.take(), &options, Ok)
    }

    /// Extract pending images and bind them to the saved parent
    pub fn save_children<P: Clone>(
        &mut self,
        parent: P,
        settings: &BlocksSettings,
        with_label: bool,
    ) -> Vec<BoundChild<P>> {
        self.take_pending(settings, with_label)
            .into_iter()
            .map(|pending| pending.bind(parent.clone()))
            .collect()
    }
}
