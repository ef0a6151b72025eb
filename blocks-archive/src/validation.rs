//! Uploaded ZIP archive validation

use crate::error::{ArchiveError, ArchiveResult};
use std::io::{self, Cursor, Read};
use tracing::{debug, trace, warn};
use zip::ZipArchive;

/// A validated ZIP archive kept in memory for the duration of one upload
///
/// The archive is released when this value is dropped.
pub struct UploadedArchive {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl UploadedArchive {
    /// Number of members, directories included
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Member names in lexicographic order
    ///
    /// Order never depends on the archive central directory, so extraction is
    /// reproducible whatever tool created the archive.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Read a member fully
    pub fn read_member(&mut self, name: &str) -> ArchiveResult<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|e| ArchiveError::UnreadableMember {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let mut buffer = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buffer)
            .map_err(|e| ArchiveError::UnreadableMember {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(buffer)
    }
}

impl std::fmt::Debug for UploadedArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedArchive")
            .field("members", &self.archive.len())
            .finish()
    }
}

impl Drop for UploadedArchive {
    fn drop(&mut self) {
        trace!("Releasing uploaded archive ({} members)", self.archive.len());
    }
}

/// Something able to keep a validated archive for a later step
///
/// Validation already opened and read the whole archive; keeping it avoids
/// opening it again when extracting.
pub trait ArchiveHolder {
    fn attach_archive(&mut self, archive: UploadedArchive);
}

/// Validate an uploaded ZIP archive
///
/// **Algorithm:**
/// 1. Sniff magic bytes, rejecting anything that is not a ZIP container
/// 2. Open the archive structure (central directory)
/// 3. Read every member to the end so its CRC is checked, the first corrupted
///    member name is reported
pub fn validate_archive(data: Vec<u8>) -> ArchiveResult<UploadedArchive> {
    if !infer::archive::is_zip(&data) {
        debug!("Upload rejected, magic bytes are not ZIP");
        return Err(ArchiveError::NotAZip);
    }

    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(|e| {
        warn!("Invalid ZIP archive: {}", e);
        ArchiveError::InvalidZip(e)
    })?;

    for index in 0..archive.len() {
        let mut member = archive.by_index(index).map_err(ArchiveError::InvalidZip)?;
        let name = member.name().to_string();

        if let Err(e) = io::copy(&mut member, &mut io::sink()) {
            warn!("Corrupted member '{}' in ZIP archive: {}", name, e);
            return Err(ArchiveError::CorruptedMember(name));
        }
    }

    debug!("ZIP archive validated with {} members", archive.len());

    Ok(UploadedArchive { archive })
}

/// Validate an archive then attach it to `holder`
pub fn validate_archive_into<H>(data: Vec<u8>, holder: &mut H) -> ArchiveResult<()>
where
    H: ArchiveHolder + ?Sized,
{
    let archive = validate_archive(data)?;
    holder.attach_archive(archive);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn stored_zip(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in members {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            validate_archive(b"just some text".to_vec()),
            Err(ArchiveError::NotAZip)
        ));
        assert!(matches!(validate_archive(Vec::new()), Err(ArchiveError::NotAZip)));
    }

    #[test]
    fn test_truncated_zip() {
        let mut data = stored_zip(&[("a.txt", b"some content for a truncated archive")]);
        data.truncate(data.len() / 2);

        assert!(matches!(validate_archive(data), Err(ArchiveError::InvalidZip(_))));
    }

    #[test]
    fn test_corrupted_member_is_named() {
        let content: &[u8] = b"this member content will be altered";
        let mut data = stored_zip(&[("ok.txt", b"fine"), ("broken.txt", content)]);

        let offset = data
            .windows(content.len())
            .position(|window| window == content)
            .unwrap();
        data[offset] ^= 0xFF;

        match validate_archive(data) {
            Err(ArchiveError::CorruptedMember(name)) => assert_eq!(name, "broken.txt"),
            other => panic!("Expected CorruptedMember, got {:?}", other),
        }
    }

    #[test]
    fn test_sorted_names() {
        let data = stored_zip(&[("b.png", b"b"), ("a/c.png", b"c"), ("a.png", b"a")]);
        let archive = validate_archive(data).unwrap();

        assert_eq!(archive.len(), 3);
        assert_eq!(archive.sorted_names(), vec!["a.png", "a/c.png", "b.png"]);
    }
}
