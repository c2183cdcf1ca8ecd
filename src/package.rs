//! Single-entry ZIP archives, the container SUNAT exchanges documents in.
//!
//! Everything happens in memory; persisting archives is the caller's job.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::CpeError;

/// Zip `content` as the only entry `file_name` (deflated).
pub fn zip_single(file_name: &str, content: &[u8]) -> Result<Vec<u8>, CpeError> {
    if file_name.is_empty() {
        return Err(CpeError::Package("entry name must not be empty".into()));
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(file_name, options).map_err(package_err)?;
    zip.write_all(content)
        .map_err(|e| CpeError::Package(format!("write {file_name}: {e}")))?;
    let bytes = zip.finish().map_err(package_err)?.into_inner();

    tracing::debug!(file_name, raw = content.len(), zipped = bytes.len(), "packaged");
    Ok(bytes)
}

/// Read back the first entry of an archive: `(name, content)`.
///
/// SUNAT's ApplicationResponse archives carry the CDR XML as their only
/// file (sometimes after an empty directory entry, which is skipped).
pub fn unzip_single(bytes: &[u8]) -> Result<(String, Vec<u8>), CpeError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(package_err)?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(package_err)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| CpeError::Package(format!("read {name}: {e}")))?;
        return Ok((name, content));
    }
    Err(CpeError::Package("archive has no file entries".into()))
}

fn package_err(e: zip::result::ZipError) -> CpeError {
    CpeError::Package(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_entry_roundtrip() {
        let xml = b"<?xml version=\"1.0\"?><Invoice/>";
        let zipped = zip_single("20123456789-01-F001-1.xml", xml).unwrap();
        assert_eq!(&zipped[..2], b"PK");

        let archive = ZipArchive::new(Cursor::new(zipped.as_slice())).unwrap();
        assert_eq!(archive.len(), 1);

        let (name, content) = unzip_single(&zipped).unwrap();
        assert_eq!(name, "20123456789-01-F001-1.xml");
        assert_eq!(content, xml);
    }

    #[test]
    fn empty_name_rejected() {
        assert!(matches!(zip_single("", b"x"), Err(CpeError::Package(_))));
    }

    #[test]
    fn garbage_is_not_an_archive() {
        assert!(matches!(
            unzip_single(b"not a zip"),
            Err(CpeError::Package(_))
        ));
    }

    #[test]
    fn skips_directory_entries() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.add_directory("dummy/", SimpleFileOptions::default())
            .unwrap();
        zip.start_file("R-1.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<ApplicationResponse/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let (name, content) = unzip_single(&bytes).unwrap();
        assert_eq!(name, "R-1.xml");
        assert_eq!(content, b"<ApplicationResponse/>");
    }
}
