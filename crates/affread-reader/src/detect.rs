//! Format detection without a full open

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use affread_core::Result;

use crate::signature::{parse_signature, HeaderVersion, SIGNATURE_SIZE};

/// Detect the AFF header version of a file from its signature block
///
/// Returns `None` for files too short to hold a signature or whose signature
/// is not an accepted AFF encoding. Only I/O errors are reported as errors.
pub fn detect_version(path: &Path) -> Result<Option<HeaderVersion>> {
    let mut file = File::open(path)?;

    let mut sig = [0u8; SIGNATURE_SIZE];
    match file.read_exact(&mut sig) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    match parse_signature(&sig) {
        Ok(version) => Ok(Some(version)),
        Err(e) => {
            tracing::debug!("{} is not an AFF archive: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// Supported versions with their identifiers and total header sizes
pub fn supported_versions() -> Vec<(HeaderVersion, &'static str, u32)> {
    HeaderVersion::ALL
        .into_iter()
        .map(|v| {
            let layout = v.layout();
            let id = std::str::from_utf8(layout.identifier).unwrap_or_default();
            (v, id, layout.header_size)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::ArchiveBuilder;
    use crate::tree::ROOT_ID;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_detect_versions() {
        for version in HeaderVersion::ALL {
            let mut b = ArchiveBuilder::new(version);
            b.void(ROOT_ID, "a");
            let file = temp_with(&b.build().bytes);
            assert_eq!(detect_version(file.path()).unwrap(), Some(version));
        }
    }

    #[test]
    fn test_detect_rejects_other_files() {
        let file = temp_with(b"EVF\x09\x0d\x0a\xff\x00 not an aff archive at all");
        assert_eq!(detect_version(file.path()).unwrap(), None);

        let file = temp_with(b"LHPC AFF version 2.0");
        assert_eq!(detect_version(file.path()).unwrap(), None);

        let file = temp_with(b"");
        assert_eq!(detect_version(file.path()).unwrap(), None);
    }

    #[test]
    fn test_detect_short_file() {
        let mut b = ArchiveBuilder::new(HeaderVersion::V2);
        b.void(ROOT_ID, "a");
        let bytes = b.build().bytes;

        let file = temp_with(&bytes[..SIGNATURE_SIZE - 1]);
        assert_eq!(detect_version(file.path()).unwrap(), None);

        let file = temp_with(&bytes[..SIGNATURE_SIZE]);
        assert_eq!(detect_version(file.path()).unwrap(), Some(HeaderVersion::V2));
    }

    #[test]
    fn test_detect_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(detect_version(&dir.path().join("none.aff")).is_err());
    }

    #[test]
    fn test_supported_versions() {
        let versions = supported_versions();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0], (HeaderVersion::V1, "LHPC AFF version 1.0", 143));
        assert_eq!(versions[1], (HeaderVersion::V2, "LHPC AFF version 2.0", 155));
    }
}
