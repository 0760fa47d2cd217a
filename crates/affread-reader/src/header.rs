//! AFF header body: three section descriptors and the header digest

use std::io::Read;

use affread_core::{Digest16, Error, Result};
use affread_pipeline::md5_of_parts;
use serde::Serialize;

use crate::codec::Decoder;
use crate::signature::{HeaderVersion, SIGNATURE_SIZE};

/// Location, size and digest of one archive section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SectionDescriptor {
    /// Absolute file offset of the section
    pub start: u64,
    /// Section length in bytes
    pub size: u64,
    /// Record count (V2 only, 0 for V1); advisory
    pub records: u32,
    /// MD5 of the section bytes
    #[serde(serialize_with = "serialize_digest")]
    pub md5: Digest16,
}

fn serialize_digest<S: serde::Serializer>(digest: &Digest16, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(digest))
}

impl SectionDescriptor {
    /// Hex form of the stored digest
    pub fn md5_hex(&self) -> String {
        hex::encode(self.md5)
    }

    /// Offset one past the last byte, if it does not overflow
    pub fn end(&self) -> Option<u64> {
        self.start.checked_add(self.size)
    }
}

/// Which section a descriptor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Data,
    Stable,
    Tree,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [SectionKind::Data, SectionKind::Stable, SectionKind::Tree];

    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Data => "data",
            SectionKind::Stable => "stable",
            SectionKind::Tree => "tree",
        }
    }
}

/// Decoded archive header
#[derive(Debug, Clone, Serialize)]
pub struct AffHeader {
    #[serde(serialize_with = "serialize_version")]
    pub version: HeaderVersion,
    pub data: SectionDescriptor,
    pub stable: SectionDescriptor,
    pub tree: SectionDescriptor,
}

fn serialize_version<S: serde::Serializer>(v: &HeaderVersion, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(v.label())
}

impl AffHeader {
    /// Descriptor of one section
    pub fn section(&self, kind: SectionKind) -> &SectionDescriptor {
        match kind {
            SectionKind::Data => &self.data,
            SectionKind::Stable => &self.stable,
            SectionKind::Tree => &self.tree,
        }
    }
}

fn decode_section(d: &mut Decoder<'_>, has_record_count: bool) -> Option<SectionDescriptor> {
    let start = d.u64()?;
    let size = d.u64()?;
    let records = if has_record_count { d.u32()? } else { 0 };
    let md5 = d.digest()?;
    Some(SectionDescriptor { start, size, records, md5 })
}

/// Unpack one section record at `offset` of the header body
fn unpack_section(
    body: &[u8],
    offset: usize,
    version: HeaderVersion,
    kind: SectionKind,
) -> Result<SectionDescriptor> {
    let layout = version.layout();
    let mut d = Decoder::at(body, offset);

    decode_section(&mut d, layout.has_record_count).ok_or_else(|| {
        Error::format(format!("{} {} header unpack failed", layout.label, kind.name()))
    })
}

/// Unpack the three section records from a header body
///
/// Stops at the first section that fails so its message is the one reported.
pub fn unpack_header(version: HeaderVersion, body: &[u8]) -> Result<AffHeader> {
    let offsets = version.layout().record_offsets;

    let data = unpack_section(body, offsets[0], version, SectionKind::Data)?;
    let stable = unpack_section(body, offsets[1], version, SectionKind::Stable)?;
    let tree = unpack_section(body, offsets[2], version, SectionKind::Tree)?;

    Ok(AffHeader { version, data, stable, tree })
}

/// Read the header body that follows `sig`, verify its digest and unpack it
pub fn read_header<R: Read + ?Sized>(
    reader: &mut R,
    sig: &[u8; SIGNATURE_SIZE],
    version: HeaderVersion,
) -> Result<AffHeader> {
    let layout = version.layout();
    let mut body = vec![0u8; layout.body_size()];
    reader
        .read_exact(&mut body)
        .map_err(|e| Error::read(format!("Reading {} header failed", layout.label), e))?;

    let digest_at = body.len() - 16;
    let computed = md5_of_parts(&[&sig[..], &body[..digest_at]]);
    if computed[..] != body[digest_at..] {
        return Err(Error::checksum(format!("{} header checksum failed", layout.label)));
    }

    unpack_header(version, &body[..digest_at])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::encode_signature;
    use std::io::Cursor;

    fn record(version: HeaderVersion, start: u64, size: u64, records: u32, md5: u8) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&start.to_be_bytes());
        out.extend_from_slice(&size.to_be_bytes());
        if version == HeaderVersion::V2 {
            out.extend_from_slice(&records.to_be_bytes());
        }
        out.extend_from_slice(&[md5; 16]);
        out
    }

    fn build_body(version: HeaderVersion) -> (Vec<u8>, [u8; SIGNATURE_SIZE]) {
        let sig = encode_signature(version);
        let mut body = Vec::new();
        body.extend(record(version, 143, 10, 0, 0xd0));
        body.extend(record(version, 153, 5, 1, 0x50));
        body.extend(record(version, 158, 13, 2, 0x70));
        let digest = md5_of_parts(&[&sig[..], &body[..]]);
        body.extend_from_slice(&digest);
        (body, sig)
    }

    #[test]
    fn test_read_header_v1() {
        let (body, sig) = build_body(HeaderVersion::V1);
        assert_eq!(body.len(), HeaderVersion::V1.layout().body_size());

        let header = read_header(&mut Cursor::new(body), &sig, HeaderVersion::V1).unwrap();
        assert_eq!(header.version, HeaderVersion::V1);
        assert_eq!(header.data, SectionDescriptor { start: 143, size: 10, records: 0, md5: [0xd0; 16] });
        assert_eq!(header.stable.start, 153);
        assert_eq!(header.stable.records, 0);
        assert_eq!(header.tree.size, 13);
        assert_eq!(header.tree.md5, [0x70; 16]);
    }

    #[test]
    fn test_read_header_v2_keeps_record_counts() {
        let (body, sig) = build_body(HeaderVersion::V2);
        assert_eq!(body.len(), HeaderVersion::V2.layout().body_size());

        let header = read_header(&mut Cursor::new(body), &sig, HeaderVersion::V2).unwrap();
        assert_eq!(header.stable.records, 1);
        assert_eq!(header.tree.records, 2);
        assert_eq!(header.section(SectionKind::Tree).start, 158);
    }

    #[test]
    fn test_header_checksum_failure() {
        let (mut body, sig) = build_body(HeaderVersion::V2);
        body[40] ^= 0x01;
        let err = read_header(&mut Cursor::new(body), &sig, HeaderVersion::V2).unwrap_err();
        assert!(err.is_checksum());
        assert_eq!(err.to_string(), "V2 header checksum failed");
    }

    #[test]
    fn test_header_digest_covers_signature() {
        let (body, mut sig) = build_body(HeaderVersion::V1);
        sig[0] ^= 0x20;
        let err = read_header(&mut Cursor::new(body), &sig, HeaderVersion::V1).unwrap_err();
        assert_eq!(err.to_string(), "V1 header checksum failed");
    }

    #[test]
    fn test_short_header_read() {
        let (body, sig) = build_body(HeaderVersion::V1);
        let err = read_header(&mut Cursor::new(body[..50].to_vec()), &sig, HeaderVersion::V1)
            .unwrap_err();
        assert!(err.to_string().starts_with("Reading V1 header failed"));
    }

    #[test]
    fn test_unpack_reports_first_failing_section() {
        // Body long enough for the data record only
        let short = vec![0u8; 40];
        let err = unpack_header(HeaderVersion::V2, &short).unwrap_err();
        assert_eq!(err.to_string(), "V2 stable header unpack failed");

        let err = unpack_header(HeaderVersion::V1, &[0u8; 10]).unwrap_err();
        assert_eq!(err.to_string(), "V1 data header unpack failed");
    }

    #[test]
    fn test_section_descriptor_helpers() {
        let d = SectionDescriptor { start: 10, size: 5, records: 0, md5: [0xab; 16] };
        assert_eq!(d.end(), Some(15));
        assert_eq!(d.md5_hex(), "ab".repeat(16));
        let d = SectionDescriptor { start: u64::MAX, size: 1, ..Default::default() };
        assert_eq!(d.end(), None);
    }
}
