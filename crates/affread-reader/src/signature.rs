//! AFF signature block
//!
//! The archive starts with a fixed signature block:
//!
//! ```text
//! ┌────────────────────────────┐ 0
//! │ identifier (20 bytes)      │ "LHPC AFF version 1.0" / "... 2.0"
//! ├────────────────────────────┤ 20
//! │ double width in bits  (1)  │ 64
//! │ float radix           (1)  │ 2
//! │ mantissa digits       (1)  │ 53
//! ├────────────────────────────┤ 23
//! │ exponent limits (u32 BE)   │ (max_exp << 16) | -min_exp
//! ├────────────────────────────┤ 27
//! │ header size     (u32 BE)   │ total header size, selects V1 / V2
//! └────────────────────────────┘ 31
//! ```
//!
//! The header size selects the layout of the header body that follows.

use affread_core::{Error, Result};

use crate::codec::decode_u32;

/// Length of the version identifier
pub const SIGNATURE_ID_SIZE: usize = 20;
/// Offset of the double width byte
pub const SIG_OFF_DBITS: usize = SIGNATURE_ID_SIZE;
/// Offset of the radix byte
pub const SIG_OFF_RADIX: usize = SIG_OFF_DBITS + 1;
/// Offset of the mantissa digits byte
pub const SIG_OFF_MANT: usize = SIG_OFF_RADIX + 1;
/// Offset of the packed exponent limits
pub const SIG_OFF_EXP: usize = SIG_OFF_MANT + 1;
/// Offset of the declared header size
pub const SIG_OFF_SIZE: usize = SIG_OFF_EXP + 4;
/// Total signature block size
pub const SIGNATURE_SIZE: usize = SIG_OFF_SIZE + 4;

/// Identifier of V1 archives
pub const SIGNATURE_ID_V1: &[u8; SIGNATURE_ID_SIZE] = b"LHPC AFF version 1.0";
/// Identifier of V2 archives
pub const SIGNATURE_ID_V2: &[u8; SIGNATURE_ID_SIZE] = b"LHPC AFF version 2.0";

/// Size of one V1 section record: start, size, md5
pub const SECTION_RECORD_SIZE_V1: usize = 8 + 8 + 16;
/// Size of one V2 section record: start, size, records, md5
pub const SECTION_RECORD_SIZE_V2: usize = 8 + 8 + 4 + 16;

/// Total V1 header size: signature, three records, header digest
pub const HEADER_SIZE_V1: u32 = (SIGNATURE_SIZE + 3 * SECTION_RECORD_SIZE_V1 + 16) as u32;
/// Total V2 header size: signature, three records, header digest
pub const HEADER_SIZE_V2: u32 = (SIGNATURE_SIZE + 3 * SECTION_RECORD_SIZE_V2 + 16) as u32;

/// Width in bits of the platform double
pub const DOUBLE_BITS: u8 = (std::mem::size_of::<f64>() * 8) as u8;
/// Mantissa digits of the platform double
pub const DOUBLE_MANTISSA: u8 = f64::MANTISSA_DIGITS as u8;
/// Packed `(max_exp << 16) | -min_exp` of the platform double
pub const DOUBLE_EXPONENTS: u32 = ((f64::MAX_EXP as u32) << 16) | ((-f64::MIN_EXP) as u32);

/// Fixed layout of one header version
#[derive(Debug)]
pub struct HeaderLayout {
    /// Label used in diagnostics ("V1", "V2")
    pub label: &'static str,
    /// Identifier expected at the start of the signature
    pub identifier: &'static [u8; SIGNATURE_ID_SIZE],
    /// Total header size, signature included
    pub header_size: u32,
    /// Offsets of the data, stable, tree records within the header body
    pub record_offsets: [usize; 3],
    /// Whether records carry a `records` count
    pub has_record_count: bool,
}

impl HeaderLayout {
    /// Bytes following the signature block
    pub fn body_size(&self) -> usize {
        self.header_size as usize - SIGNATURE_SIZE
    }
}

static LAYOUT_V1: HeaderLayout = HeaderLayout {
    label: "V1",
    identifier: SIGNATURE_ID_V1,
    header_size: HEADER_SIZE_V1,
    record_offsets: [0, SECTION_RECORD_SIZE_V1, 2 * SECTION_RECORD_SIZE_V1],
    has_record_count: false,
};

static LAYOUT_V2: HeaderLayout = HeaderLayout {
    label: "V2",
    identifier: SIGNATURE_ID_V2,
    header_size: HEADER_SIZE_V2,
    record_offsets: [0, SECTION_RECORD_SIZE_V2, 2 * SECTION_RECORD_SIZE_V2],
    has_record_count: true,
};

/// Header layout version, selected once from the declared header size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderVersion {
    V1,
    V2,
}

impl HeaderVersion {
    /// All versions this reader understands
    pub const ALL: [HeaderVersion; 2] = [HeaderVersion::V1, HeaderVersion::V2];

    /// Layout table for this version
    pub fn layout(self) -> &'static HeaderLayout {
        match self {
            HeaderVersion::V1 => &LAYOUT_V1,
            HeaderVersion::V2 => &LAYOUT_V2,
        }
    }

    /// Select the version whose total header size is `size`
    pub fn from_header_size(size: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.layout().header_size == size)
    }

    /// Diagnostic label
    pub fn label(self) -> &'static str {
        self.layout().label
    }
}

impl std::fmt::Display for HeaderVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Decode the declared header size and pick the layout it names
pub fn declared_version(sig: &[u8; SIGNATURE_SIZE]) -> Result<HeaderVersion> {
    let size = decode_u32(sig, SIG_OFF_SIZE)
        .ok_or_else(|| Error::format("AFF signature size decoding failed"))?;

    HeaderVersion::from_header_size(size).ok_or_else(|| {
        tracing::debug!("Unsupported AFF header size {}", size);
        Error::format("Bad AFF header")
    })
}

/// Check the identifier and the recorded double representation
pub fn validate_signature(sig: &[u8; SIGNATURE_SIZE], version: HeaderVersion) -> Result<()> {
    if &sig[..SIGNATURE_ID_SIZE] != version.layout().identifier {
        return Err(Error::format("AFF signature mismatch"));
    }

    if sig[SIG_OFF_DBITS] != DOUBLE_BITS {
        return Err(Error::format("AFF size of double mismatch"));
    }
    if sig[SIG_OFF_RADIX] != f64::RADIX as u8 || f64::RADIX != 2 {
        return Err(Error::format("AFF double radix mismatch"));
    }
    if sig[SIG_OFF_MANT] != DOUBLE_MANTISSA {
        return Err(Error::format("AFF double mantissa size mismatch"));
    }

    let exponents = decode_u32(sig, SIG_OFF_EXP)
        .ok_or_else(|| Error::format("AFF error decoding double exponent sizes"))?;
    if exponents != DOUBLE_EXPONENTS {
        return Err(Error::format("AFF exponent limits mismatch"));
    }

    Ok(())
}

/// Parse a signature block: select the version, then validate it
pub fn parse_signature(sig: &[u8; SIGNATURE_SIZE]) -> Result<HeaderVersion> {
    let version = declared_version(sig)?;
    validate_signature(sig, version)?;
    Ok(version)
}

/// Build a valid signature block for `version`
#[cfg(test)]
pub(crate) fn encode_signature(version: HeaderVersion) -> [u8; SIGNATURE_SIZE] {
    let layout = version.layout();
    let mut sig = [0u8; SIGNATURE_SIZE];
    sig[..SIGNATURE_ID_SIZE].copy_from_slice(layout.identifier);
    sig[SIG_OFF_DBITS] = DOUBLE_BITS;
    sig[SIG_OFF_RADIX] = f64::RADIX as u8;
    sig[SIG_OFF_MANT] = DOUBLE_MANTISSA;
    sig[SIG_OFF_EXP..SIG_OFF_SIZE].copy_from_slice(&DOUBLE_EXPONENTS.to_be_bytes());
    sig[SIG_OFF_SIZE..].copy_from_slice(&layout.header_size.to_be_bytes());
    sig
}
