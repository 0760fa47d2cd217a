//! Big-endian field decoding over byte windows
//!
//! Every decode is bounds-checked and reports failure as `None` so callers can
//! attach the message appropriate to the record being decoded.

use affread_core::{Digest16, NodeKind};

/// Decode a big-endian `u32` at `off`
pub fn decode_u32(buf: &[u8], off: usize) -> Option<u32> {
    let bytes = buf.get(off..off.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Decode a big-endian `u64` at `off`
pub fn decode_u64(buf: &[u8], off: usize) -> Option<u64> {
    let bytes = buf.get(off..off.checked_add(8)?)?;
    Some(u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}

/// Decode a node kind tag at `off`; unknown tags fail
pub fn decode_kind(buf: &[u8], off: usize) -> Option<NodeKind> {
    buf.get(off).copied().and_then(NodeKind::from_tag)
}

/// Copy a 16-byte digest starting at `off`
pub fn decode_digest(buf: &[u8], off: usize) -> Option<Digest16> {
    let bytes = buf.get(off..off.checked_add(16)?)?;
    let mut digest = [0u8; 16];
    digest.copy_from_slice(bytes);
    Some(digest)
}

/// Sequential decoder over a byte window
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Start decoding at `pos` within `buf`
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn u32(&mut self) -> Option<u32> {
        let v = decode_u32(self.buf, self.pos)?;
        self.pos += 4;
        Some(v)
    }

    pub fn u64(&mut self) -> Option<u64> {
        let v = decode_u64(self.buf, self.pos)?;
        self.pos += 8;
        Some(v)
    }

    pub fn kind(&mut self) -> Option<NodeKind> {
        let v = decode_kind(self.buf, self.pos)?;
        self.pos += 1;
        Some(v)
    }

    pub fn digest(&mut self) -> Option<Digest16> {
        let v = decode_digest(self.buf, self.pos)?;
        self.pos += 16;
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_u32_big_endian() {
        let buf = [0x00, 0x00, 0x01, 0x02, 0xff];
        assert_eq!(decode_u32(&buf, 0), Some(0x0102));
        assert_eq!(decode_u32(&buf, 1), Some(0x0001_02ff));
        assert_eq!(decode_u32(&buf, 2), None);
        assert_eq!(decode_u32(&buf, usize::MAX), None);
    }

    #[test]
    fn test_decode_u64_big_endian() {
        let buf = 0x0102_0304_0506_0708u64.to_be_bytes();
        assert_eq!(decode_u64(&buf, 0), Some(0x0102_0304_0506_0708));
        assert_eq!(decode_u64(&buf[..7], 0), None);
    }

    #[test]
    fn test_decode_kind() {
        assert_eq!(decode_kind(&[3], 0), Some(NodeKind::Double));
        assert_eq!(decode_kind(&[7], 0), None);
        assert_eq!(decode_kind(&[], 0), None);
    }

    #[test]
    fn test_decoder_sequence() {
        let mut buf = vec![2u8];
        buf.extend_from_slice(&9u64.to_be_bytes());
        buf.extend_from_slice(&4u32.to_be_bytes());
        buf.extend_from_slice(&[0xaa; 16]);

        let mut d = Decoder::new(&buf);
        assert_eq!(d.kind(), Some(NodeKind::Int));
        assert_eq!(d.u64(), Some(9));
        assert_eq!(d.u32(), Some(4));
        assert_eq!(d.digest(), Some([0xaa; 16]));
        assert_eq!(d.position(), 29);
        assert_eq!(d.u32(), None);
        // A failed decode does not advance
        assert_eq!(d.position(), 29);
    }
}
