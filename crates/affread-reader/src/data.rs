//! Node payloads stored in the data section

use std::io::{Read, Seek};

use affread_core::{validate_allocation_size, Error, NodeKind, Result, MAX_ALLOCATION_SIZE};
use affread_pipeline::{DigestPipeline, PartialPipeline};
use serde::Serialize;

use crate::header::SectionDescriptor;
use crate::tree::Node;

/// Decoded payload of one node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum NodeData {
    Void,
    Char(Vec<u8>),
    Int(Vec<u32>),
    Double(Vec<f64>),
    Complex(Vec<(f64, f64)>),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Void => NodeKind::Void,
            NodeData::Char(_) => NodeKind::Char,
            NodeData::Int(_) => NodeKind::Int,
            NodeData::Double(_) => NodeKind::Double,
            NodeData::Complex(_) => NodeKind::Complex,
        }
    }

    /// Element count
    pub fn len(&self) -> usize {
        match self {
            NodeData::Void => 0,
            NodeData::Char(v) => v.len(),
            NodeData::Int(v) => v.len(),
            NodeData::Double(v) => v.len(),
            NodeData::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Char payload as text, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NodeData::Char(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Decode `bytes` as elements of `kind`
    fn decode(kind: NodeKind, bytes: Vec<u8>) -> Self {
        let f64_at = |chunk: &[u8]| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_be_bytes(raw)
        };

        match kind {
            NodeKind::Void => NodeData::Void,
            NodeKind::Char => NodeData::Char(bytes),
            NodeKind::Int => NodeData::Int(
                bytes
                    .chunks_exact(4)
                    .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            NodeKind::Double => NodeData::Double(bytes.chunks_exact(8).map(f64_at).collect()),
            NodeKind::Complex => NodeData::Complex(
                bytes
                    .chunks_exact(16)
                    .map(|c| (f64_at(&c[..8]), f64_at(&c[8..])))
                    .collect(),
            ),
        }
    }
}

/// Read and decode the payload of `node` from the data section
pub fn read_node_data<R: Read + Seek>(
    reader: R,
    data: &SectionDescriptor,
    node: &Node,
) -> Result<NodeData> {
    if node.kind == NodeKind::Void {
        return Ok(NodeData::Void);
    }

    let outside = || Error::malformed("Node data outside data section");
    let byte_len = node.byte_len().ok_or_else(outside)?;

    let mut section = PartialPipeline::new(reader, data.start, data.size)
        .map_err(|e| Error::read("Positioning on the data section failed", e))?;
    if !section.contains(node.offset, byte_len) {
        return Err(outside());
    }

    let byte_len = validate_allocation_size(byte_len, MAX_ALLOCATION_SIZE, "Node data")?;
    section
        .seek_absolute(node.offset)
        .map_err(|e| Error::read("Positioning on the node data failed", e))?;

    let mut bytes = vec![0u8; byte_len];
    section
        .read_exact(&mut bytes)
        .map_err(|e| Error::read("Node data reading error", e))?;

    Ok(NodeData::decode(node.kind, bytes))
}

/// Stream the data section through MD5 and compare with its descriptor
pub fn verify_data_section<R: Read + Seek>(reader: R, data: &SectionDescriptor) -> Result<()> {
    let section = PartialPipeline::new(reader, data.start, data.size)
        .map_err(|e| Error::read("Positioning on the data section failed", e))?;

    let mut pipe = DigestPipeline::new(section, data.size);
    pipe.drain()
        .map_err(|e| Error::read("Error reading data section", e))?;
    if pipe.remaining() != 0 {
        return Err(Error::malformed("Data section truncated"));
    }

    if pipe.finalize() != data.md5 {
        return Err(Error::checksum("Data checksum mismatch"));
    }

    tracing::debug!("Verified data section: {} bytes", data.size);
    Ok(())
}
