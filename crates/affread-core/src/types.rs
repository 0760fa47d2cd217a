//! Core types shared by the AFF reader crates

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 16-byte MD5 digest as stored in AFF headers
pub type Digest16 = [u8; 16];

/// Kind of a tree node, as encoded by the one-byte tag on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeKind {
    /// Directory-like node without payload
    Void = 0,
    /// Byte string
    Char = 1,
    /// 32-bit unsigned integers
    Int = 2,
    /// IEEE-754 doubles
    Double = 3,
    /// Pairs of doubles (re, im)
    Complex = 4,
}

impl NodeKind {
    /// Decode a kind tag; `None` for unknown tags
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(NodeKind::Void),
            1 => Some(NodeKind::Char),
            2 => Some(NodeKind::Int),
            3 => Some(NodeKind::Double),
            4 => Some(NodeKind::Complex),
            _ => None,
        }
    }

    /// On-disk tag byte
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Width in bytes of one payload element (0 for Void)
    pub fn element_width(self) -> u32 {
        match self {
            NodeKind::Void => 0,
            NodeKind::Char => 1,
            NodeKind::Int => 4,
            NodeKind::Double => 8,
            NodeKind::Complex => 16,
        }
    }

    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Void => "void",
            NodeKind::Char => "char",
            NodeKind::Int => "int",
            NodeKind::Double => "double",
            NodeKind::Complex => "complex",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Summary of a node in a loaded tree, suitable for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Sequential node id (0 is the root)
    pub id: u64,

    /// Node name (empty for the root)
    pub name: String,

    /// Absolute path from the root, `/`-separated
    pub path: String,

    /// Payload kind
    pub kind: NodeKind,

    /// Element count (0 for Void)
    pub size: u32,

    /// File offset of the payload (0 for Void)
    pub offset: u64,

    /// Number of direct children
    pub children: usize,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_char = if self.kind == NodeKind::Void { "d" } else { "f" };
        write!(
            f,
            "{} {:<7} {:>10} {}",
            type_char,
            self.kind,
            if self.kind == NodeKind::Void {
                "-".to_string()
            } else {
                self.size.to_string()
            },
            if self.path.is_empty() { "/" } else { &self.path }
        )
    }
}
