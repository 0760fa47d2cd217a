//! Node tree
//!
//! The tree section is a flat list of records in creation order. Each record
//! names its parent by id and itself by string table index:
//!
//! ```text
//! ┌──────┬──────────────┬────────────┐
//! │ kind │ parent (u64) │ name (u32) │  head, 13 bytes
//! ├──────┴─────┬────────┴────────────┤
//! │ size (u32) │ offset (u64)        │  tail, 12 bytes, absent for Void
//! └────────────┴─────────────────────┘
//! ```
//!
//! Nodes live in an arena indexed by id; the root (id 0) is synthetic.

use std::collections::HashMap;
use std::io::{BufReader, Read, Seek, SeekFrom};

use affread_core::{Error, NodeKind, Result};
use affread_pipeline::DigestPipeline;

use crate::codec::Decoder;
use crate::header::SectionDescriptor;
use crate::stable::StringTable;

/// Sequential node id; the root is 0
pub type NodeId = u64;

/// Id of the synthetic root node
pub const ROOT_ID: NodeId = 0;

/// Size of the fixed record head: kind, parent, name
pub const RECORD_HEAD_SIZE: usize = 1 + 8 + 4;
/// Size of the payload tail carried by non-Void records: size, offset
pub const RECORD_TAIL_SIZE: usize = 4 + 8;

/// One node of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Parent id; the root is its own parent
    pub parent: NodeId,
    /// Name index into the string table
    pub name: u32,
    pub id: NodeId,
    /// Element count of the payload (0 for Void)
    pub size: u32,
    /// Absolute file offset of the payload (0 for Void)
    pub offset: u64,
    /// Children in creation order
    pub children: Vec<NodeId>,
}

impl Node {
    fn new(id: NodeId, parent: NodeId, name: u32) -> Self {
        Self {
            kind: NodeKind::Void,
            parent,
            name,
            id,
            size: 0,
            offset: 0,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    /// Payload length in bytes, `None` on overflow
    pub fn byte_len(&self) -> Option<u64> {
        (self.size as u64).checked_mul(self.kind.element_width() as u64)
    }
}

/// Arena of nodes with a `(parent, name)` index
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    index: HashMap<(NodeId, u32), NodeId>,
}

impl Tree {
    /// Create a tree holding only the root; interns the root's empty name
    pub fn new(stable: &mut StringTable, capacity: usize) -> Result<Self> {
        let root_name = stable.insert("")?;
        let capacity = capacity.max(1);

        let mut nodes = Vec::with_capacity(capacity);
        nodes.push(Node::new(ROOT_ID, ROOT_ID, root_name));

        Ok(Self {
            nodes,
            index: HashMap::with_capacity(capacity),
        })
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Node with id `id`
    pub fn index(&self, id: NodeId) -> Option<&Node> {
        usize::try_from(id).ok().and_then(|i| self.nodes.get(i))
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child of `parent` called `name`, without creating it
    pub fn lookup(&self, parent: NodeId, name: u32) -> Option<NodeId> {
        self.index.get(&(parent, name)).copied()
    }

    /// Child of `parent` called `name`, creating it when `create` is set
    ///
    /// An existing child is reused, so repeated calls yield the same id.
    /// Returns `None` when the parent does not exist or the child is absent
    /// and `create` is off.
    pub fn chdir(&mut self, parent: NodeId, name: u32, create: bool) -> Option<NodeId> {
        self.index(parent)?;

        if let Some(id) = self.lookup(parent, name) {
            return Some(id);
        }
        if !create {
            return None;
        }

        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::new(id, parent, name));
        self.index.insert((parent, name), id);
        self.nodes[parent as usize].children.push(id);
        Some(id)
    }

    /// Give node `id` its kind and payload location
    ///
    /// A node takes data once; a Void assignment leaves it unchanged.
    pub fn assign(&mut self, id: NodeId, kind: NodeKind, size: u32, offset: u64) -> Result<()> {
        let node = usize::try_from(id)
            .ok()
            .and_then(|i| self.nodes.get_mut(i))
            .ok_or_else(|| Error::malformed("Node assignment error"))?;

        if kind == NodeKind::Void {
            return Ok(());
        }
        if node.kind != NodeKind::Void {
            return Err(Error::malformed("Node assignment error"));
        }

        node.kind = kind;
        node.size = size;
        node.offset = offset;
        Ok(())
    }

    /// All nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}

/// Read exactly `buf.len()` bytes, mapping failure to `message`
fn read_record<R: Read>(pipe: &mut R, buf: &mut [u8], message: &str) -> Result<()> {
    pipe.read_exact(buf).map_err(|e| Error::read(message, e))
}

/// Decode every record of the tree section into `tree`
fn decode_records<R: Read>(
    pipe: &mut DigestPipeline<R>,
    tree: &mut Tree,
    stable: &StringTable,
) -> Result<()> {
    let mut head = [0u8; RECORD_HEAD_SIZE];
    let mut tail = [0u8; RECORD_TAIL_SIZE];

    while pipe.remaining() >= RECORD_HEAD_SIZE as u64 {
        read_record(pipe, &mut head, "Tree node reading error")?;

        let mut d = Decoder::new(&head);
        let (kind, parent, name) = match (d.kind(), d.u64(), d.u32()) {
            (Some(kind), Some(parent), Some(name)) => (kind, parent, name),
            _ => return Err(Error::malformed("Error decoding the node record")),
        };

        if tree.index(parent).is_none() {
            return Err(Error::malformed("Broken tree: missing parent"));
        }
        if stable.get(name).is_none() {
            return Err(Error::malformed("Broken tree: missing name"));
        }

        let (size, offset) = if kind == NodeKind::Void {
            (0, 0)
        } else {
            if pipe.remaining() < RECORD_TAIL_SIZE as u64 {
                return Err(Error::malformed("Malformed tree data"));
            }
            read_record(pipe, &mut tail, "Tree node data reading error")?;

            let mut d = Decoder::new(&tail);
            match (d.u32(), d.u64()) {
                (Some(size), Some(offset)) => (size, offset),
                _ => return Err(Error::malformed("Tree node data decoding error")),
            }
        };

        let id = tree
            .chdir(parent, name, true)
            .ok_or_else(|| Error::malformed("Node rebuilding error"))?;
        tree.assign(id, kind, size, offset)?;
    }

    if pipe.remaining() != 0 {
        return Err(Error::malformed("Mismatch in the tree size"));
    }
    Ok(())
}

/// Load the tree section described by `section`
///
/// Records are decoded straight from the file while every consumed byte is
/// hashed. When decoding fails but the rest of the section can still be read,
/// the digest decides: a mismatch is reported as such, since a corrupted byte
/// explains the structural failure.
pub fn load_tree<R: Read + Seek + ?Sized>(
    reader: &mut R,
    section: &SectionDescriptor,
    stable: &mut StringTable,
    max_prealloc: usize,
) -> Result<Tree> {
    // The record count is only a hint; every record takes at least a head
    let fits = usize::try_from(section.size / RECORD_HEAD_SIZE as u64 + 1).unwrap_or(usize::MAX);
    let capacity = (section.records as usize).min(fits).min(max_prealloc);
    let mut tree = Tree::new(stable, capacity)?;

    reader
        .seek(SeekFrom::Start(section.start))
        .map_err(|e| Error::read("Tree node reading error", e))?;
    let mut pipe = DigestPipeline::new(BufReader::new(reader), section.size);

    if let Err(err) = decode_records(&mut pipe, &mut tree, stable) {
        let drained = pipe.drain().is_ok() && pipe.remaining() == 0;
        if drained && pipe.finalize() != section.md5 {
            tracing::debug!("Tree decoding failed on corrupted data: {}", err);
            return Err(Error::checksum("Tree table checksum mismatch"));
        }
        return Err(err);
    }

    let consumed = pipe.consumed();
    if pipe.finalize() != section.md5 {
        return Err(Error::checksum("Tree table checksum mismatch"));
    }

    if section.records != 0 && section.records as usize != tree.len() - 1 {
        tracing::warn!(
            "Tree declares {} records but holds {} nodes",
            section.records,
            tree.len() - 1
        );
    }
    tracing::debug!("Loaded tree: {} nodes from {} bytes", tree.len(), consumed);

    Ok(tree)
}
