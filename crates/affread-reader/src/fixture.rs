//! Test archive builder
//!
//! Assembles AFF archives byte for byte so tests can open valid files and
//! corrupt them at known positions. Layout: header, data, stable, tree.

use std::collections::HashMap;
use std::ops::Range;

use affread_core::NodeKind;
use affread_pipeline::{md5_of, md5_of_parts};

use crate::data::NodeData;
use crate::signature::{encode_signature, HeaderVersion};
use crate::tree::NodeId;

/// Encoded archive plus the byte ranges of its parts
pub(crate) struct Fixture {
    pub bytes: Vec<u8>,
    pub header: Range<usize>,
    pub data: Range<usize>,
    pub stable: Range<usize>,
    pub tree: Range<usize>,
}

pub(crate) struct ArchiveBuilder {
    version: HeaderVersion,
    strings: Vec<String>,
    string_index: HashMap<String, u32>,
    data: Vec<u8>,
    tree: Vec<u8>,
    tree_records: u32,
    nodes: HashMap<(NodeId, u32), NodeId>,
    next_id: NodeId,
    records_override: Option<(u32, u32)>,
}

impl ArchiveBuilder {
    pub fn new(version: HeaderVersion) -> Self {
        Self {
            version,
            strings: Vec::new(),
            string_index: HashMap::new(),
            data: Vec::new(),
            tree: Vec::new(),
            tree_records: 0,
            nodes: HashMap::new(),
            next_id: 1,
            records_override: None,
        }
    }

    fn header_size(&self) -> u64 {
        self.version.layout().header_size as u64
    }

    /// Intern a name in the stable
    pub fn string(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.string_index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.string_index.insert(s.to_string(), idx);
        idx
    }

    /// Append raw bytes to the data section; returns their absolute offset
    pub fn data(&mut self, bytes: &[u8]) -> u64 {
        let offset = self.header_size() + self.data.len() as u64;
        self.data.extend_from_slice(bytes);
        offset
    }

    /// Append raw bytes to the tree section
    pub fn raw_tree(&mut self, bytes: &[u8]) -> &mut Self {
        self.tree.extend_from_slice(bytes);
        self
    }

    /// Force the V2 record counts of the stable and tree descriptors
    pub fn records(&mut self, stable: u32, tree: u32) -> &mut Self {
        self.records_override = Some((stable, tree));
        self
    }

    fn record(&mut self, kind: NodeKind, parent: NodeId, name: &str, size: u32, offset: u64) -> NodeId {
        let name = self.string(name);

        self.tree.push(kind.tag());
        self.tree.extend_from_slice(&parent.to_be_bytes());
        self.tree.extend_from_slice(&name.to_be_bytes());
        if kind != NodeKind::Void {
            self.tree.extend_from_slice(&size.to_be_bytes());
            self.tree.extend_from_slice(&offset.to_be_bytes());
        }
        self.tree_records += 1;

        let next = &mut self.next_id;
        *self.nodes.entry((parent, name)).or_insert_with(|| {
            let id = *next;
            *next += 1;
            id
        })
    }

    /// Add a Void node; returns its id
    pub fn void(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.record(NodeKind::Void, parent, name, 0, 0)
    }

    /// Add a node carrying `value`, stored at the end of the data section
    pub fn node(&mut self, parent: NodeId, name: &str, value: &NodeData) -> NodeId {
        let bytes = encode_payload(value);
        let offset = self.data(&bytes);
        self.record(value.kind(), parent, name, value.len() as u32, offset)
    }

    /// Add a node pointing at an arbitrary payload location
    pub fn node_at(&mut self, parent: NodeId, name: &str, kind: NodeKind, size: u32, offset: u64) -> NodeId {
        self.record(kind, parent, name, size, offset)
    }

    pub fn build(&self) -> Fixture {
        let mut stable = Vec::new();
        for s in &self.strings {
            stable.extend_from_slice(s.as_bytes());
            stable.push(0);
        }

        let (stable_records, tree_records) = match (self.version, self.records_override) {
            (HeaderVersion::V1, _) => (0, 0),
            (HeaderVersion::V2, Some(counts)) => counts,
            (HeaderVersion::V2, None) => (self.strings.len() as u32, self.tree_records),
        };

        let header_size = self.header_size() as usize;
        let data_start = header_size;
        let stable_start = data_start + self.data.len();
        let tree_start = stable_start + stable.len();

        let layout = self.version.layout();
        let mut body = Vec::new();
        let sections = [
            (data_start, &self.data[..], 0),
            (stable_start, &stable[..], stable_records),
            (tree_start, &self.tree[..], tree_records),
        ];
        for (start, bytes, records) in sections {
            body.extend_from_slice(&(start as u64).to_be_bytes());
            body.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
            if layout.has_record_count {
                body.extend_from_slice(&records.to_be_bytes());
            }
            body.extend_from_slice(&md5_of(bytes));
        }

        let sig = encode_signature(self.version);
        let digest = md5_of_parts(&[&sig[..], &body[..]]);

        let mut bytes = Vec::with_capacity(tree_start + self.tree.len());
        bytes.extend_from_slice(&sig);
        bytes.extend_from_slice(&body);
        bytes.extend_from_slice(&digest);
        debug_assert_eq!(bytes.len(), header_size);
        bytes.extend_from_slice(&self.data);
        bytes.extend_from_slice(&stable);
        bytes.extend_from_slice(&self.tree);

        Fixture {
            bytes,
            header: 0..header_size,
            data: data_start..stable_start,
            stable: stable_start..tree_start,
            tree: tree_start..tree_start + self.tree.len(),
        }
    }
}

/// Big-endian on-disk form of a payload
pub(crate) fn encode_payload(value: &NodeData) -> Vec<u8> {
    let mut out = Vec::new();
    match value {
        NodeData::Void => {}
        NodeData::Char(bytes) => out.extend_from_slice(bytes),
        NodeData::Int(values) => values.iter().for_each(|v| out.extend_from_slice(&v.to_be_bytes())),
        NodeData::Double(values) => values.iter().for_each(|v| out.extend_from_slice(&v.to_be_bytes())),
        NodeData::Complex(values) => values.iter().for_each(|(re, im)| {
            out.extend_from_slice(&re.to_be_bytes());
            out.extend_from_slice(&im.to_be_bytes());
        }),
    }
    out
}
