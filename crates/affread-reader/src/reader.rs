//! Archive reader: header, string table and tree loaded in order

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use affread_core::{Error, NodeInfo, ReadSeek, Result};

use crate::config::ReaderConfig;
use crate::data::{read_node_data, verify_data_section, NodeData};
use crate::header::{read_header, AffHeader, SectionDescriptor};
use crate::signature::{parse_signature, HeaderVersion, SIGNATURE_SIZE};
use crate::stable::{load_stable, StringTable};
use crate::tree::{load_tree, Node, NodeId, Tree, ROOT_ID};

/// A fully loaded AFF archive
///
/// Opening reads and verifies the header, the string table and the tree.
/// Node payloads stay on disk until [`AffReader::read_node`] asks for them.
///
/// # Example
///
/// ```rust,no_run
/// use affread_reader::AffReader;
/// use std::path::Path;
///
/// let mut archive = AffReader::open(Path::new("run.aff")).unwrap();
/// println!("{} archive, {} nodes", archive.version(), archive.tree().len());
///
/// let id = archive.resolve_path("/config/label").unwrap();
/// let value = archive.read_node(id).unwrap();
/// println!("{:?}", value);
/// ```
pub struct AffReader {
    path: Option<PathBuf>,
    source: Box<dyn ReadSeek>,
    header: AffHeader,
    stable: StringTable,
    tree: Tree,
}

impl std::fmt::Debug for AffReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffReader")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("strings", &self.stable.len())
            .field("nodes", &self.tree.len())
            .finish()
    }
}

impl AffReader {
    /// Open an archive with the default configuration
    ///
    /// # Errors
    ///
    /// Returns the first error met while opening the file or loading any
    /// section
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_config(path, &ReaderConfig::default())
    }

    /// Open an archive with explicit limits
    pub fn open_with_config(path: &Path, config: &ReaderConfig) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = Self::from_reader_with_config(Box::new(file), config)?;
        reader.path = Some(path.to_path_buf());
        Ok(reader)
    }

    /// Load an archive from any seekable source
    pub fn from_reader(source: Box<dyn ReadSeek>) -> Result<Self> {
        Self::from_reader_with_config(source, &ReaderConfig::default())
    }

    /// Load an archive from any seekable source with explicit limits
    pub fn from_reader_with_config(mut source: Box<dyn ReadSeek>, config: &ReaderConfig) -> Result<Self> {
        let mut sig = [0u8; SIGNATURE_SIZE];
        source
            .seek(SeekFrom::Start(0))
            .and_then(|_| source.read_exact(&mut sig))
            .map_err(|e| Error::read("Reading AFF signature failed", e))?;

        let version = parse_signature(&sig)?;
        tracing::debug!("AFF {} signature accepted", version);

        let header = read_header(&mut source, &sig, version)?;
        tracing::debug!(
            "Sections: data {}+{}, stable {}+{}, tree {}+{}",
            header.data.start,
            header.data.size,
            header.stable.start,
            header.stable.size,
            header.tree.start,
            header.tree.size
        );

        let mut stable = load_stable(&mut source, &header.stable, config.max_stable_bytes)?;
        let tree = load_tree(&mut source, &header.tree, &mut stable, config.max_tree_prealloc)?;

        if config.verify_data {
            verify_data_section(&mut source, &header.data)?;
        }

        Ok(Self {
            path: None,
            source,
            header,
            stable,
            tree,
        })
    }

    /// Path the archive was opened from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn version(&self) -> HeaderVersion {
        self.header.version
    }

    pub fn header(&self) -> &AffHeader {
        &self.header
    }

    pub fn data_section(&self) -> &SectionDescriptor {
        &self.header.data
    }

    pub fn stable_section(&self) -> &SectionDescriptor {
        &self.header.stable
    }

    pub fn tree_section(&self) -> &SectionDescriptor {
        &self.header.tree
    }

    pub fn string_table(&self) -> &StringTable {
        &self.stable
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> &Node {
        self.tree.root()
    }

    /// Node with id `id`
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.tree
            .index(id)
            .ok_or_else(|| Error::not_found(format!("node {}", id)))
    }

    /// Children of `id` in creation order
    pub fn children(&self, id: NodeId) -> Result<Vec<&Node>> {
        let node = self.node(id)?;
        Ok(node
            .children
            .iter()
            .filter_map(|&child| self.tree.index(child))
            .collect())
    }

    /// Child of `parent` called `name`
    pub fn lookup(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let name = self.stable.lookup(name)?;
        self.tree.lookup(parent, name)
    }

    /// Resolve a `/`-separated path from the root
    ///
    /// A leading `/` is optional; `.` and empty components are skipped and
    /// `..` moves to the parent.
    pub fn resolve_path(&self, path: &str) -> Result<NodeId> {
        let mut current = ROOT_ID;

        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." => current = self.node(current)?.parent,
                name => {
                    current = self
                        .lookup(current, name)
                        .ok_or_else(|| Error::not_found(path.to_string()))?;
                }
            }
        }

        Ok(current)
    }

    /// Name of node `id`
    pub fn node_name(&self, id: NodeId) -> Result<&str> {
        let node = self.node(id)?;
        self.stable
            .get(node.name)
            .ok_or_else(|| Error::malformed("Broken tree: missing name"))
    }

    /// Absolute path of node `id`; the root is the empty path
    pub fn node_path(&self, id: NodeId) -> Result<String> {
        let mut names = Vec::new();
        let mut current = self.node(id)?;

        // Parents always have smaller ids, so this climbs to the root
        while !current.is_root() {
            names.push(self.node_name(current.id)?);
            current = self.node(current.parent)?;
        }

        Ok(names.iter().rev().fold(String::new(), |mut path, name| {
            path.push('/');
            path.push_str(name);
            path
        }))
    }

    /// Listing entry for node `id`
    pub fn info(&self, id: NodeId) -> Result<NodeInfo> {
        let node = self.node(id)?;
        Ok(NodeInfo {
            id,
            name: self.node_name(id)?.to_string(),
            path: self.node_path(id)?,
            kind: node.kind,
            size: node.size,
            offset: node.offset,
            children: node.children.len(),
        })
    }

    /// Depth-first walk from the root, children in creation order
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            reader: self,
            stack: vec![ROOT_ID],
        }
    }

    /// Read the payload of node `id` from the data section
    pub fn read_node(&mut self, id: NodeId) -> Result<NodeData> {
        let node = self
            .tree
            .index(id)
            .ok_or_else(|| Error::not_found(format!("node {}", id)))?;
        read_node_data(&mut self.source, &self.header.data, node)
    }

    /// Read the payload of the node at `path`
    pub fn read_path(&mut self, path: &str) -> Result<NodeData> {
        let id = self.resolve_path(path)?;
        self.read_node(id)
    }

    /// Check the data section against its stored digest
    pub fn verify_data(&mut self) -> Result<()> {
        verify_data_section(&mut self.source, &self.header.data)
    }
}

/// Depth-first iterator over the nodes of an archive
pub struct Walk<'a> {
    reader: &'a AffReader,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeInfo;

    fn next(&mut self) -> Option<NodeInfo> {
        loop {
            let id = self.stack.pop()?;
            let Ok(node) = self.reader.node(id) else {
                continue;
            };
            self.stack.extend(node.children.iter().rev());

            match self.reader.info(id) {
                Ok(info) => return Some(info),
                Err(e) => tracing::warn!("Skipping node {}: {}", id, e),
            }
        }
    }
}

/// Open archive handle carrying the first error met
///
/// Opening never fails outright: a failed open yields a handle with its
/// diagnostic set and nothing loaded.
#[derive(Debug)]
pub struct AffHandle {
    reader: Option<AffReader>,
    error: Option<Error>,
}

impl AffHandle {
    pub fn open(path: &Path) -> Self {
        Self::open_with_config(path, &ReaderConfig::default())
    }

    pub fn open_with_config(path: &Path, config: &ReaderConfig) -> Self {
        match AffReader::open_with_config(path, config) {
            Ok(reader) => Self {
                reader: Some(reader),
                error: None,
            },
            Err(err) => {
                tracing::debug!("Opening {} failed: {}", path.display(), err);
                Self {
                    reader: None,
                    error: Some(err),
                }
            }
        }
    }

    /// First error met, if any
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn reader(&self) -> Option<&AffReader> {
        self.reader.as_ref()
    }

    pub fn reader_mut(&mut self) -> Option<&mut AffReader> {
        self.reader.as_mut()
    }

    /// Run `f` on the loaded archive; the first failure sticks and releases it
    pub fn with_reader<T>(&mut self, f: impl FnOnce(&mut AffReader) -> Result<T>) -> Option<T> {
        let reader = self.reader.as_mut()?;
        match f(reader) {
            Ok(value) => Some(value),
            Err(err) => {
                self.reader = None;
                self.error.get_or_insert(err);
                None
            }
        }
    }

    pub fn into_result(self) -> Result<AffReader> {
        match (self.reader, self.error) {
            (_, Some(err)) => Err(err),
            (Some(reader), None) => Ok(reader),
            (None, None) => Err(Error::invalid_operation("Archive handle is closed")),
        }
    }

    /// Release the archive, returning the diagnostic if there was one
    pub fn close(self) -> Option<Error> {
        self.error
    }
}
