//! # affread Reader
//!
//! Reader for AFF archive containers.
//!
//! An archive is a fixed-size signature and header followed by three sections:
//! - **data**: node payloads, read on demand
//! - **stable**: the string table holding every node name once
//! - **tree**: a flat list of node records rebuilt into a tree
//!
//! Every section carries an MD5 digest in the header, which is itself
//! digested. Opening verifies the header, the stable and the tree; the data
//! section is verified on request.
//!
//! ## Example
//!
//! ```rust,no_run
//! use affread_reader::{AffHandle, AffReader};
//! use std::path::Path;
//!
//! let archive = AffReader::open(Path::new("run.aff")).unwrap();
//! for node in archive.walk() {
//!     println!("{}", node);
//! }
//!
//! // Or keep the first error on the handle
//! let handle = AffHandle::open(Path::new("broken.aff"));
//! if let Some(err) = handle.error() {
//!     eprintln!("open failed: {}", err);
//! }
//! ```

pub mod codec;
pub mod config;
pub mod data;
pub mod detect;
pub mod header;
pub mod reader;
pub mod signature;
pub mod stable;
pub mod tree;

#[cfg(test)]
pub(crate) mod fixture;

pub use config::ReaderConfig;
pub use data::NodeData;
pub use detect::{detect_version, supported_versions};
pub use header::{AffHeader, SectionDescriptor, SectionKind};
pub use reader::{AffHandle, AffReader, Walk};
pub use signature::{parse_signature, HeaderVersion};
pub use stable::StringTable;
pub use tree::{Node, NodeId, Tree, ROOT_ID};
