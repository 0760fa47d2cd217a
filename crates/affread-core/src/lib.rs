//! # affread Core
//!
//! Core types, traits, and error handling shared by the AFF reader crates.
//!
//! - **Error**: first-error diagnostics produced while loading an archive
//! - **NodeKind**: payload kind of a tree node
//! - **Security**: allocation and overflow guards for values read from disk
//!
//! ## Example
//!
//! ```rust
//! use affread_core::{Error, NodeKind, Result};
//!
//! fn kind_of(tag: u8) -> Result<NodeKind> {
//!     NodeKind::from_tag(tag).ok_or_else(|| Error::malformed("Error decoding the node record"))
//! }
//!
//! assert_eq!(kind_of(3).unwrap(), NodeKind::Double);
//! assert!(kind_of(9).is_err());
//! ```

pub mod error;
pub mod security;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::{Error, Result};
pub use security::*;
pub use traits::ReadSeek;
pub use types::{Digest16, NodeInfo, NodeKind};
