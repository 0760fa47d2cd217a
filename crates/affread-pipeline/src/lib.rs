//! # affread Pipeline
//!
//! Stream wrappers used while loading AFF archive sections.
//!
//! - **PartialPipeline**: seekable window over one section of the archive
//! - **DigestPipeline**: bounded reader that hashes every byte it yields
//!
//! ## Example
//!
//! ```rust
//! use affread_pipeline::{md5_of, DigestPipeline};
//! use std::io::{Cursor, Read};
//!
//! let section = b"tree records".to_vec();
//! let mut pipe = DigestPipeline::new(Cursor::new(section.clone()), section.len() as u64);
//!
//! let mut head = [0u8; 4];
//! pipe.read_exact(&mut head).unwrap();
//! let mut rest = Vec::new();
//! pipe.read_to_end(&mut rest).unwrap();
//!
//! assert_eq!(pipe.finalize(), md5_of(&section));
//! ```

pub mod digest;
pub mod partial;

pub use digest::{md5_of, md5_of_parts, DigestPipeline};
pub use partial::PartialPipeline;
