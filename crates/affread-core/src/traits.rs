//! Core traits for AFF readers

use std::io::{Read, Seek};

/// Combined trait for Read + Seek
///
/// Archives are read from any seekable byte source: a `File` in production,
/// a `Cursor<Vec<u8>>` in tests.
pub trait ReadSeek: Read + Seek + Send {}

/// Blanket implementation for any type that implements Read + Seek
impl<T: Read + Seek + Send> ReadSeek for T {}
