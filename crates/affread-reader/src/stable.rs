//! String table ("stable")
//!
//! Node names are stored once in a section of null-terminated strings and
//! referenced by their insertion index.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use affread_core::{narrow_u32, validate_allocation_size, Error, Result};
use affread_pipeline::md5_of;

use crate::header::SectionDescriptor;

/// Deduplicating table of strings addressed by insertion index
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    entries: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Intern `s`, returning its index; an existing string keeps its index
    pub fn insert(&mut self, s: &str) -> Result<u32> {
        if let Some(&idx) = self.index.get(s) {
            return Ok(idx);
        }

        let idx = u32::try_from(self.entries.len())
            .map_err(|_| Error::resource("Stable construction error"))?;
        self.entries.push(s.to_owned());
        self.index.insert(s.to_owned(), idx);
        Ok(idx)
    }

    /// String at `idx`
    pub fn get(&self, idx: u32) -> Option<&str> {
        self.entries.get(idx as usize).map(String::as_str)
    }

    /// Index of `s`, if interned
    pub fn lookup(&self, s: &str) -> Option<u32> {
        self.index.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Strings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Split a stable section into its strings and intern them in order
///
/// The section must end with a terminator; the byte length, not any record
/// count, decides how many strings there are.
pub fn parse_stable(bytes: &[u8], table: &mut StringTable) -> Result<usize> {
    if bytes.last() != Some(&0) {
        return Err(Error::malformed("Malformed stable"));
    }

    let mut count = 0;
    for raw in bytes[..bytes.len() - 1].split(|&b| b == 0) {
        let s = std::str::from_utf8(raw)
            .map_err(|_| Error::malformed("Stable construction error"))?;
        table.insert(s)?;
        count += 1;
    }
    Ok(count)
}

/// Load the string table described by `section`
///
/// Seeks to the section, reads it whole, checks its digest and parses it.
/// `max_bytes` bounds the buffer allocated for the section.
pub fn load_stable<R: Read + Seek + ?Sized>(
    reader: &mut R,
    section: &SectionDescriptor,
    max_bytes: usize,
) -> Result<StringTable> {
    let byte_count = narrow_u32(section.size, "Stable too large")?;
    let byte_count = validate_allocation_size(byte_count as u64, max_bytes, "Stable")?;

    reader
        .seek(SeekFrom::Start(section.start))
        .map_err(|e| Error::read("Positioning on the string table failed", e))?;

    let mut buf = vec![0u8; byte_count];
    reader
        .read_exact(&mut buf)
        .map_err(|e| Error::read("Error reading stable", e))?;

    if md5_of(&buf) != section.md5 {
        return Err(Error::checksum("Stable checksum mismatch"));
    }

    // Every string takes at least its terminator, so the buffer bounds the hint
    let mut table = StringTable::with_capacity((section.records as usize).min(byte_count));
    let count = parse_stable(&buf, &mut table)?;

    if section.records != 0 && section.records as usize != count {
        tracing::warn!(
            "Stable declares {} records but holds {} strings",
            section.records,
            count
        );
    }
    tracing::debug!("Loaded stable: {} bytes, {} entries", byte_count, table.len());

    Ok(table)
}
