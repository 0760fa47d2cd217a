//! Digest pipeline - a bounded reader that hashes every byte it yields
//!
//! Section loaders decode records straight from the file while the running
//! MD5 covers exactly the bytes consumed.

use std::io::{self, Read};

use affread_core::Digest16;
use md5::{Digest, Md5};

/// Reader limited to `limit` bytes that feeds everything it returns into MD5.
pub struct DigestPipeline<R: Read> {
    inner: R,
    remaining: u64,
    consumed: u64,
    hasher: Md5,
}

impl<R: Read> DigestPipeline<R> {
    /// Wrap `inner`, allowing at most `limit` bytes to be read through it
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
            consumed: 0,
            hasher: Md5::new(),
        }
    }

    /// Bytes still available before the limit
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Bytes consumed (and hashed) so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Finish hashing and return the digest of all consumed bytes
    pub fn finalize(self) -> Digest16 {
        self.hasher.finalize().into()
    }

    /// Consume whatever is left up to the limit; returns the number of bytes read
    pub fn drain(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }
}

impl<R: Read> Read for DigestPipeline<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }

        let to_read = (buf.len() as u64).min(self.remaining) as usize;
        let n = self.inner.read(&mut buf[..to_read])?;

        self.hasher.update(&buf[..n]);
        self.remaining -= n as u64;
        self.consumed += n as u64;
        Ok(n)
    }
}

/// MD5 of a byte slice
pub fn md5_of(data: &[u8]) -> Digest16 {
    Md5::digest(data).into()
}

/// MD5 over several slices, in order
pub fn md5_of_parts(parts: &[&[u8]]) -> Digest16 {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
