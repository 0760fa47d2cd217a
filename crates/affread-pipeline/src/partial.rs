//! Partial pipeline - a seekable window over one archive section

use std::io::{self, Read, Seek, SeekFrom};

/// A pipeline that exposes only one section of an underlying archive stream.
///
/// Positions are relative to the section start; reads stop at the section end
/// even when the file continues.
///
/// # Example
///
/// ```rust
/// use affread_pipeline::PartialPipeline;
/// use std::io::{Cursor, Read};
///
/// let archive: Vec<u8> = (0..64).collect();
///
/// // Data section occupying bytes 32..48
/// let mut section = PartialPipeline::new(Cursor::new(archive), 32, 16).unwrap();
/// let mut buf = Vec::new();
/// section.read_to_end(&mut buf).unwrap();
/// assert_eq!(buf.len(), 16);
/// assert_eq!(buf[0], 32);
/// ```
pub struct PartialPipeline<R: Read + Seek> {
    inner: R,
    start: u64,
    length: u64,
    position: u64,
}

impl<R: Read + Seek> PartialPipeline<R> {
    /// Create a window of `length` bytes starting at absolute offset `start`
    ///
    /// # Errors
    ///
    /// Returns an error if seeking to the start position fails
    pub fn new(mut inner: R, start: u64, length: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;

        Ok(Self {
            inner,
            start,
            length,
            position: 0,
        })
    }

    /// Absolute offset of the window start
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Length of the window
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Current position relative to the window start
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left between the current position and the window end
    pub fn remaining(&self) -> u64 {
        self.length.saturating_sub(self.position)
    }

    /// Whether `len` bytes at archive offset `offset` lie inside the window
    pub fn contains(&self, offset: u64, len: u64) -> bool {
        offset
            .checked_sub(self.start)
            .and_then(|relative| relative.checked_add(len))
            .is_some_and(|end| end <= self.length)
    }

    /// Position the window at archive offset `offset`
    ///
    /// Returns the position relative to the window start.
    pub fn seek_absolute(&mut self, offset: u64) -> io::Result<u64> {
        let relative = offset.checked_sub(self.start).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "Seek before beginning of section")
        })?;
        self.seek(SeekFrom::Start(relative))
    }
}

impl<R: Read + Seek> Read for PartialPipeline<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(0);
        }

        let to_read = (buf.len() as u64).min(remaining) as usize;

        // The inner stream may be shared with other readers between calls
        self.inner.seek(SeekFrom::Start(self.start + self.position))?;
        let bytes_read = self.inner.read(&mut buf[..to_read])?;

        self.position += bytes_read as u64;
        Ok(bytes_read)
    }
}

impl<R: Read + Seek> Seek for PartialPipeline<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(offset) => self.length.checked_add_signed(offset),
            SeekFrom::Current(offset) => self.position.checked_add_signed(offset),
        };

        match new_pos {
            Some(p) if p <= self.length => {
                self.position = p;
                Ok(p)
            }
            Some(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Seek beyond end of section",
            )),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Seek before beginning of section",
            )),
        }
    }
}
