//! Random-access byte sources feeding the catalog reader.
//!
//! A catalog does bounded reads at explicit offsets, so the source contract
//! is narrower than `std::io::Read`: every read returns exactly the
//! requested number of bytes or fails. Two implementations are provided, a
//! file-backed one and an in-memory one; both behave identically at the
//! contract level.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use crate::error::Error;

/// A random-access byte provider with bounded, exact reads.
///
/// Sources are exclusively owned by one catalog instance; the cursor moves
/// on every read, so handles must not be shared.
pub trait ByteSource {
    /// Reads exactly `n` bytes at the current position.
    ///
    /// Returns `Error::TruncatedRead` if fewer than `n` bytes remain.
    /// Reading zero bytes succeeds without touching the underlying source.
    fn read(&mut self, n: usize) -> Result<Vec<u8>, Error>;

    /// Moves the cursor to `offset` and returns the new position.
    fn seek_to(&mut self, offset: u64) -> Result<u64, Error>;

    /// Current cursor position.
    fn position(&self) -> u64;

    /// Total number of bytes in the source.
    fn len(&self) -> u64;

    /// Whether the source holds no bytes at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A `ByteSource` backed by an open file.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    pos: u64,
    length: u64,
}

impl FileSource {
    /// Opens `path` for reading and captures its length.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = File::open(path)?;
        let length = file.metadata()?.len();
        Ok(FileSource {
            file,
            pos: 0,
            length,
        })
    }
}

impl ByteSource for FileSource {
    fn read(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut buf = vec![0u8; n];
        self.file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::TruncatedRead {
                    offset: self.pos,
                    requested: n,
                }
            } else {
                Error::Io(e)
            }
        })?;
        self.pos += n as u64;
        Ok(buf)
    }

    fn seek_to(&mut self, offset: u64) -> Result<u64, Error> {
        self.pos = self.file.seek(SeekFrom::Start(offset))?;
        Ok(self.pos)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn len(&self) -> u64 {
        self.length
    }
}

/// A `ByteSource` over an owned in-memory buffer.
///
/// Seeks past the end clamp to the buffer length; the subsequent read then
/// fails with `Error::TruncatedRead`.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: u64,
}

impl MemorySource {
    pub fn new(data: Vec<u8>) -> Self {
        MemorySource { data, pos: 0 }
    }
}

impl From<Vec<u8>> for MemorySource {
    fn from(data: Vec<u8>) -> Self {
        MemorySource::new(data)
    }
}

impl From<&[u8]> for MemorySource {
    fn from(data: &[u8]) -> Self {
        MemorySource::new(data.to_vec())
    }
}

impl ByteSource for MemorySource {
    fn read(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let start = self.pos as usize;
        let end = start.checked_add(n).filter(|&e| e <= self.data.len());
        match end {
            Some(end) => {
                let out = self.data[start..end].to_vec();
                self.pos = end as u64;
                Ok(out)
            }
            None => Err(Error::TruncatedRead {
                offset: self.pos,
                requested: n,
            }),
        }
    }

    fn seek_to(&mut self, offset: u64) -> Result<u64, Error> {
        self.pos = offset.min(self.data.len() as u64);
        Ok(self.pos)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}
