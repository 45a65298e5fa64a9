//! CRC-32 checksum utilities.
//!
//! ZIP entries carry an IEEE 802.3 CRC-32 over their decompressed bytes.
//! The repackager recomputes these when rewriting entries in STORED mode and
//! verifies them against the source archive.
//!
//! # Example
//!
//! ```rust
//! use apkscrub::checksum::Crc32;
//!
//! // Incremental computation
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), 0xEC4AC3D0);
//!
//! // One-shot computation
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

use std::io::{self, Read};

use crate::READ_BUFFER_SIZE;

/// CRC-32 checksum calculator.
///
/// Uses the IEEE 802.3 polynomial, the checksum format ZIP archives record
/// per entry.
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Crc32 {
    /// Creates a new CRC-32 calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the checksum with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finishes the computation and returns the value.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Resets the checksum to its initial state.
    pub fn reset(&mut self) {
        self.hasher.reset();
    }

    /// Computes the checksum of a single slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Computes the checksum by draining a reader.
    pub fn compute_reader<R: Read>(reader: &mut R) -> io::Result<u32> {
        let mut hasher = Self::new();
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(hasher.finalize())
    }
}

/// A reader wrapper that computes CRC-32 while reading.
///
/// # Example
///
/// ```rust
/// use apkscrub::checksum::Crc32Reader;
/// use std::io::{Cursor, Read};
///
/// let mut reader = Crc32Reader::new(Cursor::new(b"Hello, World!"));
/// let mut buffer = Vec::new();
/// reader.read_to_end(&mut buffer).unwrap();
///
/// assert_eq!(reader.crc(), 0xEC4AC3D0);
/// assert_eq!(reader.bytes_read(), 13);
/// ```
pub struct Crc32Reader<R> {
    inner: R,
    crc: Crc32,
    bytes_read: u64,
}

impl<R> Crc32Reader<R> {
    /// Creates a new CRC-32 reader wrapping the given reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
            bytes_read: 0,
        }
    }

    /// Returns the current CRC-32 value.
    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    /// Returns the number of bytes read.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Consumes the wrapper and returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Crc32Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.crc.update(&buf[..n]);
        self.bytes_read += n as u64;
        Ok(n)
    }
}
