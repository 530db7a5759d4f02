//! Chunked big-endian reader over a live byte channel.
//!
//! [`ChunkedReader`] owns a fixed-capacity buffer that is topped up from any
//! `Read` implementation (file, socket, pipe). Every fixed-width decode
//! first calls [`ChunkedReader::ensure`], which compacts the unread tail to
//! the front of the buffer and reads from the channel until enough bytes
//! are contiguous. Variable-length payloads stream through the buffer in
//! pieces, so they may be larger than the buffer itself.
//!
//! The reader also hosts the running content digest: while a digest is
//! active, every byte that leaves the buffer through consumption is fed to
//! a blake3 hasher at compaction time and when the digest is finished.

use std::io::{ErrorKind, Read};

use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use crate::error::{ParseError, Result};

/// Default buffer capacity.
pub const DEFAULT_CAPACITY: usize = 256 * 1024;

/// Smallest buffer the reader accepts; fits every fixed-width decode.
pub const MIN_CAPACITY: usize = 16;

struct RunningDigest {
    hasher: blake3::Hasher,
    /// Buffer offset where the not-yet-hashed consumed bytes begin.
    mark: usize,
}

pub struct ChunkedReader<R> {
    channel: R,
    buffer: Box<[u8]>,
    /// Next unread byte.
    position: usize,
    /// End of valid data.
    limit: usize,
    /// Stream offset of `buffer[0]`.
    base_offset: u64,
    refills: usize,
    digest: Option<RunningDigest>,
}

impl<R: Read> ChunkedReader<R> {
    pub fn new(channel: R) -> Self {
        Self::with_capacity(channel, DEFAULT_CAPACITY)
    }

    /// Creates a reader with a `capacity`-byte buffer (at least [`MIN_CAPACITY`]).
    pub fn with_capacity(channel: R, capacity: usize) -> Self {
        ChunkedReader {
            channel,
            buffer: vec![0u8; capacity.max(MIN_CAPACITY)].into_boxed_slice(),
            position: 0,
            limit: 0,
            base_offset: 0,
            refills: 0,
            digest: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Total number of bytes consumed from the stream so far.
    pub fn stream_offset(&self) -> u64 {
        self.base_offset + self.position as u64
    }

    /// Number of compact-and-refill cycles performed so far.
    pub fn refill_count(&self) -> usize {
        self.refills
    }

    /// Bytes buffered but not yet consumed.
    pub fn available(&self) -> usize {
        self.limit - self.position
    }

    pub fn into_inner(self) -> R {
        self.channel
    }

    /// Guarantees that `n` bytes are contiguously available at the read
    /// position, refilling from the channel if necessary.
    pub fn ensure(&mut self, n: usize) -> Result<()> {
        if n > self.buffer.len() {
            return Err(ParseError::ExceedsCapacity {
                requested: n,
                capacity: self.buffer.len(),
            });
        }
        if self.available() >= n {
            return Ok(());
        }

        self.compact();
        while self.limit < n {
            match self.channel.read(&mut self.buffer[self.limit..]) {
                Ok(0) => {
                    return Err(ParseError::EndOfStream {
                        needed: n,
                        available: self.limit,
                    })
                }
                Ok(read) => self.limit += read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        trace!(
            offset = self.base_offset,
            buffered = self.limit,
            "refilled read buffer"
        );
        Ok(())
    }

    /// Moves the unread tail to the front of the buffer.
    fn compact(&mut self) {
        if let Some(digest) = self.digest.as_mut() {
            digest.hasher.update(&self.buffer[digest.mark..self.position]);
            digest.mark = 0;
        }
        self.buffer.copy_within(self.position..self.limit, 0);
        self.base_offset += self.position as u64;
        self.limit -= self.position;
        self.position = 0;
        self.refills += 1;
    }

    fn take(&mut self, n: usize) -> Result<&[u8]> {
        self.ensure(n)?;
        let start = self.position;
        self.position += n;
        Ok(&self.buffer[start..start + n])
    }

    // -----------------------------------------------------------------------
    // Fixed-width decoders
    // -----------------------------------------------------------------------

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.take(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8)?))
    }

    // -----------------------------------------------------------------------
    // Length-prefixed payloads
    // -----------------------------------------------------------------------

    /// Reads an `i32` length followed by that many bytes. A negative length
    /// is the "absent" sentinel and yields `None`.
    pub fn read_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        let len = self.read_i32()?;
        if len < 0 {
            return Ok(None);
        }
        let len = len as usize;
        let mut out = Vec::with_capacity(len.min(self.buffer.len()));
        while out.len() < len {
            self.ensure(1)?;
            let chunk = (len - out.len()).min(self.available());
            out.extend_from_slice(&self.buffer[self.position..self.position + chunk]);
            self.position += chunk;
        }
        Ok(Some(out))
    }

    /// Reads a length-prefixed UTF-8 string. Invalid sequences are replaced
    /// rather than rejected.
    pub fn read_string(&mut self) -> Result<Option<String>> {
        Ok(self.read_bytes()?.map(|bytes| match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }))
    }

    // -----------------------------------------------------------------------
    // Content digest
    // -----------------------------------------------------------------------

    /// Starts hashing every byte consumed from now on, discarding any
    /// digest already in progress.
    pub fn begin_digest(&mut self) {
        self.digest = Some(RunningDigest {
            hasher: blake3::Hasher::new(),
            mark: self.position,
        });
    }

    pub fn is_digesting(&self) -> bool {
        self.digest.is_some()
    }

    /// Finishes the active digest over the bytes consumed since
    /// [`begin_digest`](Self::begin_digest).
    pub fn finish_digest(&mut self) -> Option<blake3::Hash> {
        let mut digest = self.digest.take()?;
        digest
            .hasher
            .update(&self.buffer[digest.mark..self.position]);
        Some(digest.hasher.finalize())
    }
}
