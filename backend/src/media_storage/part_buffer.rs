//! Re-chunks an arbitrary byte stream into fixed-size multipart parts

use bytes::{Bytes, BytesMut};

/// Smallest part size S3 accepts for every part except the last one
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Holds at most one part worth of bytes plus the chunk being pushed
#[derive(Debug)]
pub struct PartBuffer {
    part_size: usize,
    buffer: BytesMut,
}

impl PartBuffer {
    /// Creates a buffer emitting parts of exactly `part_size` bytes
    #[must_use]
    pub fn new(part_size: usize) -> Self {
        Self {
            part_size,
            buffer: BytesMut::with_capacity(part_size),
        }
    }

    /// Appends a chunk read from the source stream
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Splits off the next full part, if one is available
    pub fn next_full_part(&mut self) -> Option<Bytes> {
        (self.buffer.len() >= self.part_size).then(|| self.buffer.split_to(self.part_size).freeze())
    }

    /// Returns whatever is left as the final part, possibly empty
    #[must_use]
    pub fn finish(self) -> Bytes {
        self.buffer.freeze()
    }
}
