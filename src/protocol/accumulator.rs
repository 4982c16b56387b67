//! Fixed-capacity byte accumulator.
//!
//! Raw chunks from the byte source are appended at the tail; the decoder
//! drops bytes from the head with [`ByteAccumulator::consume`]. The backing
//! storage is allocated once at construction and never grows, so a noisy or
//! stalled link cannot exhaust memory.
//!
//! # Example
//!
//! ```
//! use mmwave_uart::protocol::ByteAccumulator;
//!
//! let mut acc = ByteAccumulator::with_capacity(8);
//! acc.append(&[1, 2, 3, 4]).unwrap();
//! acc.consume(2);
//! assert_eq!(acc.as_slice(), &[3, 4]);
//!
//! // Oversized chunks are rejected whole
//! assert!(acc.append(&[0; 7]).is_err());
//! assert_eq!(acc.len(), 2);
//! ```

use bytes::BytesMut;

use crate::error::{RadarError, Result};

/// Default accumulator capacity (32 KiB).
pub const DEFAULT_CAPACITY: usize = 32 * 1024;

/// Capacity-bounded, shiftable byte buffer.
///
/// Only the first `len()` bytes are valid. Everything past them is kept
/// zeroed.
pub struct ByteAccumulator {
    /// Backing storage, always exactly `capacity` bytes long.
    data: BytesMut,
    /// Count of valid bytes at the head of `data`.
    length: usize,
}

impl ByteAccumulator {
    /// Create an accumulator with the default 32 KiB capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an accumulator with a custom fixed capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::zeroed(capacity),
            length: 0,
        }
    }

    /// Append a chunk at the tail.
    ///
    /// # Errors
    ///
    /// Returns [`RadarError::BufferOverflow`] if the chunk does not fit in
    /// the remaining capacity. Nothing is written in that case.
    pub fn append(&mut self, chunk: &[u8]) -> Result<()> {
        let available = self.remaining();
        if chunk.len() > available {
            return Err(RadarError::BufferOverflow {
                chunk_len: chunk.len(),
                available,
            });
        }

        let end = self.length + chunk.len();
        self.data[self.length..end].copy_from_slice(chunk);
        self.length = end;
        Ok(())
    }

    /// Drop the first `n` bytes, shifting the rest to the head.
    ///
    /// The vacated tail is zero-filled. An `n` larger than `len()` is a
    /// no-op and returns 0; otherwise returns `n`.
    pub fn consume(&mut self, n: usize) -> usize {
        if n == 0 || n > self.length {
            return 0;
        }

        let old_length = self.length;
        self.data.copy_within(n..old_length, 0);
        self.length = old_length - n;
        self.data[self.length..old_length].fill(0);
        n
    }

    /// Valid bytes, head first.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.length]
    }

    /// Number of valid bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Check if no bytes are buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Fixed capacity set at construction.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Free bytes left before an append overflows.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.length
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.data[..self.length].fill(0);
        self.length = 0;
    }

    /// Full backing storage, including the zeroed tail.
    #[cfg(test)]
    fn raw(&self) -> &[u8] {
        &self.data
    }
}

impl Default for ByteAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ByteAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteAccumulator")
            .field("length", &self.length)
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty_with_default_capacity() {
        let acc = ByteAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.capacity(), 32768);
        assert_eq!(acc.remaining(), 32768);
    }

    #[test]
    fn test_append_accumulates_in_order() {
        let mut acc = ByteAccumulator::with_capacity(16);
        acc.append(b"abc").unwrap();
        acc.append(b"def").unwrap();
        assert_eq!(acc.as_slice(), b"abcdef");
        assert_eq!(acc.len(), 6);
        assert_eq!(acc.remaining(), 10);
    }

    #[test]
    fn test_append_exactly_to_capacity() {
        let mut acc = ByteAccumulator::with_capacity(4);
        acc.append(&[9; 4]).unwrap();
        assert_eq!(acc.len(), 4);
        assert_eq!(acc.remaining(), 0);
    }

    #[test]
    fn test_overflow_leaves_state_unchanged() {
        let mut acc = ByteAccumulator::with_capacity(8);
        acc.append(&[1, 2, 3, 4, 5]).unwrap();

        let result = acc.append(&[6, 7, 8, 9]);

        match result {
            Err(RadarError::BufferOverflow {
                chunk_len,
                available,
            }) => {
                assert_eq!(chunk_len, 4);
                assert_eq!(available, 3);
            }
            other => panic!("expected overflow, got {:?}", other),
        }
        assert_eq!(acc.len(), 5);
        assert_eq!(acc.as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(&acc.raw()[5..], &[0, 0, 0]);
    }

    #[test]
    fn test_consume_shifts_and_zero_fills() {
        let mut acc = ByteAccumulator::with_capacity(8);
        acc.append(&[1, 2, 3, 4, 5, 6]).unwrap();

        assert_eq!(acc.consume(4), 4);

        assert_eq!(acc.as_slice(), &[5, 6]);
        assert_eq!(acc.raw(), &[5, 6, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_consume_all() {
        let mut acc = ByteAccumulator::with_capacity(4);
        acc.append(&[1, 2, 3]).unwrap();
        assert_eq!(acc.consume(3), 3);
        assert!(acc.is_empty());
        assert_eq!(acc.raw(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_consume_more_than_buffered_is_noop() {
        let mut acc = ByteAccumulator::with_capacity(8);
        acc.append(&[1, 2, 3]).unwrap();

        assert_eq!(acc.consume(4), 0);
        assert_eq!(acc.as_slice(), &[1, 2, 3]);

        assert_eq!(acc.consume(0), 0);
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_append_after_consume_reuses_space() {
        let mut acc = ByteAccumulator::with_capacity(4);
        acc.append(&[1, 2, 3, 4]).unwrap();
        acc.consume(2);
        acc.append(&[5, 6]).unwrap();
        assert_eq!(acc.as_slice(), &[3, 4, 5, 6]);
    }

    #[test]
    fn test_clear() {
        let mut acc = ByteAccumulator::with_capacity(4);
        acc.append(&[1, 2]).unwrap();
        acc.clear();
        assert!(acc.is_empty());
        assert_eq!(acc.raw(), &[0, 0, 0, 0]);
    }
}
