//! Streaming frame decoder.
//!
//! Owns a [`ByteAccumulator`] and extracts at most one frame per call:
//! - `Searching`: need more than 16 bytes, then locate the first magic word
//! - `Resynced`: noise before the magic word has been dropped
//! - `LengthCheck`: wait until `total_packet_length` bytes are buffered
//! - `Decoding`: header and TLV walk over exactly one frame
//! - `Consumed`: the frame's bytes are compacted out of the buffer
//!
//! No call blocks. [`ParseOutcome::NoFrame`] and [`ParseOutcome::Incomplete`]
//! both mean "append more bytes and call again".
//!
//! # Example
//!
//! ```
//! use mmwave_uart::protocol::{FrameBuilder, FrameDecoder, ParseOutcome};
//!
//! let bytes = FrameBuilder::new(1).build();
//! let mut decoder = FrameDecoder::new();
//!
//! // Noise, then the frame split across two reads
//! assert!(matches!(decoder.push(&[0xFF; 20]), ParseOutcome::NoFrame));
//! assert!(matches!(decoder.push(&bytes[..30]), ParseOutcome::Incomplete));
//! match decoder.push(&bytes[30..]) {
//!     ParseOutcome::Frame(frame) => assert_eq!(frame.frame_number, 1),
//!     other => panic!("unexpected {:?}", other),
//! }
//! assert!(decoder.is_empty());
//! ```

use super::accumulator::{ByteAccumulator, DEFAULT_CAPACITY};
use super::frame::{DetectedObjectSet, RadarFrame};
use super::wire_format::{
    read_f32_le, read_u32_le, FrameHeader, TlvHeader, DETECTED_POINT_SIZE,
    HEADER_SIZE, MAGIC_WORD, MAGIC_WORD_SIZE, TLV_HEADER_SIZE, TOTAL_PACKET_LENGTH_OFFSET,
};
use crate::error::Result;

/// Buffered bytes required before a magic word search is attempted.
pub const MIN_SEARCH_LEN: usize = 16;

/// Result of one decode attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// No magic word buffered, or not enough bytes to look for one.
    NoFrame,
    /// Magic word found, fewer than `total_packet_length` bytes buffered.
    Incomplete,
    /// A complete frame was decoded and consumed.
    Frame(RadarFrame),
    /// The incoming chunk did not fit; it was discarded and the buffer is unchanged.
    BufferOverflow,
}

impl ParseOutcome {
    /// Take the decoded frame, if any.
    pub fn into_frame(self) -> Option<RadarFrame> {
        match self {
            ParseOutcome::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Check if this outcome carries a frame.
    #[inline]
    pub fn is_frame(&self) -> bool {
        matches!(self, ParseOutcome::Frame(_))
    }
}

/// Running counters for one decoder session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames successfully decoded.
    pub frames_decoded: u64,
    /// Bytes dropped while resynchronizing (noise and malformed headers).
    pub bytes_discarded: u64,
    /// Chunks rejected because they did not fit.
    pub overflows: u64,
    /// Headers rejected for an impossible `total_packet_length`.
    pub malformed_frames: u64,
    /// TLV walks stopped early because a record ran past the frame end.
    pub truncated_tlvs: u64,
}

/// Offsets of every full magic word in `buf`, ascending.
///
/// A magic word straddling the end of `buf` is not reported.
pub fn magic_word_offsets(buf: &[u8]) -> impl Iterator<Item = usize> + '_ {
    buf.iter()
        .enumerate()
        .filter(|&(_, &b)| b == MAGIC_WORD[0])
        .map(|(i, _)| i)
        .filter(move |&i| buf.get(i..i + MAGIC_WORD_SIZE) == Some(&MAGIC_WORD[..]))
}

/// Stateful decoder for the radar UART stream.
pub struct FrameDecoder {
    /// Not-yet-consumed stream bytes.
    buffer: ByteAccumulator,
    /// Session counters.
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a decoder with the default 32 KiB buffer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a decoder with a custom fixed buffer capacity.
    ///
    /// Frames whose `total_packet_length` exceeds the capacity can never be
    /// buffered and are treated as malformed.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: ByteAccumulator::with_capacity(capacity),
            stats: DecoderStats::default(),
        }
    }

    /// Append a chunk and attempt to decode one frame.
    ///
    /// Returns [`ParseOutcome::BufferOverflow`] if the chunk does not fit;
    /// the chunk is dropped and no decode is attempted.
    pub fn push(&mut self, chunk: &[u8]) -> ParseOutcome {
        if self.append(chunk).is_err() {
            return ParseOutcome::BufferOverflow;
        }
        self.decode_next()
    }

    /// Append a chunk without decoding.
    ///
    /// # Errors
    ///
    /// Returns [`RadarError::BufferOverflow`](crate::RadarError::BufferOverflow)
    /// if the chunk does not fit. Buffered bytes are unchanged.
    pub fn append(&mut self, chunk: &[u8]) -> Result<()> {
        if let Err(e) = self.buffer.append(chunk) {
            self.stats.overflows += 1;
            tracing::warn!("{}, chunk not added to the buffer", e);
            return Err(e);
        }
        Ok(())
    }

    /// Attempt to decode exactly one frame from the buffered bytes.
    pub fn decode_next(&mut self) -> ParseOutcome {
        if self.buffer.len() <= MIN_SEARCH_LEN {
            return ParseOutcome::NoFrame;
        }

        let start = match magic_word_offsets(self.buffer.as_slice()).next() {
            Some(start) => start,
            None => {
                tracing::trace!("Magic word not found in {} bytes", self.buffer.len());
                return ParseOutcome::NoFrame;
            }
        };

        if start > 0 {
            tracing::debug!("Discarding {} bytes before magic word", start);
            self.discard(start);
        }

        let total = match read_u32_le(self.buffer.as_slice(), TOTAL_PACKET_LENGTH_OFFSET) {
            Some(total) => total as usize,
            None => return ParseOutcome::Incomplete,
        };

        if total < HEADER_SIZE || total > self.buffer.capacity() {
            tracing::warn!(
                "Malformed total packet length {} (header {}, capacity {}), resyncing past magic word",
                total,
                HEADER_SIZE,
                self.buffer.capacity()
            );
            self.stats.malformed_frames += 1;
            self.discard(MAGIC_WORD_SIZE);
            return ParseOutcome::NoFrame;
        }

        if self.buffer.len() < total {
            return ParseOutcome::Incomplete;
        }

        let buffered = self.buffer.as_slice();
        let header = match FrameHeader::decode(buffered) {
            Some(header) => header,
            None => return ParseOutcome::Incomplete,
        };
        let (detected_objects, walk) = walk_tlvs(&header, buffered);

        if let TlvWalk::Truncated { index, cursor } = walk {
            tracing::warn!(
                "TLV {} of frame {} runs past the buffered bytes at offset {} (frame length {})",
                index,
                header.frame_number,
                cursor,
                total
            );
            self.stats.truncated_tlvs += 1;
        }

        // The declared length is authoritative, not where the TLV cursor stopped.
        self.buffer.consume(total);
        self.stats.frames_decoded += 1;

        tracing::trace!(
            "Decoded frame {} with {} objects",
            header.frame_number,
            detected_objects.len()
        );

        ParseOutcome::Frame(RadarFrame::new(header, detected_objects))
    }

    /// Decode every complete frame currently buffered.
    ///
    /// Keeps going through malformed headers as long as each attempt makes
    /// progress.
    pub fn drain(&mut self) -> Vec<RadarFrame> {
        let mut frames = Vec::new();
        loop {
            let before = self.buffer.len();
            match self.decode_next() {
                ParseOutcome::Frame(frame) => frames.push(frame),
                _ if self.buffer.len() < before => continue,
                _ => break,
            }
        }
        frames
    }

    /// Drop bytes that cannot be the start of a frame.
    ///
    /// Everything before the first magic word is removed. With no magic word
    /// buffered, everything but the last `MAGIC_WORD_SIZE - 1` bytes is
    /// removed so a marker split across reads still matches. Returns the
    /// number of bytes dropped.
    pub fn discard_noise(&mut self) -> usize {
        let len = self.buffer.len();
        let keep_from = magic_word_offsets(self.buffer.as_slice())
            .next()
            .unwrap_or_else(|| len.saturating_sub(MAGIC_WORD_SIZE - 1));
        self.discard(keep_from)
    }

    /// Buffered bytes.
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Number of buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing is buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Fixed buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Free buffer space.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    /// Session counters.
    #[inline]
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Drop all buffered bytes. Counters are kept.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn discard(&mut self, n: usize) -> usize {
        let dropped = self.buffer.consume(n);
        self.stats.bytes_discarded += dropped as u64;
        dropped
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("buffer", &self.buffer)
            .field("stats", &self.stats)
            .finish()
    }
}

/// How the TLV walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlvWalk {
    Complete,
    Truncated { index: u32, cursor: usize },
}

/// Walk the TLV records of one complete frame.
///
/// `buffered` starts with the frame's magic word and holds at least
/// `total_packet_length` bytes. Every TLV must start inside the frame. The
/// cursor advances by the declared TLV length, so unknown records are skipped
/// and later records stay aligned. Detected points are read from the cursor
/// for `num_detected_objects` records even when the TLV declares less.
fn walk_tlvs(header: &FrameHeader, buffered: &[u8]) -> (DetectedObjectSet, TlvWalk) {
    let total = header.total_packet_length as usize;
    let mut objects = DetectedObjectSet::default();
    let mut cursor = HEADER_SIZE;

    for index in 0..header.num_tlvs {
        if cursor >= total {
            return (objects, TlvWalk::Truncated { index, cursor });
        }
        let tlv = match TlvHeader::decode_at(buffered, cursor) {
            Some(tlv) => tlv,
            None => return (objects, TlvWalk::Truncated { index, cursor }),
        };

        let payload_start = cursor + TLV_HEADER_SIZE;
        let declared_end = payload_start.saturating_add(tlv.length as usize);

        cursor = if tlv.is_detected_points() {
            let count = header.num_detected_objects;
            let records_end = (count as usize)
                .checked_mul(DETECTED_POINT_SIZE)
                .and_then(|len| payload_start.checked_add(len));
            let records = match records_end.and_then(|end| buffered.get(payload_start..end)) {
                Some(records) => records,
                None => return (objects, TlvWalk::Truncated { index, cursor }),
            };
            if let Some(points) = decode_detected_points(records, count) {
                objects = points;
            }
            declared_end.max(payload_start + records.len())
        } else {
            tracing::trace!("Skipping TLV type {} ({} bytes)", tlv.tlv_type, tlv.length);
            declared_end
        };

        if cursor > buffered.len() {
            return (objects, TlvWalk::Truncated { index, cursor });
        }
    }

    (objects, TlvWalk::Complete)
}

/// Decode `count` records of (x, y, z, velocity) little-endian floats.
///
/// Returns `None` if `records` is shorter than `16 * count` bytes.
fn decode_detected_points(records: &[u8], count: u32) -> Option<DetectedObjectSet> {
    let count = count as usize;
    if count.checked_mul(DETECTED_POINT_SIZE)? > records.len() {
        return None;
    }

    let mut points = DetectedObjectSet::with_capacity(count);
    for record in records.chunks_exact(DETECTED_POINT_SIZE).take(count) {
        points.push(
            read_f32_le(record, 0)?,
            read_f32_le(record, 4)?,
            read_f32_le(record, 8)?,
            read_f32_le(record, 12)?,
        );
    }
    Some(points)
}
