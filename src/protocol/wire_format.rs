//! Wire format encoding and decoding.
//!
//! Every frame starts with an 8-byte magic word followed by a fixed header:
//! ```text
//! ┌────────────┬─────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐
//! │ Magic word │ Version │ TotalLen │ Platform │ FrameNum │ CpuCycles│ NumObj   │ NumTLVs  │ SubFrame │
//! │ 8 bytes    │ u32 LE  │ u32 LE   │ u32 LE   │ u32 LE   │ u32 LE   │ u32 LE   │ u32 LE   │ u32 LE   │
//! └────────────┴─────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! The header is followed by `num_tlvs` TLV records:
//! ```text
//! ┌──────────┬──────────┬─────────────────┐
//! │ Type     │ Length   │ Payload         │
//! │ u32 LE   │ u32 LE   │ `length` bytes  │
//! └──────────┴──────────┴─────────────────┘
//! ```
//!
//! All multi-byte integers are Little Endian.

use serde::{Deserialize, Serialize};

/// Frame start marker emitted by the sensor firmware.
pub const MAGIC_WORD: [u8; 8] = [2, 1, 4, 3, 6, 5, 8, 7];

/// Magic word length in bytes.
pub const MAGIC_WORD_SIZE: usize = 8;

/// Header size in bytes, magic word included (fixed, exactly 40).
pub const HEADER_SIZE: usize = MAGIC_WORD_SIZE + 8 * 4;

/// Byte offset of the `total_packet_length` field.
pub const TOTAL_PACKET_LENGTH_OFFSET: usize = 12;

/// TLV sub-header size in bytes (type + length).
pub const TLV_HEADER_SIZE: usize = 8;

/// Size of one detected point record (x, y, z, velocity as f32).
pub const DETECTED_POINT_SIZE: usize = 16;

/// Known TLV type identifiers.
pub mod tlv_type {
    /// List of detected points (x, y, z, velocity).
    pub const DETECTED_POINTS: u32 = 1;
}

/// Read a little-endian u32 at `offset`.
///
/// Returns `None` if fewer than 4 bytes are available.
#[inline]
pub fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a little-endian IEEE-754 f32 at `offset`.
///
/// The four bytes are reinterpreted as a float bit pattern, not converted
/// from an integer.
#[inline]
pub fn read_f32_le(buf: &[u8], offset: usize) -> Option<f32> {
    read_u32_le(buf, offset).map(f32::from_bits)
}

/// Decoded frame header (the 8 fields after the magic word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameHeader {
    /// SDK version reported by the firmware.
    pub version: u32,
    /// Total frame length in bytes, header and all TLVs included.
    pub total_packet_length: u32,
    /// Device platform identifier.
    pub platform: u32,
    /// Monotonic frame counter.
    pub frame_number: u32,
    /// CPU timestamp in cycles.
    pub time_cpu_cycles: u32,
    /// Number of detected objects carried by the DETECTED_POINTS TLV.
    pub num_detected_objects: u32,
    /// Number of TLV records following the header.
    pub num_tlvs: u32,
    /// Sub-frame index (advanced frame configurations).
    pub sub_frame_number: u32,
}

impl FrameHeader {
    /// Encode header to bytes (magic word included).
    ///
    /// # Example
    ///
    /// ```
    /// use mmwave_uart::protocol::{FrameHeader, HEADER_SIZE, MAGIC_WORD};
    ///
    /// let header = FrameHeader { frame_number: 7, ..Default::default() };
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), HEADER_SIZE);
    /// assert_eq!(&bytes[..8], &MAGIC_WORD);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (40 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[0..8].copy_from_slice(&MAGIC_WORD);
        buf[8..12].copy_from_slice(&self.version.to_le_bytes());
        buf[12..16].copy_from_slice(&self.total_packet_length.to_le_bytes());
        buf[16..20].copy_from_slice(&self.platform.to_le_bytes());
        buf[20..24].copy_from_slice(&self.frame_number.to_le_bytes());
        buf[24..28].copy_from_slice(&self.time_cpu_cycles.to_le_bytes());
        buf[28..32].copy_from_slice(&self.num_detected_objects.to_le_bytes());
        buf[32..36].copy_from_slice(&self.num_tlvs.to_le_bytes());
        buf[36..40].copy_from_slice(&self.sub_frame_number.to_le_bytes());
    }

    /// Decode header from bytes starting at the magic word.
    ///
    /// The magic word itself is not checked here; the decoder has already
    /// located it. Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        let mut cursor = MAGIC_WORD_SIZE;
        let mut next = || {
            let value = read_u32_le(buf, cursor);
            cursor += 4;
            value
        };
        Some(Self {
            version: next()?,
            total_packet_length: next()?,
            platform: next()?,
            frame_number: next()?,
            time_cpu_cycles: next()?,
            num_detected_objects: next()?,
            num_tlvs: next()?,
            sub_frame_number: next()?,
        })
    }
}

/// TLV sub-header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvHeader {
    /// Record type (see [`tlv_type`]).
    pub tlv_type: u32,
    /// Payload length in bytes, excluding this sub-header.
    pub length: u32,
}

impl TlvHeader {
    /// Create a new TLV header.
    pub fn new(tlv_type: u32, length: u32) -> Self {
        Self { tlv_type, length }
    }

    /// Encode TLV header to bytes.
    pub fn encode(&self) -> [u8; TLV_HEADER_SIZE] {
        let mut buf = [0u8; TLV_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.tlv_type.to_le_bytes());
        buf[4..8].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    /// Decode a TLV header at `offset`.
    ///
    /// Returns `None` if fewer than 8 bytes are available.
    pub fn decode_at(buf: &[u8], offset: usize) -> Option<Self> {
        Some(Self {
            tlv_type: read_u32_le(buf, offset)?,
            length: read_u32_le(buf, offset + 4)?,
        })
    }

    /// Check if this record carries detected points.
    #[inline]
    pub fn is_detected_points(&self) -> bool {
        self.tlv_type == tlv_type::DETECTED_POINTS
    }
}
