//! Protocol module - wire format, accumulator, and frame decoder.
//!
//! This module implements the radar UART framing protocol:
//! - 40-byte header (magic word + 8 little-endian u32 fields)
//! - Fixed-capacity accumulator for partial reads
//! - Resynchronizing decoder that walks TLV records
//! - Frame builder for producing wire bytes

mod accumulator;
mod decoder;
mod frame;
mod wire_format;

pub use accumulator::{ByteAccumulator, DEFAULT_CAPACITY};
pub use decoder::{magic_word_offsets, DecoderStats, FrameDecoder, ParseOutcome, MIN_SEARCH_LEN};
pub use frame::{build_frame, DetectedObjectSet, FrameBuilder, RadarFrame};
pub use wire_format::{
    read_f32_le, read_u32_le, tlv_type, FrameHeader, TlvHeader, DETECTED_POINT_SIZE,
    HEADER_SIZE, MAGIC_WORD, MAGIC_WORD_SIZE, TLV_HEADER_SIZE, TOTAL_PACKET_LENGTH_OFFSET,
};
