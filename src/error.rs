//! Error types for mmwave-uart.

use thiserror::Error;

/// Main error type for all decoder and boundary operations.
#[derive(Debug, Error)]
pub enum RadarError {
    /// I/O error while reading the byte source or writing a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (JSON-lines sink).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Incoming chunk does not fit in the accumulator.
    ///
    /// The chunk was rejected as a whole; buffered bytes are unchanged.
    #[error("Buffer overflow: chunk of {chunk_len} bytes exceeds {available} bytes of free capacity")]
    BufferOverflow {
        /// Size of the rejected chunk.
        chunk_len: usize,
        /// Free bytes left in the accumulator at the time of the append.
        available: usize,
    },

    /// Protocol error (stream cannot be decoded any further).
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using RadarError.
pub type Result<T> = std::result::Result<T, RadarError>;
