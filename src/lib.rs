//! # mmwave-uart
//!
//! Streaming decoder for the UART output of mmWave radar sensors.
//!
//! The sensor emits a continuous byte stream of self-delimiting frames. Each
//! frame starts with an 8-byte magic word, carries a fixed 40-byte header,
//! and is followed by type-length-value records, one of which lists the
//! detected points (x, y, z, velocity).
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): wire format, fixed-capacity accumulator,
//!   and the resynchronizing [`FrameDecoder`]. Synchronous, no I/O.
//! - **Reader** ([`FrameReader`]): async read → append → decode loop over
//!   any `tokio::io::AsyncRead`.
//! - **Sinks** ([`sink`]): JSON lines or MessagePack for downstream display.
//!
//! ## Example
//!
//! ```ignore
//! use mmwave_uart::{sink::JsonLinesSink, FrameReader};
//!
//! #[tokio::main]
//! async fn main() -> mmwave_uart::Result<()> {
//!     let port = open_data_port().await?; // any AsyncRead
//!     let mut reader = FrameReader::new(port);
//!     let mut sink = JsonLinesSink::stdout();
//!
//!     reader.forward_to(&mut sink).await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod sink;

mod reader;

pub use error::{RadarError, Result};
pub use protocol::{FrameDecoder, ParseOutcome, RadarFrame};
pub use reader::{FrameReader, ReaderConfig, DEFAULT_IDLE_BACKOFF, DEFAULT_READ_CHUNK_SIZE};
