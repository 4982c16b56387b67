//! Codec module - serialization of decoded frames for downstream consumers.
//!
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (`to_vec_named`, so
//!   field names survive for dynamically typed readers)
//!
//! JSON output goes through `serde_json` directly in
//! [`JsonLinesSink`](crate::sink::JsonLinesSink).
//!
//! # Example
//!
//! ```
//! use mmwave_uart::codec::MsgPackCodec;
//! use mmwave_uart::protocol::{DetectedObjectSet, FrameHeader, RadarFrame};
//!
//! let frame = RadarFrame::new(FrameHeader::default(), DetectedObjectSet::default());
//! let encoded = MsgPackCodec::encode(&frame).unwrap();
//! let decoded: RadarFrame = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, frame);
//! ```

mod msgpack;

pub use msgpack::MsgPackCodec;
