//! Downstream consumers of decoded frames.
//!
//! A sink receives every frame the reader produces, in stream order.
//! Rendering is left to whatever sits on the other side of the writer:
//!
//! - [`JsonLinesSink`]: one JSON object per line, explicit `\n`, flushed per frame
//! - [`MsgPackSink`]: `u32` little-endian length prefix + named MessagePack
//! - `Vec<RadarFrame>`: collects frames in memory
//!
//! # Example
//!
//! ```
//! use mmwave_uart::protocol::{DetectedObjectSet, FrameHeader, RadarFrame};
//! use mmwave_uart::sink::{FrameSink, JsonLinesSink};
//!
//! let mut sink = JsonLinesSink::new(Vec::new());
//! let frame = RadarFrame::new(FrameHeader::default(), DetectedObjectSet::default());
//! sink.accept(&frame).unwrap();
//!
//! let out = String::from_utf8(sink.into_inner()).unwrap();
//! assert!(out.ends_with('\n'));
//! assert!(out.contains("\"frame_number\":0"));
//! ```

use std::io::Write;

use crate::codec::MsgPackCodec;
use crate::error::Result;
use crate::protocol::RadarFrame;

/// Consumer of decoded frames.
pub trait FrameSink {
    /// Handle one frame.
    ///
    /// # Errors
    ///
    /// Returns error if the frame cannot be serialized or written.
    fn accept(&mut self, frame: &RadarFrame) -> Result<()>;
}

impl FrameSink for Vec<RadarFrame> {
    fn accept(&mut self, frame: &RadarFrame) -> Result<()> {
        self.push(frame.clone());
        Ok(())
    }
}

/// Writes each frame as a single JSON line.
///
/// Uses an explicit `\n` rather than platform line endings and flushes
/// after every frame so a reader on a pipe sees complete lines.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink writing to stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn accept(&mut self, frame: &RadarFrame) -> Result<()> {
        let line = serde_json::to_string(frame)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes each frame as a length-prefixed MessagePack record.
pub struct MsgPackSink<W: Write> {
    writer: W,
}

impl<W: Write> MsgPackSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for MsgPackSink<W> {
    fn accept(&mut self, frame: &RadarFrame) -> Result<()> {
        let payload = MsgPackCodec::encode(frame)?;
        self.writer
            .write_all(&(payload.len() as u32).to_le_bytes())?;
        self.writer.write_all(&payload)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DetectedObjectSet, FrameHeader};

    fn frame(number: u32, x: f32) -> RadarFrame {
        let mut points = DetectedObjectSet::default();
        points.push(x, 0.5, 0.0, 0.25);
        let header = FrameHeader {
            frame_number: number,
            num_detected_objects: 1,
            ..Default::default()
        };
        RadarFrame::new(header, points)
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<RadarFrame> = Vec::new();
        sink.accept(&frame(1, 0.0)).unwrap();
        sink.accept(&frame(2, 0.0)).unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].frame_number, 2);
    }

    #[test]
    fn test_json_lines_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.accept(&frame(1, 1.5)).unwrap();
        sink.accept(&frame(2, -1.5)).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.split_terminator('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(!out.contains('\r'));

        let second: RadarFrame = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second, frame(2, -1.5));

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["detected_objects"]["x"][0], 1.5);
    }

    #[test]
    fn test_msgpack_length_prefixed() {
        let mut sink = MsgPackSink::new(Vec::new());
        sink.accept(&frame(5, 2.0)).unwrap();
        sink.accept(&frame(6, 3.0)).unwrap();

        let out = sink.into_inner();
        let mut offset = 0;
        let mut decoded = Vec::new();
        while offset < out.len() {
            let len = u32::from_le_bytes([
                out[offset],
                out[offset + 1],
                out[offset + 2],
                out[offset + 3],
            ]) as usize;
            offset += 4;
            let frame: RadarFrame = MsgPackCodec::decode(&out[offset..offset + len]).unwrap();
            decoded.push(frame);
            offset += len;
        }

        assert_eq!(decoded, vec![frame(5, 2.0), frame(6, 3.0)]);
    }

    #[test]
    fn test_write_error_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut sink = JsonLinesSink::new(Broken);
        let err = sink.accept(&frame(1, 0.0)).unwrap_err();
        assert!(matches!(err, crate::error::RadarError::Io(_)));
    }
}
