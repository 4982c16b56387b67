//! Async poll loop over a radar byte source.
//!
//! [`FrameReader`] drives the read → append → decode cadence: it reads from
//! any `tokio::io::AsyncRead` (a serial port, a socket, a recorded capture),
//! feeds the bytes into its [`FrameDecoder`], and hands out complete frames.
//!
//! Reads are sized to the decoder's free space, so a healthy stream never
//! overflows the accumulator. If the accumulator fills up without yielding a
//! frame, the bytes that cannot start a frame are dropped and reading
//! continues.
//!
//! # Example
//!
//! ```
//! use mmwave_uart::protocol::FrameBuilder;
//! use mmwave_uart::FrameReader;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> mmwave_uart::Result<()> {
//! let mut capture = Vec::new();
//! capture.extend(FrameBuilder::new(1).build());
//! capture.extend(FrameBuilder::new(2).build());
//!
//! let mut reader = FrameReader::new(&capture[..]);
//! while let Some(frame) = reader.next_frame().await? {
//!     println!("frame {} with {} objects", frame.frame_number, frame.num_objects());
//! }
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{RadarError, Result};
use crate::protocol::{FrameDecoder, ParseOutcome, RadarFrame, DEFAULT_CAPACITY};
use crate::sink::FrameSink;

/// Default maximum bytes requested per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4 * 1024;

/// Default pause after a read that timed out or would block.
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(50);

/// Configuration for the reader loop.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Accumulator capacity handed to the decoder.
    pub buffer_capacity: usize,
    /// Maximum bytes requested per read.
    pub read_chunk_size: usize,
    /// Pause after a read reports `WouldBlock` or `TimedOut`.
    pub idle_backoff: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
        }
    }
}

/// Reads a byte source and yields decoded frames.
pub struct FrameReader<R> {
    reader: R,
    decoder: FrameDecoder,
    read_buf: Vec<u8>,
    config: ReaderConfig,
    eof: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a reader with default settings.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ReaderConfig::default())
    }

    /// Create a reader with custom settings.
    pub fn with_config(reader: R, config: ReaderConfig) -> Self {
        Self {
            reader,
            decoder: FrameDecoder::with_capacity(config.buffer_capacity),
            read_buf: vec![0u8; config.read_chunk_size.max(1)],
            config,
            eof: false,
        }
    }

    /// Wait for the next complete frame.
    ///
    /// Returns `Ok(None)` once the source reports end of stream and no
    /// further frame can be decoded from the buffered bytes.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the source other than `WouldBlock`,
    /// `TimedOut` and `Interrupted`, which are retried.
    pub async fn next_frame(&mut self) -> Result<Option<RadarFrame>> {
        loop {
            if let Some(frame) = self.decode_buffered() {
                return Ok(Some(frame));
            }
            if self.eof {
                if !self.decoder.is_empty() {
                    tracing::debug!(
                        "End of stream with {} undecoded bytes buffered",
                        self.decoder.len()
                    );
                }
                return Ok(None);
            }

            let room = self.decoder.remaining();
            if room == 0 {
                let dropped = self.decoder.discard_noise();
                if dropped == 0 {
                    return Err(RadarError::Protocol(format!(
                        "Decoder stalled with {} bytes buffered",
                        self.decoder.len()
                    )));
                }
                tracing::warn!("Buffer full without a frame, dropped {} bytes", dropped);
                continue;
            }

            let want = room.min(self.read_buf.len());
            let n = match self.reader.read(&mut self.read_buf[..want]).await {
                Ok(0) => {
                    self.eof = true;
                    continue;
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    tokio::time::sleep(self.config.idle_backoff).await;
                    continue;
                }
                Err(e) => {
                    tracing::error!("Read error: {}", e);
                    return Err(RadarError::Io(e));
                }
            };

            if self.decoder.append(&self.read_buf[..n]).is_err() {
                tracing::warn!("Dropping {} byte chunk", n);
            }
        }
    }

    /// Forward every frame to `sink` until the source ends.
    ///
    /// Returns the number of frames forwarded.
    pub async fn forward_to<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> Result<u64> {
        let mut count = 0u64;
        while let Some(frame) = self.next_frame().await? {
            sink.accept(&frame)?;
            count += 1;
        }
        tracing::debug!("Byte source closed after {} frames", count);
        Ok(count)
    }

    /// The decoder, for stats and buffered state.
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Mutable decoder access (e.g. to clear after reconfiguring the sensor).
    pub fn decoder_mut(&mut self) -> &mut FrameDecoder {
        &mut self.decoder
    }

    /// Unwrap the byte source.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decode one frame from already-buffered bytes, skipping past
    /// malformed headers as long as that makes progress.
    fn decode_buffered(&mut self) -> Option<RadarFrame> {
        loop {
            let before = self.decoder.len();
            match self.decoder.decode_next() {
                ParseOutcome::Frame(frame) => return Some(frame),
                _ if self.decoder.len() < before => continue,
                _ => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DetectedObjectSet, FrameBuilder};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{duplex, AsyncWriteExt, ReadBuf};

    fn frame_bytes(number: u32, objects: usize) -> Vec<u8> {
        let mut points = DetectedObjectSet::default();
        for i in 0..objects {
            points.push(i as f32, 1.0, 0.0, -0.5);
        }
        FrameBuilder::new(number).detected_points(&points).build()
    }

    #[tokio::test]
    async fn test_reads_frames_from_slice() {
        let mut stream = vec![0x55; 13];
        stream.extend(frame_bytes(1, 2));
        stream.extend(frame_bytes(2, 0));

        let mut reader = FrameReader::new(&stream[..]);
        let first = reader.next_frame().await.unwrap().unwrap();
        let second = reader.next_frame().await.unwrap().unwrap();

        assert_eq!(first.frame_number, 1);
        assert_eq!(first.num_objects(), 2);
        assert_eq!(second.frame_number, 2);
        assert!(reader.next_frame().await.unwrap().is_none());
        assert_eq!(reader.decoder().stats().bytes_discarded, 13);
    }

    #[tokio::test]
    async fn test_frames_across_small_writes() {
        let (mut tx, rx) = duplex(64);
        let mut stream = Vec::new();
        for n in 0..5 {
            stream.extend(frame_bytes(n, 3));
        }

        let writer = tokio::spawn(async move {
            for chunk in stream.chunks(7) {
                tx.write_all(chunk).await.unwrap();
            }
        });

        let config = ReaderConfig {
            read_chunk_size: 5,
            ..Default::default()
        };
        let mut reader = FrameReader::with_config(rx, config);
        let mut frames: Vec<RadarFrame> = Vec::new();
        let count = reader.forward_to(&mut frames).await.unwrap();
        writer.await.unwrap();

        assert_eq!(count, 5);
        let numbers: Vec<u32> = frames.iter().map(|f| f.frame_number).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_full_buffer_of_noise_recovers() {
        let mut stream = vec![0xEEu8; 300];
        stream.extend(frame_bytes(9, 1));

        let config = ReaderConfig {
            buffer_capacity: 128,
            read_chunk_size: 64,
            ..Default::default()
        };
        let mut reader = FrameReader::with_config(&stream[..], config);

        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.frame_number, 9);
        assert_eq!(reader.decoder().stats().overflows, 0);
    }

    #[tokio::test]
    async fn test_end_of_stream_with_partial_frame() {
        let bytes = frame_bytes(3, 1);
        let mut reader = FrameReader::new(&bytes[..bytes.len() - 4]);
        assert!(reader.next_frame().await.unwrap().is_none());
        assert_eq!(reader.decoder().len(), bytes.len() - 4);
    }

    #[tokio::test]
    async fn test_stalls_when_capacity_cannot_hold_a_search() {
        let mut stream = crate::protocol::MAGIC_WORD.to_vec();
        stream.extend_from_slice(&[0u8; 16]);

        let config = ReaderConfig {
            buffer_capacity: 16,
            ..Default::default()
        };
        let mut reader = FrameReader::with_config(&stream[..], config);

        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, RadarError::Protocol(_)));
        assert_eq!(reader.decoder().len(), 16);

        reader.decoder_mut().clear();
        assert!(reader.decoder().is_empty());
        assert_eq!(reader.into_inner().len(), 8);
    }

    /// Source that times out once before delivering its bytes.
    struct Flaky {
        timed_out: bool,
        data: Vec<u8>,
    }

    impl AsyncRead for Flaky {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if !self.timed_out {
                self.timed_out = true;
                return Poll::Ready(Err(std::io::Error::new(ErrorKind::TimedOut, "no data")));
            }
            let n = buf.remaining().min(self.data.len());
            let chunk: Vec<u8> = self.data.drain(..n).collect();
            buf.put_slice(&chunk);
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_timeout_is_retried() {
        let source = Flaky {
            timed_out: false,
            data: frame_bytes(4, 1),
        };
        let config = ReaderConfig {
            idle_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        let mut reader = FrameReader::with_config(source, config);

        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.frame_number, 4);
    }

    /// Source that fails hard.
    struct Broken;

    impl AsyncRead for Broken {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::new(ErrorKind::BrokenPipe, "unplugged")))
        }
    }

    #[tokio::test]
    async fn test_hard_error_propagates() {
        let mut reader = FrameReader::new(Broken);
        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, RadarError::Io(_)));
    }
}
