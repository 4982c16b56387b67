//! Replay - decode a recorded UART capture into JSON lines.
//!
//! This example demonstrates:
//! - Feeding any `AsyncRead` byte source into a `FrameReader`
//! - Forwarding every decoded frame to `JsonLinesSink::stdout()`
//! - Reading decoder counters once the source is exhausted
//!
//! # Running
//!
//! ```sh
//! cargo run --example replay -- capture.bin > frames.jsonl
//! ```

use mmwave_uart::sink::JsonLinesSink;
use mmwave_uart::FrameReader;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: replay <capture-file>");
            std::process::exit(2);
        }
    };

    let file = tokio::fs::File::open(&path).await?;
    let mut reader = FrameReader::new(file);
    let mut sink = JsonLinesSink::stdout();

    let count = reader.forward_to(&mut sink).await?;

    let stats = reader.decoder().stats();
    eprintln!(
        "{} frames from {} ({} bytes discarded, {} malformed headers, {} truncated TLVs)",
        count, path, stats.bytes_discarded, stats.malformed_frames, stats.truncated_tlvs
    );

    Ok(())
}
