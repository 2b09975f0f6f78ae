//! Dump command implementation.

use evio_core::Reader;
use serde::Serialize;
use std::path::Path;

/// Bytes of payload shown in the text preview.
const PREVIEW_LEN: usize = 16;

/// One record frame.
#[derive(Debug, Serialize)]
pub struct FrameInfo {
    /// Record index, starting at 0.
    pub index: u32,
    /// Offset of the length prefix in the file.
    pub offset: u64,
    /// Prefix plus payload, in bytes.
    pub frame_size: u64,
    /// Payload size in bytes.
    pub payload_size: usize,
    /// Leading payload bytes, hex-encoded.
    pub preview: String,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let frames = read_frames(path, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&frames)?);
        }
        _ => {
            print_text_output(path, &frames);
        }
    }

    Ok(())
}

/// Lists up to `limit` record frames of `path`.
pub fn read_frames(
    path: &Path,
    limit: Option<usize>,
) -> Result<Vec<FrameInfo>, Box<dyn std::error::Error>> {
    let mut reader = Reader::open(path)?;
    let max_frames = limit.unwrap_or(usize::MAX);
    let mut frames = Vec::new();
    let mut payload = Vec::new();

    while frames.len() < max_frames {
        let Some(offset) = reader.position() else {
            break;
        };
        if !reader.read(&mut payload) {
            break;
        }
        let end = reader.position().unwrap_or(offset);

        frames.push(FrameInfo {
            index: reader.records_consumed() - 1,
            offset,
            frame_size: end - offset,
            payload_size: payload.len(),
            preview: hex_encode(&payload[..payload.len().min(PREVIEW_LEN)]),
        });
    }

    if !reader.good() {
        return Err(format!(
            "framing error after {} records",
            reader.records_consumed()
        )
        .into());
    }

    Ok(frames)
}

fn print_text_output(path: &Path, frames: &[FrameInfo]) {
    println!("{}", path.display());
    println!("{:>8}  {:>12}  {:>10}  preview", "index", "offset", "size");
    for frame in frames {
        println!(
            "{:>8}  {:>12}  {:>10}  {}",
            frame.index, frame.offset, frame.payload_size, frame.preview
        );
    }
    println!();
    println!("{} record(s)", frames.len());
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
