//! Newline-delimited JSON framing.
//!
//! Each record becomes one compact JSON object followed by a single `\n`.
//! Compact `serde_json` output escapes control characters, so a frame never
//! contains a raw newline before its terminator.

use crate::{error::DeliveryError, log_record::LogRecord};

/// Serialise a record into a single-line JSON payload.
pub fn serialise_record(record: &LogRecord) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::with_capacity(256);
    serde_json::to_writer(&mut buf, record)?;
    Ok(buf)
}

/// Terminate the payload with `\n`, rejecting payloads above `max_size`.
pub fn frame_payload(mut payload: Vec<u8>, max_size: usize) -> Result<Vec<u8>, DeliveryError> {
    if payload.len() > max_size {
        return Err(DeliveryError::FrameTooLarge {
            size: payload.len(),
            limit: max_size,
        });
    }
    payload.push(b'\n');
    Ok(payload)
}

/// Serialise and frame in one step.
pub fn encode_frame(record: &LogRecord, max_size: usize) -> Result<Vec<u8>, DeliveryError> {
    frame_payload(serialise_record(record)?, max_size)
}

/// Parse one line of the stream back into a record.
pub fn decode_line(line: &str) -> Result<LogRecord, serde_json::Error> {
    serde_json::from_str(line.trim_end_matches(['\r', '\n']))
}
