//! MLLP (Minimal Lower Layer Protocol) framing
//!
//! MLLP wraps each HL7 message for TCP delivery:
//!
//! ```text
//! <VT> payload <FS> <CR>
//! ```
//!
//! - VT (vertical tab): 0x0B, start of block
//! - FS (file separator): 0x1C, end of block
//! - CR (carriage return): 0x0D, trailer
//!
//! This crate does the byte work only: framing, deframing, and an
//! incremental stream deframer plus a tokio-util codec. Sockets, TLS,
//! and connection management belong to the caller.

pub mod codec;

pub use codec::MllpCodec;

use era7_core::error::{Error, Result};

/// Start-of-block marker (VT)
pub const START_BLOCK: u8 = 0x0B;
/// End-of-block marker (FS)
pub const END_BLOCK: u8 = 0x1C;
/// Frame trailer (CR)
pub const CARRIAGE_RETURN: u8 = 0x0D;

/// Default cap on a single frame (10 MiB), matching the parser default
pub const DEFAULT_MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Wrap a payload in MLLP framing: `payload.len() + 3` bytes
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(payload.len() + 3);
    framed.push(START_BLOCK);
    framed.extend_from_slice(payload);
    framed.push(END_BLOCK);
    framed.push(CARRIAGE_RETURN);
    framed
}

/// Extract the payload from a complete MLLP frame
pub fn deframe(framed: &[u8]) -> Result<&[u8]> {
    if framed.len() < 3 {
        return Err(Error::InvalidFrame(format!(
            "frame is {} bytes, minimum is 3",
            framed.len()
        )));
    }
    if framed[0] != START_BLOCK {
        return Err(Error::InvalidFrame(format!(
            "frame starts with 0x{:02X}, expected VT (0x0B)",
            framed[0]
        )));
    }
    if framed[framed.len() - 2] != END_BLOCK {
        return Err(Error::InvalidFrame(
            "missing end-of-block marker (0x1C)".to_string(),
        ));
    }
    if framed[framed.len() - 1] != CARRIAGE_RETURN {
        return Err(Error::InvalidFrame(
            "missing carriage-return trailer (0x0D)".to_string(),
        ));
    }
    Ok(&framed[1..framed.len() - 2])
}

/// Whether `bytes` is exactly one well-formed frame
pub fn is_complete_frame(bytes: &[u8]) -> bool {
    deframe(bytes).is_ok()
}

/// Whether `bytes` contains a start-of-block marker anywhere
pub fn contains_start_byte(bytes: &[u8]) -> bool {
    bytes.contains(&START_BLOCK)
}

/// Incremental deframer for a byte stream
///
/// Accumulates arbitrary chunks and yields payloads as complete frames
/// appear. Bytes before a start marker are protocol noise: they are
/// dropped silently (MLLP offers no way to report them) but counted for
/// observability. Single-owner: callers serialize `append` and
/// `next_message`.
#[derive(Debug, Default)]
pub struct MllpStreamDeframer {
    buffer: Vec<u8>,
    noise_bytes_dropped: u64,
}

impl MllpStreamDeframer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk from the transport
    pub fn append(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Extract the next complete payload, if one is buffered
    ///
    /// Scans to the first VT (discarding anything before it), then to
    /// the first FS+CR pair after it. A payload containing FS violates
    /// MLLP; the frame is cut at the first FS+CR and the remainder is
    /// treated as the start of the next frame.
    pub fn next_message(&mut self) -> Option<Vec<u8>> {
        let start = match self.buffer.iter().position(|&b| b == START_BLOCK) {
            Some(pos) => {
                if pos > 0 {
                    self.noise_bytes_dropped += pos as u64;
                    tracing::debug!(bytes = pos, "dropping noise before MLLP start marker");
                    self.buffer.drain(..pos);
                }
                0
            }
            None => {
                // Nothing but noise
                let len = self.buffer.len();
                if len > 0 {
                    self.noise_bytes_dropped += len as u64;
                    tracing::debug!(bytes = len, "dropping noise before MLLP start marker");
                    self.buffer.clear();
                }
                return None;
            }
        };

        let end = self.buffer[start + 1..]
            .windows(2)
            .position(|w| w == [END_BLOCK, CARRIAGE_RETURN])
            .map(|pos| pos + start + 1)?;

        let payload = self.buffer[start + 1..end].to_vec();
        self.buffer.drain(..end + 2);
        Some(payload)
    }

    /// Bytes discarded so far because they preceded a start marker
    pub fn noise_bytes_dropped(&self) -> u64 {
        self.noise_bytes_dropped
    }

    /// Bytes currently buffered (inside or awaiting a frame)
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop all buffered bytes
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
