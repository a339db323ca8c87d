//! tokio-util codec for MLLP
//!
//! [`MllpCodec`] plugs the framer into `tokio_util::codec::Framed` so
//! async transports read and write whole HL7 payloads. Decoding follows
//! the stream-deframer semantics: noise before a start marker is
//! dropped, frames end at the first FS+CR.

use crate::{CARRIAGE_RETURN, DEFAULT_MAX_FRAME_SIZE, END_BLOCK, START_BLOCK};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Encoder/decoder of MLLP frames for `Framed` transports
#[derive(Debug, Clone)]
pub struct MllpCodec {
    max_frame_size: usize,
}

impl MllpCodec {
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Cap the accepted frame size (payload plus markers)
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for MllpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MllpCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Bytes>> {
        // Drop noise ahead of the start marker
        match src.iter().position(|&b| b == START_BLOCK) {
            Some(0) => {}
            Some(pos) => {
                tracing::debug!(bytes = pos, "dropping noise before MLLP start marker");
                src.advance(pos);
            }
            None => {
                let len = src.len();
                if len > 0 {
                    tracing::debug!(bytes = len, "dropping noise before MLLP start marker");
                    src.clear();
                }
                return Ok(None);
            }
        }

        let end = match src[1..]
            .windows(2)
            .position(|w| w == [END_BLOCK, CARRIAGE_RETURN])
        {
            Some(pos) => pos + 1,
            None => {
                if src.len() > self.max_frame_size {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "MLLP frame exceeds maximum size of {} bytes",
                            self.max_frame_size
                        ),
                    ));
                }
                return Ok(None);
            }
        };

        let mut framed = src.split_to(end + 2);
        framed.advance(1); // VT
        framed.truncate(framed.len() - 2); // FS + CR
        Ok(Some(framed.freeze()))
    }
}

impl Encoder<Bytes> for MllpCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> io::Result<()> {
        if item.len() + 3 > self.max_frame_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "payload of {} bytes exceeds maximum frame size of {}",
                    item.len(),
                    self.max_frame_size
                ),
            ));
        }
        dst.reserve(item.len() + 3);
        dst.put_u8(START_BLOCK);
        dst.put_slice(&item);
        dst.put_u8(END_BLOCK);
        dst.put_u8(CARRIAGE_RETURN);
        Ok(())
    }
}

impl Encoder<&str> for MllpCodec {
    type Error = io::Error;

    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> io::Result<()> {
        Encoder::<Bytes>::encode(self, Bytes::copy_from_slice(item.as_bytes()), dst)
    }
}
