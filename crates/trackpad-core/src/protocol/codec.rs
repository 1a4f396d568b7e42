//! Length-prefixed framing for protocol messages.
//!
//! Wire format:
//! ```text
//! [length:4 big-endian][payload:length]
//! ```
//! The payload is the JSON encoding of one [`ControlMessage`]. TCP is a byte
//! stream with no message boundaries of its own, so the 4-byte prefix is what
//! lets the reader know where one message ends and the next begins: a single
//! read from the socket may contain half a message, exactly one, or several
//! back to back. [`FrameDecoder`] buffers whatever arrives and yields every
//! complete message it can.
//!
//! A length prefix of zero, or one at or above [`MAX_FRAME_SIZE`], means the
//! stream is corrupted (or the peer is not speaking this protocol). The
//! decoder clears its buffer and keeps going rather than wedging the read
//! loop; the same applies to a payload that fails to parse.

use thiserror::Error;
use tracing::warn;

use crate::protocol::messages::{ControlMessage, MAX_FRAME_SIZE};

/// Errors that can occur while encoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The serialized payload does not fit in a single frame.
    #[error("payload of {size} bytes exceeds the {MAX_FRAME_SIZE}-byte frame limit")]
    FrameTooLarge { size: usize },

    /// The message could not be serialized to JSON.
    #[error("failed to serialize message: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Encodes a message into a length-prefixed frame ready to write to a stream.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the payload is at or above
/// [`MAX_FRAME_SIZE`], or [`ProtocolError::Serialize`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use trackpad_core::protocol::{encode_frame, ControlMessage, PROTOCOL_VERSION};
///
/// let msg = ControlMessage::Handshake {
///     device_name: "tablet".to_string(),
///     protocol_version: PROTOCOL_VERSION,
/// };
/// let frame = encode_frame(&msg).unwrap();
/// let payload_len = u32::from_be_bytes(frame[..4].try_into().unwrap()) as usize;
/// assert_eq!(payload_len, frame.len() - 4);
/// ```
pub fn encode_frame(msg: &ControlMessage) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(msg).map_err(ProtocolError::Serialize)?;
    if payload.len() >= MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len(),
        });
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Incremental decoder for a stream of length-prefixed frames.
///
/// Feed it whatever the socket yields via [`FrameDecoder::push`]; it returns
/// every message completed by that chunk, in order. Partial frames stay
/// buffered until the rest arrives.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Appends `bytes` to the receive buffer and decodes every complete frame.
    ///
    /// Returns zero, one, or many decoded messages. Corruption (invalid
    /// length prefix or undecodable payload) clears the buffer and is logged;
    /// it never fails the caller.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<ControlMessage> {
        self.buffer.extend_from_slice(bytes);

        let mut decoded = Vec::new();
        while self.buffer.len() >= 4 {
            let length =
                u32::from_be_bytes([self.buffer[0], self.buffer[1], self.buffer[2], self.buffer[3]])
                    as usize;

            if length == 0 || length >= MAX_FRAME_SIZE {
                warn!("invalid frame length {length}, clearing receive buffer");
                self.buffer.clear();
                break;
            }

            let total = 4 + length;
            if self.buffer.len() < total {
                // Wait for the rest of this frame.
                break;
            }

            match serde_json::from_slice(&self.buffer[4..total]) {
                Ok(msg) => {
                    decoded.push(msg);
                    self.buffer.drain(..total);
                }
                Err(e) => {
                    warn!("undecodable frame payload ({e}), clearing receive buffer");
                    self.buffer.clear();
                    break;
                }
            }
        }
        decoded
    }

    /// Number of bytes currently buffered (incomplete frame data).
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drops any partially received frame. Called when a connection is torn
    /// down so a reconnect starts from a clean stream position.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
