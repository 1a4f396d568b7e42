//! Protocol module containing message types and the framing codec.

pub mod codec;
pub mod messages;

pub use codec::{encode_frame, FrameDecoder, ProtocolError};
pub use messages::*;
