//! # trackpad-core
//!
//! Shared library for Trackpad-Over-LAN containing the wire protocol codec,
//! the multi-touch gesture recognizer, and the event batcher.
//!
//! This crate is used by both the controller (touch surface) and receiver
//! applications. It has zero dependencies on OS APIs, UI frameworks, or
//! network sockets.
//!
//! # Architecture overview
//!
//! Trackpad-Over-LAN turns a touch surface on one device into a trackpad and
//! keyboard for another machine on the same LAN. Raw touch samples are
//! classified into discrete control events (moves, clicks, drags, scrolls,
//! pinches, swipes), batched on a fixed cadence, and shipped to the peer as
//! length-prefixed JSON frames over TCP.
//!
//! This crate defines:
//!
//! - **`protocol`** – How bytes travel over the network. Messages are
//!   self-describing JSON payloads behind a 4-byte big-endian length prefix,
//!   decoded incrementally by a [`protocol::FrameDecoder`].
//!
//! - **`gesture`** – Pure recognition logic with no OS dependencies: the
//!   per-contact [`gesture::TouchTracker`], the
//!   [`gesture::GestureClassifier`] state machine, and the pointer
//!   acceleration curves.
//!
//! - **`batch`** – The [`batch::EventBatcher`], which accumulates control
//!   events between flush ticks so dozens of per-sample events travel in a
//!   single frame.

pub mod batch;
pub mod gesture;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `trackpad_core::ControlEvent` instead of the full module path.
pub use batch::{Batch, EventBatcher};
pub use gesture::{GestureClassifier, GestureConfig, TouchPhase, TouchSample};
pub use protocol::codec::{encode_frame, FrameDecoder, ProtocolError};
pub use protocol::messages::{ControlEvent, ControlMessage};
