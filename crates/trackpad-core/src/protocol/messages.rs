//! All Trackpad-Over-LAN protocol message types.
//!
//! Messages travel as self-describing JSON payloads with a `type`
//! discriminator field, framed by a 4-byte big-endian length prefix
//! (see [`crate::protocol::codec`]). Field names use camelCase on the wire.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version sent in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// Sanity bound on a single frame's payload, in bytes. A length prefix of
/// zero or anything at or above this value marks the stream as corrupted.
pub const MAX_FRAME_SIZE: usize = 65536;

// ── Event component enums ─────────────────────────────────────────────────────

/// Pointer button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseButton {
    /// The main button (left click / single-finger tap).
    Primary,
    /// The context-menu button (right click / two-finger tap).
    Secondary,
    Middle,
}

/// Phase marker for continuous gestures (scroll, pinch).
///
/// A continuous gesture emits exactly one `Began`, zero or more `Changed`,
/// and exactly one `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
}

/// Direction of a three-finger swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Modifier key bitmask flags carried by the key events.
///
/// The bit layout matches the key-event flags of the platform the receiver
/// injects into, so the receiver can pass them through unchanged.
pub mod modifiers {
    pub const CAPS_LOCK: u32 = 1 << 16;
    pub const SHIFT: u32 = 1 << 17;
    pub const CONTROL: u32 = 1 << 18;
    pub const OPTION: u32 = 1 << 19;
    pub const COMMAND: u32 = 1 << 20;
}

// ── Control events ────────────────────────────────────────────────────────────

/// A single discrete input event produced by the gesture classifier or the
/// keyboard surface.
///
/// Events are immutable once created, and their order is significant: it is
/// preserved through the batcher, the wire, and the receiver's dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ControlEvent {
    /// Relative cursor movement, already accelerated and sensitivity-scaled.
    Move { dx: f32, dy: f32 },
    /// A click. `count` is 1 for a single click, 2 for a double click.
    Click { button: MouseButton, count: u8 },
    /// A long-press drag began at the given surface position.
    DragStart { x: f32, y: f32 },
    /// Relative movement while dragging.
    DragMove { dx: f32, dy: f32 },
    /// The drag ended at the given surface position.
    DragEnd { x: f32, y: f32 },
    /// Two-finger scroll movement.
    Scroll { dx: f32, dy: f32, phase: GesturePhase },
    /// Two-finger pinch. `scale` is current distance / initial distance.
    Pinch { scale: f32, phase: GesturePhase },
    /// Three-finger swipe in a dominant direction.
    Swipe { direction: SwipeDirection },
    KeyDown { code: u16, modifiers: u32 },
    KeyUp { code: u16, modifiers: u32 },
    /// A key down immediately followed by a key up.
    KeyPress { code: u16, modifiers: u32 },
    /// Literal text to type on the peer (dictation path).
    Text { value: String },
}

impl ControlEvent {
    /// Returns the wire discriminator for this event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlEvent::Move { .. } => "move",
            ControlEvent::Click { .. } => "click",
            ControlEvent::DragStart { .. } => "dragStart",
            ControlEvent::DragMove { .. } => "dragMove",
            ControlEvent::DragEnd { .. } => "dragEnd",
            ControlEvent::Scroll { .. } => "scroll",
            ControlEvent::Pinch { .. } => "pinch",
            ControlEvent::Swipe { .. } => "swipe",
            ControlEvent::KeyDown { .. } => "keyDown",
            ControlEvent::KeyUp { .. } => "keyUp",
            ControlEvent::KeyPress { .. } => "keyPress",
            ControlEvent::Text { .. } => "text",
        }
    }
}

// ── Top-level messages ────────────────────────────────────────────────────────

/// All valid Trackpad-Over-LAN messages, discriminated by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ControlMessage {
    /// Sent by the controller immediately after the TCP stream is ready.
    Handshake {
        /// Human-readable name of the touch-surface device.
        device_name: String,
        /// Protocol version the controller speaks; always [`PROTOCOL_VERSION`].
        protocol_version: u32,
    },
    /// Receiver's response to a handshake. Informational only — it is
    /// surfaced to the caller but does not gate message flow.
    HandshakeAck {
        success: bool,
        /// Human-readable name of the receiving machine.
        server_name: String,
    },
    /// An ordered batch of control events flushed on one timer tick.
    Batch {
        events: Vec<ControlEvent>,
        /// Seconds since the Unix epoch at flush time.
        timestamp: f64,
    },
}

impl ControlMessage {
    /// Returns the wire discriminator for this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::Handshake { .. } => "handshake",
            ControlMessage::HandshakeAck { .. } => "handshakeAck",
            ControlMessage::Batch { .. } => "batch",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
