//! The dispatcher boundary.
//!
//! Decoded control events are handed to a [`Dispatcher`] once each, in
//! arrival order. Turning an event into an actual cursor move or keystroke
//! is an OS-injection concern that lives behind this trait; implementations
//! must return quickly so they never stall the receive loop.
//!
//! The implementation shipped here, [`TracingDispatcher`], only logs. It is
//! what the binary runs when no injection backend is wired in, and it makes
//! the receiver usable as a protocol probe.

#[cfg(test)]
use mockall::automock;
use tracing::{debug, trace};

use trackpad_core::protocol::messages::ControlEvent;

/// Receives each decoded control event exactly once, in arrival order.
#[cfg_attr(test, automock)]
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, event: &ControlEvent);
}

/// Logs every event instead of injecting it.
#[derive(Debug, Default)]
pub struct TracingDispatcher;

impl Dispatcher for TracingDispatcher {
    fn dispatch(&self, event: &ControlEvent) {
        match event {
            // Continuous streams are noisy; keep them at trace.
            ControlEvent::Move { dx, dy } => trace!(dx, dy, "move"),
            ControlEvent::DragMove { dx, dy } => trace!(dx, dy, "drag move"),
            ControlEvent::Scroll { dx, dy, phase } => trace!(dx, dy, ?phase, "scroll"),
            ControlEvent::Pinch { scale, phase } => trace!(scale, ?phase, "pinch"),
            ControlEvent::Click { button, count } => debug!(?button, count, "click"),
            ControlEvent::DragStart { x, y } => debug!(x, y, "drag start"),
            ControlEvent::DragEnd { x, y } => debug!(x, y, "drag end"),
            ControlEvent::Swipe { direction } => debug!(?direction, "swipe"),
            ControlEvent::KeyDown { code, modifiers } => debug!(code, modifiers, "key down"),
            ControlEvent::KeyUp { code, modifiers } => debug!(code, modifiers, "key up"),
            ControlEvent::KeyPress { code, modifiers } => debug!(code, modifiers, "key press"),
            ControlEvent::Text { value } => debug!(chars = value.len(), "text"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
