//! Event batching.
//!
//! Touch sampling produces far more events per second than it is worth
//! framing individually: at 120 Hz a move gesture would cost a frame header
//! and a syscall per sample. The batcher accumulates events between flush
//! ticks so each tick ships one ordered [`Batch`] instead.
//!
//! Guarantee: every enqueued event appears in exactly one flushed batch, in
//! enqueue order. The flush swaps the pending list for an empty one, so
//! nothing is copied, dropped, or duplicated at the boundary.

use crate::protocol::messages::{ControlEvent, ControlMessage};

/// An ordered group of control events flushed together on one timer tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub events: Vec<ControlEvent>,
    /// Seconds since the Unix epoch at flush time.
    pub timestamp: f64,
}

impl From<Batch> for ControlMessage {
    fn from(batch: Batch) -> Self {
        ControlMessage::Batch {
            events: batch.events,
            timestamp: batch.timestamp,
        }
    }
}

/// Accumulates control events between flush ticks.
#[derive(Debug, Default)]
pub struct EventBatcher {
    pending: Vec<ControlEvent>,
}

impl EventBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the pending list (FIFO).
    pub fn enqueue(&mut self, event: ControlEvent) {
        self.pending.push(event);
    }

    /// Number of events waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Swaps the pending list for an empty one and returns it as a [`Batch`],
    /// or `None` if nothing is pending.
    pub fn flush(&mut self, timestamp: f64) -> Option<Batch> {
        if self.pending.is_empty() {
            return None;
        }
        Some(Batch {
            events: std::mem::take(&mut self.pending),
            timestamp,
        })
    }

    /// Drops all pending events without flushing them. Used when the
    /// transport is down: stale input is not worth replaying on reconnect.
    pub fn discard(&mut self) {
        self.pending.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
