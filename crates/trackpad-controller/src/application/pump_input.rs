//! The input pump: the single logical execution context for the touch path.
//!
//! Raw [`TouchSample`]s from the platform touch layer and the classifier's
//! deadline ticker are multiplexed onto one task. Every control event the
//! classifier emits is handed to the session over an unbounded SPSC channel,
//! so no lock is ever held across I/O and the network task can never stall
//! touch sampling.
//!
//! Keyboard and dictation input (whose UI lives outside this crate) enters
//! through the same channel via [`InputQueue`], keeping the end-to-end event
//! order intact.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use trackpad_core::gesture::{GestureClassifier, GestureConfig, TouchSample};
use trackpad_core::protocol::messages::ControlEvent;

/// Cadence at which the classifier's deadlines are polled. Long-press and
/// tap-coalescing precision is bounded by this.
pub const CLASSIFIER_TICK: Duration = Duration::from_millis(8);

/// Creates the event channel the session consumes, returning the producer
/// wrapped in an [`InputQueue`].
pub fn input_channel() -> (InputQueue, mpsc::UnboundedReceiver<ControlEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InputQueue { tx }, rx)
}

/// Producer handle for control events.
///
/// Cloneable; the keyboard surface and the input pump share it. Sends never
/// block. If the session is gone the event is silently dropped, which is the
/// correct fate for input with nowhere to go.
#[derive(Clone)]
pub struct InputQueue {
    tx: mpsc::UnboundedSender<ControlEvent>,
}

impl InputQueue {
    pub fn send_event(&self, event: ControlEvent) {
        if self.tx.send(event).is_err() {
            debug!("session gone, input event dropped");
        }
    }

    pub fn send_key_down(&self, code: u16, modifiers: u32) {
        self.send_event(ControlEvent::KeyDown { code, modifiers });
    }

    pub fn send_key_up(&self, code: u16, modifiers: u32) {
        self.send_event(ControlEvent::KeyUp { code, modifiers });
    }

    pub fn send_key_press(&self, code: u16, modifiers: u32) {
        self.send_event(ControlEvent::KeyPress { code, modifiers });
    }

    pub fn send_text(&self, value: impl Into<String>) {
        self.send_event(ControlEvent::Text {
            value: value.into(),
        });
    }
}

/// Drives the gesture classifier from raw samples and a deadline ticker.
pub struct InputPump {
    classifier: GestureClassifier,
    samples: mpsc::UnboundedReceiver<TouchSample>,
    queue: InputQueue,
}

impl InputPump {
    pub fn new(
        config: GestureConfig,
        samples: mpsc::UnboundedReceiver<TouchSample>,
        queue: InputQueue,
    ) -> Self {
        Self {
            classifier: GestureClassifier::new(config),
            samples,
            queue,
        }
    }

    /// Runs until the sample channel closes (the touch surface went away).
    pub async fn run(mut self) {
        let mut ticker = interval(CLASSIFIER_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        enum Wake {
            Sample(Option<TouchSample>),
            Tick,
        }
        loop {
            let wake = tokio::select! {
                sample = self.samples.recv() => Wake::Sample(sample),
                _ = ticker.tick() => Wake::Tick,
            };
            match wake {
                Wake::Sample(None) => break,
                Wake::Sample(Some(sample)) => {
                    for event in self.classifier.handle(sample, Instant::now()) {
                        self.queue.send_event(event);
                    }
                }
                Wake::Tick => {
                    for event in self.classifier.tick(Instant::now()) {
                        self.queue.send_event(event);
                    }
                }
            }
        }
        debug!("input pump stopped: touch surface closed");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
