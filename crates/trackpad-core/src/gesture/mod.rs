//! Multi-touch gesture recognition.
//!
//! Raw touch samples flow through two layers:
//!
//! - [`tracker::TouchTracker`] keeps per-contact state (start/current
//!   position, start time, whether the contact has moved significantly).
//! - [`classifier::GestureClassifier`] watches the tracker's transitions and
//!   emits discrete [`crate::ControlEvent`]s: moves, clicks, drags, scrolls,
//!   pinches, and swipes.
//!
//! Everything here is synchronous and deterministic. Time is passed in
//! explicitly (`now: Instant`) and timers are deadline fields fired by
//! [`classifier::GestureClassifier::tick`], so the whole state machine can be
//! driven — and tested — without a runtime or a wall clock.

pub mod accel;
pub mod classifier;
pub mod tracker;

pub use accel::{AccelerationCurve, Accelerator};
pub use classifier::{GestureClassifier, GestureConfig};
pub use tracker::{Contact, Point, TouchPhase, TouchSample, TouchTracker};
