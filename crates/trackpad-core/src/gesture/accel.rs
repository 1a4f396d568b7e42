//! Pointer acceleration for single-contact cursor movement.
//!
//! A fixed finger-to-cursor ratio feels sluggish for large movements and
//! twitchy for small ones. Hardware trackpads solve this with an
//! acceleration curve: slow, deliberate movement maps close to 1:1 for
//! precision, while fast flicks are amplified so the cursor can cross the
//! screen without repeated swiping. The curves here mirror that behaviour.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Output deltas with a magnitude below this are dropped entirely, so sensor
/// jitter on a resting finger cannot drift the remote cursor.
pub const MOVE_EPSILON: f32 = 0.2;

/// Velocity samples are normalised against this frame duration so the curve
/// constants are independent of the surface's actual sample rate.
const REFERENCE_FRAME: Duration = Duration::from_micros(16_667); // ~60 Hz

/// Number of recent velocity samples averaged before applying the curve.
/// Smoothing keeps one fast sample from visibly jerking the cursor.
const VELOCITY_WINDOW: usize = 3;

/// Cursor acceleration curve selection.
///
/// Each curve maps a per-sample velocity `v` to a multiplier `m(v)` that is
/// monotonically non-decreasing with `m(0) = 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccelerationCurve {
    /// Constant 1:1 mapping.
    None,
    Light,
    #[default]
    Medium,
    Heavy,
}

impl AccelerationCurve {
    /// The delta multiplier for a (smoothed) velocity in surface units per
    /// reference frame.
    pub fn multiplier(&self, velocity: f32) -> f32 {
        let v = velocity.abs();
        match self {
            AccelerationCurve::None => 1.0,
            AccelerationCurve::Light => 1.0 + v * 0.3,
            AccelerationCurve::Medium => 1.0 + v * 0.6,
            AccelerationCurve::Heavy => 1.0 + v,
        }
    }
}

/// Stateful accelerator applied to the single-contact `Move` stream.
///
/// Owns the inter-sample timing and velocity smoothing; call
/// [`Accelerator::reset`] whenever a new single-contact session starts so one
/// gesture's velocity history cannot bleed into the next.
#[derive(Debug)]
pub struct Accelerator {
    curve: AccelerationCurve,
    sensitivity: f32,
    last_sample: Option<Instant>,
    velocity_history: Vec<f32>,
}

impl Accelerator {
    pub fn new(curve: AccelerationCurve, sensitivity: f32) -> Self {
        Self {
            curve,
            sensitivity,
            last_sample: None,
            velocity_history: Vec::with_capacity(VELOCITY_WINDOW),
        }
    }

    /// Scales a raw per-sample delta, returning `None` when the result is
    /// below [`MOVE_EPSILON`].
    pub fn scale(&mut self, dx: f32, dy: f32, now: Instant) -> Option<(f32, f32)> {
        let distance = dx.hypot(dy);

        // Velocity in surface units per reference frame. The first sample of
        // a gesture has no predecessor; treat it as one reference frame.
        let dt = self
            .last_sample
            .map(|t| now.saturating_duration_since(t))
            .filter(|d| !d.is_zero())
            .unwrap_or(REFERENCE_FRAME);
        self.last_sample = Some(now);
        let velocity = distance * REFERENCE_FRAME.as_secs_f32() / dt.as_secs_f32();

        if self.velocity_history.len() == VELOCITY_WINDOW {
            self.velocity_history.remove(0);
        }
        self.velocity_history.push(velocity);
        let smoothed =
            self.velocity_history.iter().sum::<f32>() / self.velocity_history.len() as f32;

        let factor = self.curve.multiplier(smoothed) * self.sensitivity;
        let (out_x, out_y) = (dx * factor, dy * factor);

        if out_x.hypot(out_y) < MOVE_EPSILON {
            return None;
        }
        Some((out_x, out_y))
    }

    /// Clears timing and velocity history at a gesture boundary.
    pub fn reset(&mut self) {
        self.last_sample = None;
        self.velocity_history.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
