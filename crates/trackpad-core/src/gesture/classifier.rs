//! The gesture state machine.
//!
//! The classifier consumes touch-tracker transitions and emits discrete
//! [`ControlEvent`]s. All of its behaviour hangs off one tagged enum,
//! [`GestureSession`]: exactly one interpretation mode is active for the
//! current set of contacts, transitions happen only on a contact-count change
//! or a threshold crossing, and illegal combinations (scrolling while
//! pinching, dragging with two fingers) are unrepresentable.
//!
//! Timers are deadline fields stored inside the state that armed them and
//! fired by [`GestureClassifier::tick`]; clearing the field cancels the
//! timer. The three deadlines:
//!
//! - **long press** (`TrackingSingle`): fires → the session becomes
//!   `Dragging` and emits `DragStart`.
//! - **tap coalescing** (`pending_tap`): a tap candidate waits here for a
//!   possible second tap; expiry emits `Click{count:1}`, a second candidate
//!   at the same spot emits `Click{count:2}` immediately.
//! - **swipe window** (`TrackingThree`): bounds how long three-finger
//!   movement may accumulate before the accumulator resets.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::gesture::accel::{AccelerationCurve, Accelerator};
use crate::gesture::tracker::{Contact, Point, TouchPhase, TouchSample, TouchTracker};
use crate::protocol::messages::{ControlEvent, GesturePhase, MouseButton, SwipeDirection};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tunable thresholds and timings for gesture recognition.
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Distance from the start position beyond which a contact counts as
    /// having moved (cancels taps and long presses).
    pub movement_threshold: f32,
    /// How long a still finger must rest before a drag begins.
    pub long_press_threshold: Duration,
    /// Maximum duration of a tap.
    pub tap_max_duration: Duration,
    /// Maximum total movement of a tap, and the radius within which two taps
    /// count as a double tap.
    pub tap_movement_tolerance: f32,
    /// How long a tap candidate waits for a second tap before resolving to a
    /// single click.
    pub double_tap_max_interval: Duration,
    /// Maximum duration of a two-finger tap (secondary click).
    pub two_finger_tap_max_duration: Duration,
    /// Centre movement that commits a two-contact session to scrolling.
    pub scroll_activation_threshold: f32,
    /// Pairwise-distance change that commits a two-contact session to
    /// pinching.
    pub pinch_activation_threshold: f32,
    /// Accumulated single-axis movement required for a three-finger swipe.
    pub swipe_threshold: f32,
    /// How strongly the swipe axis must dominate the other one.
    pub swipe_axis_dominance: f32,
    /// Accumulation window for three-finger movement.
    pub swipe_window: Duration,
    /// Invert scroll direction so content follows the finger.
    pub natural_scrolling: bool,
    pub cursor_sensitivity: f32,
    pub scroll_sensitivity: f32,
    pub acceleration: AccelerationCurve,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            movement_threshold: 5.0,
            long_press_threshold: Duration::from_millis(500),
            tap_max_duration: Duration::from_millis(200),
            tap_movement_tolerance: 20.0,
            double_tap_max_interval: Duration::from_millis(300),
            two_finger_tap_max_duration: Duration::from_millis(250),
            scroll_activation_threshold: 8.0,
            pinch_activation_threshold: 15.0,
            swipe_threshold: 80.0,
            swipe_axis_dominance: 1.5,
            swipe_window: Duration::from_millis(500),
            natural_scrolling: true,
            cursor_sensitivity: 1.0,
            scroll_sensitivity: 1.0,
            acceleration: AccelerationCurve::Medium,
        }
    }
}

// ── Session state ─────────────────────────────────────────────────────────────

/// The classifier's interpretation mode for the live contact set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureSession {
    Idle,
    /// One contact down; may still become a tap, a move stream, or a drag.
    TrackingSingle {
        /// Deadline for the long-press-to-drag transition. `None` once the
        /// contact has moved significantly (the timer is cancelled).
        long_press_deadline: Option<Instant>,
    },
    /// Long press fired; the contact now drags until release.
    Dragging,
    /// Two contacts down, not yet committed to scrolling or pinching.
    TrackingTwo {
        started_at: Instant,
        initial_distance: f32,
        start_center: Point,
        last_center: Point,
        /// Entered by losing a contact from a three-finger session rather
        /// than by a genuine two-finger touch; such a session must not
        /// produce a two-finger tap.
        from_fallback: bool,
    },
    Scrolling {
        last_center: Point,
    },
    Pinching {
        initial_distance: f32,
    },
    /// Three contacts down, accumulating movement toward a swipe.
    TrackingThree {
        window_started: Instant,
        accumulated_dx: f32,
        accumulated_dy: f32,
    },
}

/// A tap waiting out the double-tap interval.
#[derive(Debug, Clone, Copy)]
struct PendingTap {
    position: Point,
    deadline: Instant,
}

/// The first finger of a possible two-finger tap has lifted; the candidate
/// resolves when the second finger lifts (or dies of old age).
#[derive(Debug, Clone, Copy)]
struct TwoFingerTapCandidate {
    started_at: Instant,
    movement_so_far: f32,
}

// ── Classifier ────────────────────────────────────────────────────────────────

/// Consumes raw touch samples and emits ordered [`ControlEvent`]s.
pub struct GestureClassifier {
    config: GestureConfig,
    tracker: TouchTracker,
    session: GestureSession,
    accelerator: Accelerator,
    pending_tap: Option<PendingTap>,
    two_finger_tap: Option<TwoFingerTapCandidate>,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        let tracker = TouchTracker::new(config.movement_threshold);
        let accelerator = Accelerator::new(config.acceleration, config.cursor_sensitivity);
        Self {
            config,
            tracker,
            session: GestureSession::Idle,
            accelerator,
            pending_tap: None,
            two_finger_tap: None,
        }
    }

    /// The current session state, for observability and tests.
    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    pub fn contact_count(&self) -> usize {
        self.tracker.count()
    }

    /// Routes one raw sample to the matching entry point.
    pub fn handle(&mut self, sample: TouchSample, now: Instant) -> Vec<ControlEvent> {
        match sample.phase {
            TouchPhase::Began => self.touch_began(sample.id, sample.position, now),
            TouchPhase::Moved => self.touch_moved(sample.id, sample.position, now),
            TouchPhase::Ended => self.touch_ended(sample.id, now),
            TouchPhase::Cancelled => self.touch_cancelled(sample.id, now),
        }
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    pub fn touch_began(&mut self, id: u64, position: Point, now: Instant) -> Vec<ControlEvent> {
        // Capture the drag position before the new contact lands in the
        // tracker; the oldest contact is the one dragging.
        let drag_pos = self
            .tracker
            .contacts()
            .first()
            .map(|c| c.current_position)
            .unwrap_or(position);

        self.tracker.begin(id, position, now);
        self.two_finger_tap = None;

        let mut events = self.terminate_active_phase(drag_pos);

        self.session = match self.tracker.count() {
            1 => {
                self.accelerator.reset();
                GestureSession::TrackingSingle {
                    long_press_deadline: Some(now + self.config.long_press_threshold),
                }
            }
            2 => self.fresh_two_contact_session(now, false),
            3 => GestureSession::TrackingThree {
                window_started: now,
                accumulated_dx: 0.0,
                accumulated_dy: 0.0,
            },
            // No gesture is defined above three contacts.
            _ => GestureSession::Idle,
        };
        events
    }

    pub fn touch_moved(&mut self, id: u64, position: Point, now: Instant) -> Vec<ControlEvent> {
        let Some((dx, dy)) = self.tracker.move_to(id, position) else {
            return Vec::new();
        };
        let mut events = Vec::new();

        match self.session {
            GestureSession::Idle => {}

            GestureSession::TrackingSingle { long_press_deadline } => {
                let moved = self
                    .tracker
                    .contact(id)
                    .is_some_and(|c| c.moved_significantly);
                if moved {
                    if long_press_deadline.is_some() {
                        // Significant movement cancels the pending long press.
                        self.session = GestureSession::TrackingSingle {
                            long_press_deadline: None,
                        };
                    }
                    if let Some((ax, ay)) = self.accelerator.scale(dx, dy, now) {
                        events.push(ControlEvent::Move { dx: ax, dy: ay });
                    }
                }
            }

            GestureSession::Dragging => {
                events.push(ControlEvent::DragMove {
                    dx: dx * self.config.cursor_sensitivity,
                    dy: dy * self.config.cursor_sensitivity,
                });
            }

            GestureSession::TrackingTwo {
                started_at,
                initial_distance,
                start_center,
                last_center,
                from_fallback,
            } => {
                let (Some(center), Some(distance)) =
                    (self.tracker.center(), self.tracker.pairwise_distance())
                else {
                    return events;
                };
                let distance_change = (distance - initial_distance).abs();
                let center_travel = start_center.distance_to(center);

                // The session commits to whichever threshold is crossed
                // first and cannot switch for its remainder. Pinch is
                // checked first: a pinch moves the fingers apart faster
                // than it moves their centre.
                if initial_distance > 0.0 && distance_change > self.config.pinch_activation_threshold
                {
                    debug!("two-contact session committed to pinching");
                    self.session = GestureSession::Pinching { initial_distance };
                    events.push(ControlEvent::Pinch {
                        scale: distance / initial_distance,
                        phase: GesturePhase::Began,
                    });
                } else if center_travel > self.config.scroll_activation_threshold {
                    debug!("two-contact session committed to scrolling");
                    let (sx, sy) = self.scroll_delta(center, last_center);
                    self.session = GestureSession::Scrolling {
                        last_center: center,
                    };
                    events.push(ControlEvent::Scroll {
                        dx: sx,
                        dy: sy,
                        phase: GesturePhase::Began,
                    });
                } else {
                    self.session = GestureSession::TrackingTwo {
                        started_at,
                        initial_distance,
                        start_center,
                        last_center: center,
                        from_fallback,
                    };
                }
            }

            GestureSession::Scrolling { last_center } => {
                if let Some(center) = self.tracker.center() {
                    let (sx, sy) = self.scroll_delta(center, last_center);
                    self.session = GestureSession::Scrolling {
                        last_center: center,
                    };
                    if sx != 0.0 || sy != 0.0 {
                        events.push(ControlEvent::Scroll {
                            dx: sx,
                            dy: sy,
                            phase: GesturePhase::Changed,
                        });
                    }
                }
            }

            GestureSession::Pinching { initial_distance } => {
                if let Some(distance) = self.tracker.pairwise_distance() {
                    if initial_distance > 0.0 {
                        events.push(ControlEvent::Pinch {
                            scale: distance / initial_distance,
                            phase: GesturePhase::Changed,
                        });
                    }
                }
            }

            GestureSession::TrackingThree {
                mut window_started,
                mut accumulated_dx,
                mut accumulated_dy,
            } => {
                if now.saturating_duration_since(window_started) > self.config.swipe_window {
                    // Window expired without a dominant axis.
                    window_started = now;
                    accumulated_dx = 0.0;
                    accumulated_dy = 0.0;
                }
                let contacts = self.tracker.count().max(1) as f32;
                accumulated_dx += dx / contacts;
                accumulated_dy += dy / contacts;

                if let Some(direction) = dominant_swipe(
                    accumulated_dx,
                    accumulated_dy,
                    self.config.swipe_threshold,
                    self.config.swipe_axis_dominance,
                ) {
                    debug!(?direction, "three-finger swipe");
                    events.push(ControlEvent::Swipe { direction });
                    window_started = now;
                    accumulated_dx = 0.0;
                    accumulated_dy = 0.0;
                }
                self.session = GestureSession::TrackingThree {
                    window_started,
                    accumulated_dx,
                    accumulated_dy,
                };
            }
        }
        events
    }

    pub fn touch_ended(&mut self, id: u64, now: Instant) -> Vec<ControlEvent> {
        self.finish_contact(id, now, false)
    }

    pub fn touch_cancelled(&mut self, id: u64, now: Instant) -> Vec<ControlEvent> {
        self.finish_contact(id, now, true)
    }

    /// Fires any deadlines that have come due. Driven by the caller's ticker.
    pub fn tick(&mut self, now: Instant) -> Vec<ControlEvent> {
        let mut events = Vec::new();

        // Long press → drag.
        if let GestureSession::TrackingSingle {
            long_press_deadline: Some(deadline),
        } = self.session
        {
            if now >= deadline {
                if let Some(contact) = self.tracker.contacts().first() {
                    let pos = contact.current_position;
                    debug!("long press fired, drag started");
                    self.session = GestureSession::Dragging;
                    events.push(ControlEvent::DragStart { x: pos.x, y: pos.y });
                } else {
                    self.session = GestureSession::Idle;
                }
            }
        }

        // Tap coalescing expiry → the candidate was a lone tap.
        if let Some(pending) = self.pending_tap {
            if now >= pending.deadline {
                self.pending_tap = None;
                events.push(ControlEvent::Click {
                    button: MouseButton::Primary,
                    count: 1,
                });
            }
        }

        // Three-finger window expiry resets the accumulator silently.
        if let GestureSession::TrackingThree { window_started, .. } = self.session {
            if now.saturating_duration_since(window_started) > self.config.swipe_window {
                self.session = GestureSession::TrackingThree {
                    window_started: now,
                    accumulated_dx: 0.0,
                    accumulated_dy: 0.0,
                };
            }
        }

        events
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn finish_contact(&mut self, id: u64, now: Instant, cancelled: bool) -> Vec<ControlEvent> {
        let Some(removed) = self.tracker.end(id) else {
            return Vec::new();
        };
        let mut events = Vec::new();

        match self.tracker.count() {
            0 => {
                // Any active phase emits its terminal event exactly once.
                events.extend(self.terminate_active_phase(removed.current_position));

                if cancelled {
                    self.two_finger_tap = None;
                } else if let Some(candidate) = self.two_finger_tap.take() {
                    let duration = now.saturating_duration_since(candidate.started_at);
                    let total_movement = candidate.movement_so_far + removed.total_movement();
                    if duration < self.config.two_finger_tap_max_duration
                        && total_movement < self.config.tap_movement_tolerance * 2.0
                    {
                        events.push(ControlEvent::Click {
                            button: MouseButton::Secondary,
                            count: 1,
                        });
                    }
                } else if matches!(
                    self.session,
                    GestureSession::TrackingSingle {
                        long_press_deadline: Some(_)
                    }
                ) {
                    // Only a genuine single-contact session still awaiting
                    // its long press can be a tap. A fallback session (armed
                    // with no deadline) is the remnant of a multi-contact
                    // gesture, and a moved contact has its deadline cleared
                    // but also fails the movement check below.
                    events.extend(self.evaluate_single_tap(&removed, now));
                }

                self.session = GestureSession::Idle;
                self.accelerator.reset();
            }

            1 => {
                match self.session {
                    GestureSession::TrackingTwo {
                        started_at,
                        from_fallback,
                        ..
                    } => {
                        if !from_fallback && !cancelled {
                            self.two_finger_tap = Some(TwoFingerTapCandidate {
                                started_at,
                                movement_so_far: removed.total_movement(),
                            });
                        }
                    }
                    GestureSession::Scrolling { .. } | GestureSession::Pinching { .. } => {
                        events.extend(self.terminate_active_phase(removed.current_position));
                    }
                    _ => {}
                }
                // Fall back to single-contact tracking; no long press is
                // armed for a contact that has been down this long.
                self.session = GestureSession::TrackingSingle {
                    long_press_deadline: None,
                };
            }

            2 => {
                self.session = self.fresh_two_contact_session(now, true);
            }

            3 => {
                self.session = GestureSession::TrackingThree {
                    window_started: now,
                    accumulated_dx: 0.0,
                    accumulated_dy: 0.0,
                };
            }

            _ => {
                self.session = GestureSession::Idle;
            }
        }
        events
    }

    /// Emits the terminal event of the active continuous phase, if any, and
    /// is a no-op otherwise. `drag_end_at` is where a `DragEnd` reports.
    fn terminate_active_phase(&mut self, drag_end_at: Point) -> Vec<ControlEvent> {
        let mut events = Vec::new();
        match self.session {
            GestureSession::Dragging => {
                events.push(ControlEvent::DragEnd {
                    x: drag_end_at.x,
                    y: drag_end_at.y,
                });
            }
            GestureSession::Scrolling { .. } => {
                events.push(ControlEvent::Scroll {
                    dx: 0.0,
                    dy: 0.0,
                    phase: GesturePhase::Ended,
                });
            }
            GestureSession::Pinching { initial_distance } => {
                let scale = self
                    .tracker
                    .pairwise_distance()
                    .filter(|_| initial_distance > 0.0)
                    .map(|d| d / initial_distance)
                    .unwrap_or(1.0);
                events.push(ControlEvent::Pinch {
                    scale,
                    phase: GesturePhase::Ended,
                });
            }
            _ => {}
        }
        if !events.is_empty() {
            self.session = GestureSession::Idle;
        }
        events
    }

    /// Resolves a released single contact into a tap candidate, a double
    /// click, or nothing.
    fn evaluate_single_tap(&mut self, removed: &Contact, now: Instant) -> Vec<ControlEvent> {
        let duration = now.saturating_duration_since(removed.start_time);
        if removed.moved_significantly
            || duration >= self.config.tap_max_duration
            || removed.total_movement() >= self.config.tap_movement_tolerance
        {
            return Vec::new();
        }

        let position = removed.current_position;
        let mut events = Vec::new();
        match self.pending_tap.take() {
            Some(pending)
                if now < pending.deadline
                    && pending.position.distance_to(position)
                        < self.config.tap_movement_tolerance =>
            {
                // Second tap in time and in place: double click, timer
                // cancelled.
                events.push(ControlEvent::Click {
                    button: MouseButton::Primary,
                    count: 2,
                });
            }
            Some(_) => {
                // Unrelated tap elsewhere (or the ticker is lagging): flush
                // the pending tap as the single click it was, then coalesce
                // this one.
                events.push(ControlEvent::Click {
                    button: MouseButton::Primary,
                    count: 1,
                });
                self.pending_tap = Some(PendingTap {
                    position,
                    deadline: now + self.config.double_tap_max_interval,
                });
            }
            None => {
                self.pending_tap = Some(PendingTap {
                    position,
                    deadline: now + self.config.double_tap_max_interval,
                });
            }
        }
        events
    }

    fn fresh_two_contact_session(&self, now: Instant, from_fallback: bool) -> GestureSession {
        let center = self.tracker.center().unwrap_or_default();
        GestureSession::TrackingTwo {
            started_at: now,
            initial_distance: self.tracker.pairwise_distance().unwrap_or(0.0),
            start_center: center,
            last_center: center,
            from_fallback,
        }
    }

    fn scroll_delta(&self, center: Point, last_center: Point) -> (f32, f32) {
        let mut sx = (center.x - last_center.x) * self.config.scroll_sensitivity;
        let mut sy = (center.y - last_center.y) * self.config.scroll_sensitivity;
        if self.config.natural_scrolling {
            sx = -sx;
            sy = -sy;
        }
        (sx, sy)
    }
}

fn dominant_swipe(
    dx: f32,
    dy: f32,
    threshold: f32,
    dominance: f32,
) -> Option<SwipeDirection> {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ay > threshold && ay > ax * dominance {
        Some(if dy < 0.0 {
            SwipeDirection::Up
        } else {
            SwipeDirection::Down
        })
    } else if ax > threshold && ax > ay * dominance {
        Some(if dx < 0.0 {
            SwipeDirection::Left
        } else {
            SwipeDirection::Right
        })
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> GestureClassifier {
        GestureClassifier::new(GestureConfig::default())
    }

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_initial_session_is_idle() {
        let c = classifier();
        assert_eq!(*c.session(), GestureSession::Idle);
    }

    #[test]
    fn test_single_touch_arms_long_press_deadline() {
        let mut c = classifier();
        let now = Instant::now();

        c.touch_began(1, p(50.0, 50.0), now);

        match c.session() {
            GestureSession::TrackingSingle {
                long_press_deadline: Some(deadline),
            } => {
                assert_eq!(*deadline, now + Duration::from_millis(500));
            }
            other => panic!("expected TrackingSingle with armed deadline, got {other:?}"),
        }
    }

    #[test]
    fn test_significant_movement_cancels_long_press() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(50.0, 50.0), now);

        c.touch_moved(1, p(70.0, 50.0), now + Duration::from_millis(50));

        assert_eq!(
            *c.session(),
            GestureSession::TrackingSingle {
                long_press_deadline: None
            }
        );
    }

    #[test]
    fn test_moving_contact_emits_move_events() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(0.0, 0.0), now);

        let events = c.touch_moved(1, p(20.0, 0.0), now + Duration::from_millis(8));

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ControlEvent::Move { .. }));
    }

    #[test]
    fn test_sub_threshold_movement_emits_nothing() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(0.0, 0.0), now);

        let events = c.touch_moved(1, p(2.0, 0.0), now + Duration::from_millis(8));

        assert!(events.is_empty());
    }

    #[test]
    fn test_second_contact_moves_session_to_tracking_two() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(0.0, 0.0), now);
        c.touch_began(2, p(100.0, 0.0), now);

        assert!(matches!(
            c.session(),
            GestureSession::TrackingTwo {
                from_fallback: false,
                ..
            }
        ));
    }

    #[test]
    fn test_third_contact_moves_session_to_tracking_three() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(0.0, 0.0), now);
        c.touch_began(2, p(100.0, 0.0), now);
        c.touch_began(3, p(50.0, 100.0), now);

        assert!(matches!(c.session(), GestureSession::TrackingThree { .. }));
    }

    #[test]
    fn test_losing_a_contact_falls_back_to_lower_count_state() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(0.0, 0.0), now);
        c.touch_began(2, p(100.0, 0.0), now);
        c.touch_began(3, p(50.0, 100.0), now);

        c.touch_ended(3, now + Duration::from_millis(100));
        assert!(matches!(
            c.session(),
            GestureSession::TrackingTwo {
                from_fallback: true,
                ..
            }
        ));

        c.touch_ended(2, now + Duration::from_millis(150));
        assert_eq!(
            *c.session(),
            GestureSession::TrackingSingle {
                long_press_deadline: None
            }
        );
    }

    #[test]
    fn test_fallback_two_contact_session_cannot_two_finger_tap() {
        // A quick three-finger tap must not read as a two-finger tap.
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(0.0, 0.0), now);
        c.touch_began(2, p(100.0, 0.0), now);
        c.touch_began(3, p(50.0, 100.0), now);

        let mut events = Vec::new();
        events.extend(c.touch_ended(3, now + Duration::from_millis(40)));
        events.extend(c.touch_ended(2, now + Duration::from_millis(50)));
        events.extend(c.touch_ended(1, now + Duration::from_millis(60)));

        assert!(
            events.is_empty(),
            "three-finger tap must emit nothing, got {events:?}"
        );

        // Nor may a click surface later from the coalescing timer.
        let events = c.tick(now + Duration::from_secs(1));
        assert!(events.is_empty(), "no deferred click, got {events:?}");
    }

    #[test]
    fn test_two_finger_tap_emits_secondary_click() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(40.0, 40.0), now);
        c.touch_began(2, p(60.0, 40.0), now + Duration::from_millis(10));

        let mut events = Vec::new();
        events.extend(c.touch_ended(1, now + Duration::from_millis(120)));
        events.extend(c.touch_ended(2, now + Duration::from_millis(130)));

        assert_eq!(
            events,
            vec![ControlEvent::Click {
                button: MouseButton::Secondary,
                count: 1
            }]
        );
    }

    #[test]
    fn test_slow_two_finger_release_is_not_a_tap() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(40.0, 40.0), now);
        c.touch_began(2, p(60.0, 40.0), now);

        let mut events = Vec::new();
        events.extend(c.touch_ended(1, now + Duration::from_millis(400)));
        events.extend(c.touch_ended(2, now + Duration::from_millis(420)));

        assert!(events.is_empty());
    }

    #[test]
    fn test_new_contact_terminates_active_drag() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(10.0, 10.0), now);
        let events = c.tick(now + Duration::from_millis(600));
        assert!(matches!(events[..], [ControlEvent::DragStart { .. }]));

        let events = c.touch_began(2, p(90.0, 10.0), now + Duration::from_millis(700));

        assert!(
            matches!(events[..], [ControlEvent::DragEnd { .. }]),
            "drag must end when a second contact lands, got {events:?}"
        );
        assert!(matches!(c.session(), GestureSession::TrackingTwo { .. }));
    }

    #[test]
    fn test_unknown_contact_end_is_ignored() {
        let mut c = classifier();
        let events = c.touch_ended(42, Instant::now());
        assert!(events.is_empty());
        assert_eq!(*c.session(), GestureSession::Idle);
    }

    #[test]
    fn test_cancelled_contact_produces_no_tap() {
        let mut c = classifier();
        let now = Instant::now();
        c.touch_began(1, p(10.0, 10.0), now);

        let events = c.touch_cancelled(1, now + Duration::from_millis(50));
        assert!(events.is_empty());

        // And the coalescing timer must not fire later.
        let events = c.tick(now + Duration::from_secs(1));
        assert!(events.is_empty());
    }

    #[test]
    fn test_swipe_requires_dominant_axis() {
        // Diagonal movement without a dominant axis must not swipe.
        assert_eq!(dominant_swipe(90.0, 85.0, 80.0, 1.5), None);
        assert_eq!(dominant_swipe(0.0, -120.0, 80.0, 1.5), Some(SwipeDirection::Up));
        assert_eq!(dominant_swipe(0.0, 120.0, 80.0, 1.5), Some(SwipeDirection::Down));
        assert_eq!(dominant_swipe(-120.0, 0.0, 80.0, 1.5), Some(SwipeDirection::Left));
        assert_eq!(dominant_swipe(120.0, 10.0, 80.0, 1.5), Some(SwipeDirection::Right));
    }
}
