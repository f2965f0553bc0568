//! Map gesture recognition: touch long-press and mouse double-click.
//!
//! Both gestures report the geographic position under the pointer. A
//! long-press reports the position captured when the finger went down,
//! not where it was lifted.

use std::time::{Duration, Instant};

use super::projection::{LonLat, MapView, Pixel};

/// How long a touch must be held.
pub const LONG_PRESS_DELAY: Duration = Duration::from_millis(500);

/// How far a held touch may drift before the press is abandoned.
pub const DEFAULT_MOVE_TOLERANCE_PX: f64 = 10.0;

/// Kind of pointer that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Finger on a touch screen.
    Touch,
    /// Mouse.
    Mouse,
    /// Stylus.
    Pen,
}

/// Input the detector reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed.
    Down {
        /// Pointer kind.
        kind: PointerKind,
        /// Position in the viewport.
        pixel: Pixel,
        /// When it happened.
        at: Instant,
    },
    /// Pointer moved.
    Move {
        /// Position in the viewport.
        pixel: Pixel,
    },
    /// Pointer released.
    Up,
    /// Pointer cancelled by the platform.
    Cancel,
    /// Double click.
    DoubleClick {
        /// Position in the viewport.
        pixel: Pixel,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingPress {
    origin: Pixel,
    position: LonLat,
    started: Instant,
}

/// Turns raw pointer events into "place something here" requests.
///
/// Touch devices use long-press; everything else uses double-click.
/// The timer is driven from outside through [`LongPressDetector::poll`].
///
/// A held touch survives small drift up to the tolerance (10 px by
/// default); pass `0.0` to [`LongPressDetector::with_tolerance`] to cancel
/// on any movement.
#[derive(Debug, Clone)]
pub struct LongPressDetector {
    touch_device: bool,
    tolerance: f64,
    delay: Duration,
    pending: Option<PendingPress>,
}

impl LongPressDetector {
    /// Creates a detector with the default delay and tolerance.
    #[must_use]
    pub const fn new(touch_device: bool) -> Self {
        Self {
            touch_device,
            tolerance: DEFAULT_MOVE_TOLERANCE_PX,
            delay: LONG_PRESS_DELAY,
            pending: None,
        }
    }

    /// Overrides the movement tolerance, in pixels.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Whether a press is being timed.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending press would fire, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.started + self.delay)
    }

    /// Feeds one event. Returns a position when a double-click completes
    /// the gesture immediately.
    pub fn handle(&mut self, event: PointerEvent, view: &MapView) -> Option<LonLat> {
        match event {
            PointerEvent::Down {
                kind: PointerKind::Touch,
                pixel,
                at,
            } => {
                self.pending = Some(PendingPress {
                    origin: pixel,
                    position: view.lon_lat_from_pixel(pixel),
                    started: at,
                });
                None
            }
            PointerEvent::Down { .. } => None,
            PointerEvent::Move { pixel } => {
                if let Some(press) = self.pending
                    && press.origin.distance(pixel) > self.tolerance
                {
                    self.pending = None;
                }
                None
            }
            PointerEvent::Up | PointerEvent::Cancel => {
                self.pending = None;
                None
            }
            PointerEvent::DoubleClick { pixel } => {
                if self.touch_device {
                    None
                } else {
                    Some(view.lon_lat_from_pixel(pixel))
                }
            }
        }
    }

    /// Fires the pending press once it has been held long enough.
    pub fn poll(&mut self, now: Instant) -> Option<LonLat> {
        let press = self.pending?;
        if now.saturating_duration_since(press.started) >= self.delay {
            self.pending = None;
            Some(press.position)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn view() -> MapView {
        MapView::new(LonLat::new(10.0, 20.0), 10.0, 200.0, 200.0)
    }

    fn touch_down(at: Instant) -> PointerEvent {
        PointerEvent::Down {
            kind: PointerKind::Touch,
            pixel: Pixel::new(100.0, 100.0),
            at,
        }
    }

    #[test]
    fn held_touch_fires_after_delay() {
        let view = view();
        let start = Instant::now();
        let mut detector = LongPressDetector::new(true);
        assert_eq!(detector.handle(touch_down(start), &view), None);
        assert_eq!(detector.deadline(), Some(start + LONG_PRESS_DELAY));

        assert_eq!(detector.poll(start + Duration::from_millis(499)), None);
        let Some(position) = detector.poll(start + LONG_PRESS_DELAY) else {
            panic!("expected long press");
        };
        assert!((position.lon - 10.0).abs() < 1e-9);
        assert!((position.lat - 20.0).abs() < 1e-9);
        assert!(!detector.is_pending());
        assert_eq!(detector.poll(start + Duration::from_secs(2)), None);
    }

    #[test]
    fn small_drift_keeps_position_from_press_time() {
        let view = view();
        let start = Instant::now();
        let mut detector = LongPressDetector::new(true);
        detector.handle(touch_down(start), &view);
        detector.handle(
            PointerEvent::Move {
                pixel: Pixel::new(106.0, 108.0),
            },
            &view,
        );
        let Some(position) = detector.poll(start + LONG_PRESS_DELAY) else {
            panic!("drift within tolerance should not cancel");
        };
        assert!((position.lon - 10.0).abs() < 1e-9);
    }

    #[test]
    fn large_move_release_and_cancel_clear_press() {
        let view = view();
        let start = Instant::now();
        let late = start + Duration::from_secs(1);
        let mut detector = LongPressDetector::new(true);

        detector.handle(touch_down(start), &view);
        detector.handle(
            PointerEvent::Move {
                pixel: Pixel::new(111.0, 100.0),
            },
            &view,
        );
        assert_eq!(detector.poll(late), None);

        detector.handle(touch_down(start), &view);
        detector.handle(PointerEvent::Up, &view);
        assert_eq!(detector.poll(late), None);

        detector.handle(touch_down(start), &view);
        detector.handle(PointerEvent::Cancel, &view);
        assert_eq!(detector.poll(late), None);
    }

    #[test]
    fn mouse_press_is_not_timed() {
        let view = view();
        let start = Instant::now();
        let mut detector = LongPressDetector::new(false);
        detector.handle(
            PointerEvent::Down {
                kind: PointerKind::Mouse,
                pixel: Pixel::new(5.0, 5.0),
                at: start,
            },
            &view,
        );
        assert!(!detector.is_pending());
        assert_eq!(detector.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn double_click_only_on_non_touch_devices() {
        let view = view();
        let click = PointerEvent::DoubleClick {
            pixel: Pixel::new(100.0, 100.0),
        };
        let mut desktop = LongPressDetector::new(false);
        assert!(desktop.handle(click, &view).is_some());

        let mut phone = LongPressDetector::new(true);
        assert_eq!(phone.handle(click, &view), None);
    }

    #[test]
    fn custom_tolerance_applies() {
        let view = view();
        let start = Instant::now();
        let mut detector = LongPressDetector::new(true).with_tolerance(2.0);
        detector.handle(touch_down(start), &view);
        detector.handle(
            PointerEvent::Move {
                pixel: Pixel::new(103.0, 100.0),
            },
            &view,
        );
        assert!(!detector.is_pending());
    }

    #[test]
    fn zero_tolerance_cancels_on_any_move() {
        let view = view();
        let start = Instant::now();
        let mut detector = LongPressDetector::new(true).with_tolerance(0.0);
        detector.handle(touch_down(start), &view);
        detector.handle(
            PointerEvent::Move {
                pixel: Pixel::new(100.5, 100.0),
            },
            &view,
        );
        assert!(!detector.is_pending());
    }
}
