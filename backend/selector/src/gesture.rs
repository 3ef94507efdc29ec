use serde::{Deserialize, Serialize};

use snaplens_core::{CaptureRegion, Point};

/// Which pointer button an event carries. Only the primary button starts a
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// Pointer input delivered to an active selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { button: PointerButton, at: Point },
    Move { at: Point },
    Up { at: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    Idle,
    Selecting { anchor: Point },
}

/// The drag state machine: `Idle → Selecting → Idle`.
///
/// The anchor is fixed at press time; release produces the normalized
/// bounding box of anchor and release point. Cancel and success are the same
/// transition; the caller decides what to do with the emitted region.
#[derive(Debug)]
pub struct SelectionGesture {
    state: GestureState,
}

impl SelectionGesture {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
        }
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, GestureState::Selecting { .. })
    }

    /// Primary-button press starts a selection and records the anchor.
    /// Non-primary presses are ignored. Returns whether a selection started.
    pub fn press(&mut self, button: PointerButton, at: Point) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        if self.is_selecting() {
            // A second press mid-drag re-anchors rather than stacking.
            self.state = GestureState::Selecting { anchor: at };
            return true;
        }
        self.state = GestureState::Selecting { anchor: at };
        true
    }

    /// Pointer movement while selecting yields the current live rectangle.
    pub fn motion(&self, at: Point) -> Option<CaptureRegion> {
        match self.state {
            GestureState::Selecting { anchor } => Some(CaptureRegion::from_points(anchor, at)),
            GestureState::Idle => None,
        }
    }

    /// Primary-button release completes the selection, returning the
    /// normalized region and resetting to idle. Release while idle is a
    /// no-op.
    pub fn release(&mut self, at: Point) -> Option<CaptureRegion> {
        match self.state {
            GestureState::Selecting { anchor } => {
                self.state = GestureState::Idle;
                Some(CaptureRegion::from_points(anchor, at))
            }
            GestureState::Idle => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }
}

impl Default for SelectionGesture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_gesture_emits_normalized_region() {
        let mut gesture = SelectionGesture::new();
        assert!(gesture.press(PointerButton::Primary, Point::new(100.0, 80.0)));
        assert!(gesture.is_selecting());

        // Drag up-left: origin must still be the minimum corner.
        let region = gesture.release(Point::new(40.0, 30.0)).unwrap();
        assert_eq!(region.origin_x, 40.0);
        assert_eq!(region.origin_y, 30.0);
        assert_eq!(region.width, 60.0);
        assert_eq!(region.height, 50.0);
        assert!(!gesture.is_selecting());
    }

    #[test]
    fn test_non_primary_press_does_not_start_selection() {
        let mut gesture = SelectionGesture::new();
        assert!(!gesture.press(PointerButton::Secondary, Point::new(1.0, 1.0)));
        assert!(!gesture.press(PointerButton::Auxiliary, Point::new(1.0, 1.0)));
        assert!(!gesture.is_selecting());
        assert!(gesture.release(Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_motion_tracks_from_fixed_anchor() {
        let mut gesture = SelectionGesture::new();
        gesture.press(PointerButton::Primary, Point::new(10.0, 10.0));

        let first = gesture.motion(Point::new(20.0, 30.0)).unwrap();
        assert_eq!((first.width, first.height), (10.0, 20.0));

        // Anchor stays fixed even when the pointer crosses back over it.
        let second = gesture.motion(Point::new(0.0, 0.0)).unwrap();
        assert_eq!((second.origin_x, second.origin_y), (0.0, 0.0));
        assert_eq!((second.width, second.height), (10.0, 10.0));
    }

    #[test]
    fn test_motion_while_idle_yields_nothing() {
        let gesture = SelectionGesture::new();
        assert!(gesture.motion(Point::new(5.0, 5.0)).is_none());
    }
}
