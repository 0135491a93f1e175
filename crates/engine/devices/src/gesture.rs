//! Gesture classification from hand landmarks
//!
//! Pinch and fist are evaluated independently on every frame. The classifier
//! keeps the previous frame's pinch state so callers can tell a pinch that just
//! started from one that is being held or was just released.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::hand::{HandLandmarks, FINGERTIPS, INDEX_TIP, THUMB_TIP};

/// Default thumb-to-index distance below which the hand is pinching
pub const DEFAULT_PINCH_THRESHOLD: f32 = 0.05;

/// Default fingertip-to-palm distance counted as "curled"
pub const DEFAULT_FIST_RADIUS: f32 = 0.15;

/// Default number of curled fingertips (out of 5) that makes a fist
pub const DEFAULT_FIST_MIN_FINGERS: usize = 4;

/// Thresholds for gesture detection, all in landmark space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub pinch_threshold: f32,
    pub fist_radius: f32,
    pub fist_min_fingers: usize,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: DEFAULT_PINCH_THRESHOLD,
            fist_radius: DEFAULT_FIST_RADIUS,
            fist_min_fingers: DEFAULT_FIST_MIN_FINGERS,
        }
    }
}

/// Pinch state relative to the previous frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PinchPhase {
    /// Not pinching now and was not pinching before
    #[default]
    Idle,
    /// Rising edge: pinching now, not pinching last frame
    Started,
    /// Pinching on both frames
    Held,
    /// Falling edge: pinching last frame, not any more
    Released,
}

impl PinchPhase {
    /// Derive the phase from previous and current pinch state
    pub fn from_edges(was_pinching: bool, is_pinching: bool) -> Self {
        match (was_pinching, is_pinching) {
            (false, false) => PinchPhase::Idle,
            (false, true) => PinchPhase::Started,
            (true, true) => PinchPhase::Held,
            (true, false) => PinchPhase::Released,
        }
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self, PinchPhase::Started | PinchPhase::Held)
    }
}

/// Classified gesture state for one frame with a detected hand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureFrame {
    pub pinch: PinchPhase,
    pub fist: bool,
    /// Index fingertip in normalized screen space
    pub pointer: Vec2,
    /// Relative depth (landmark z) of the index fingertip
    pub pointer_depth: f32,
}

impl GestureFrame {
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_pinching()
    }

    /// Short label for status displays
    pub fn label(&self) -> &'static str {
        if self.is_pinching() {
            "pinch"
        } else if self.fist {
            "fist"
        } else {
            "none"
        }
    }
}

/// True when thumb tip and index tip are closer than `threshold`
pub fn detect_pinch(hand: &HandLandmarks, threshold: f32) -> bool {
    hand.distance(THUMB_TIP, INDEX_TIP) < threshold
}

/// Number of fingertips within `radius` of the palm base
pub fn curled_fingers(hand: &HandLandmarks, radius: f32) -> usize {
    let palm = hand.wrist();
    FINGERTIPS
        .iter()
        .filter(|&&tip| hand.point(tip).distance(palm) < radius)
        .count()
}

/// True when at least `min_fingers` fingertips are curled toward the palm
pub fn detect_fist(hand: &HandLandmarks, radius: f32, min_fingers: usize) -> bool {
    curled_fingers(hand, radius) >= min_fingers
}

/// Stateful classifier tracking pinch edges across frames
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    config: GestureConfig,
    was_pinching: bool,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            was_pinching: false,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Whether the last classified frame was pinching
    pub fn was_pinching(&self) -> bool {
        self.was_pinching
    }

    /// Classify one frame
    ///
    /// Returns None when no hand is present. The stored pinch state is left
    /// untouched in that case, so a hand that drops out mid-pinch and comes
    /// back still pinching continues as `Held`.
    pub fn classify(&mut self, hand: Option<&HandLandmarks>) -> Option<GestureFrame> {
        let hand = hand?;

        let pinching = detect_pinch(hand, self.config.pinch_threshold);
        let fist = detect_fist(hand, self.config.fist_radius, self.config.fist_min_fingers);
        let pinch = PinchPhase::from_edges(self.was_pinching, pinching);
        self.was_pinching = pinching;

        if matches!(pinch, PinchPhase::Started | PinchPhase::Released) {
            tracing::debug!("Pinch {:?}", pinch);
        }

        let tip = hand.index_tip();
        Some(GestureFrame {
            pinch,
            fist,
            pointer: tip.truncate(),
            pointer_depth: tip.z,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{LANDMARK_COUNT, MIDDLE_TIP, PINKY_TIP, RING_TIP, WRIST};
    use glam::Vec3;

    /// Open hand: every fingertip far from the palm and from each other
    fn open_hand() -> HandLandmarks {
        let mut points = [Vec3::ZERO; LANDMARK_COUNT];
        for (i, p) in points.iter_mut().enumerate() {
            *p = Vec3::new(0.5, 0.9 - i as f32 * 0.02, 0.0);
        }
        points[THUMB_TIP] = Vec3::new(0.3, 0.5, 0.0);
        points[INDEX_TIP] = Vec3::new(0.45, 0.3, 0.0);
        points[MIDDLE_TIP] = Vec3::new(0.5, 0.28, 0.0);
        points[RING_TIP] = Vec3::new(0.55, 0.3, 0.0);
        points[PINKY_TIP] = Vec3::new(0.6, 0.35, 0.0);
        HandLandmarks::new(points)
    }

    #[test]
    fn test_pinch_threshold() {
        let mut hand = open_hand();
        hand.set_point(THUMB_TIP, Vec3::ZERO);

        hand.set_point(INDEX_TIP, Vec3::new(0.03, 0.0, 0.0));
        assert!(detect_pinch(&hand, DEFAULT_PINCH_THRESHOLD));

        hand.set_point(INDEX_TIP, Vec3::new(0.06, 0.0, 0.0));
        assert!(!detect_pinch(&hand, DEFAULT_PINCH_THRESHOLD));
    }

    #[test]
    fn test_pinch_uses_depth_axis() {
        let mut hand = open_hand();
        hand.set_point(THUMB_TIP, Vec3::new(0.5, 0.5, 0.0));
        hand.set_point(INDEX_TIP, Vec3::new(0.5, 0.5, 0.08));
        assert!(!detect_pinch(&hand, DEFAULT_PINCH_THRESHOLD));
    }

    #[test]
    fn test_fist_threshold() {
        let mut hand = open_hand();
        hand.set_point(WRIST, Vec3::ZERO);

        // Four tips curled, pinky extended
        hand.set_point(THUMB_TIP, Vec3::new(0.1, 0.0, 0.0));
        hand.set_point(INDEX_TIP, Vec3::new(0.0, 0.1, 0.0));
        hand.set_point(MIDDLE_TIP, Vec3::new(0.0, 0.0, 0.1));
        hand.set_point(RING_TIP, Vec3::new(0.05, 0.05, 0.0));
        hand.set_point(PINKY_TIP, Vec3::new(0.3, 0.0, 0.0));
        assert_eq!(curled_fingers(&hand, DEFAULT_FIST_RADIUS), 4);
        assert!(detect_fist(&hand, DEFAULT_FIST_RADIUS, DEFAULT_FIST_MIN_FINGERS));

        // Only three curled
        hand.set_point(RING_TIP, Vec3::new(0.0, 0.2, 0.0));
        assert_eq!(curled_fingers(&hand, DEFAULT_FIST_RADIUS), 3);
        assert!(!detect_fist(&hand, DEFAULT_FIST_RADIUS, DEFAULT_FIST_MIN_FINGERS));
    }

    #[test]
    fn test_pinch_phase_edges() {
        assert_eq!(PinchPhase::from_edges(false, false), PinchPhase::Idle);
        assert_eq!(PinchPhase::from_edges(false, true), PinchPhase::Started);
        assert_eq!(PinchPhase::from_edges(true, true), PinchPhase::Held);
        assert_eq!(PinchPhase::from_edges(true, false), PinchPhase::Released);
    }

    #[test]
    fn test_classifier_tracks_edges() {
        let mut classifier = GestureClassifier::default();
        let open = open_hand();
        let mut pinched = open;
        pinched.set_point(THUMB_TIP, pinched.index_tip() + Vec3::new(0.01, 0.0, 0.0));

        assert_eq!(classifier.classify(Some(&open)).unwrap().pinch, PinchPhase::Idle);
        assert_eq!(classifier.classify(Some(&pinched)).unwrap().pinch, PinchPhase::Started);
        assert_eq!(classifier.classify(Some(&pinched)).unwrap().pinch, PinchPhase::Held);
        assert_eq!(classifier.classify(Some(&open)).unwrap().pinch, PinchPhase::Released);
        assert_eq!(classifier.classify(Some(&open)).unwrap().pinch, PinchPhase::Idle);
    }

    #[test]
    fn test_no_hand_keeps_pinch_state() {
        let mut classifier = GestureClassifier::default();
        let mut pinched = open_hand();
        pinched.set_point(THUMB_TIP, pinched.index_tip());

        classifier.classify(Some(&pinched));
        assert!(classifier.classify(None).is_none());
        assert!(classifier.was_pinching());
        assert_eq!(classifier.classify(Some(&pinched)).unwrap().pinch, PinchPhase::Held);
    }

    #[test]
    fn test_frame_pointer_is_index_tip() {
        let mut classifier = GestureClassifier::default();
        let hand = open_hand();
        let frame = classifier.classify(Some(&hand)).unwrap();
        assert_eq!(frame.pointer, Vec2::new(0.45, 0.3));
        assert_eq!(frame.pointer_depth, 0.0);
        assert_eq!(frame.label(), "none");
    }
}
