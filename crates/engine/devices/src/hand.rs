//! Hand landmark input
//!
//! A tracked hand is delivered as 21 keypoints in the layout used by common
//! hand-tracking models. `x` and `y` are normalized to the camera image
//! ([0, 1] left-to-right and top-to-bottom), `z` is a relative depth with the
//! wrist as reference.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Number of landmarks in a tracked hand
pub const LANDMARK_COUNT: usize = 21;

/// Wrist / palm base
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// All five fingertip indices, thumb first
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// One frame of landmarks for a single detected hand
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec3>", into = "Vec<Vec3>")]
pub struct HandLandmarks {
    points: [Vec3; LANDMARK_COUNT],
}

impl HandLandmarks {
    /// Create from a full landmark array
    pub fn new(points: [Vec3; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Create from a slice, returning None unless exactly 21 points are given
    pub fn from_slice(points: &[Vec3]) -> Option<Self> {
        let points: [Vec3; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    /// Create from a flat `[x0, y0, z0, x1, ...]` buffer (63 values)
    ///
    /// This is the layout the browser binding receives from JavaScript.
    pub fn from_flat(values: &[f32]) -> Option<Self> {
        if values.len() != LANDMARK_COUNT * 3 {
            return None;
        }

        let mut points = [Vec3::ZERO; LANDMARK_COUNT];
        for (point, chunk) in points.iter_mut().zip(values.chunks_exact(3)) {
            *point = Vec3::new(chunk[0], chunk[1], chunk[2]);
        }
        Some(Self { points })
    }

    /// Get a landmark by index
    ///
    /// # Panics
    /// Panics if `index >= LANDMARK_COUNT`.
    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    /// Replace a landmark
    pub fn set_point(&mut self, index: usize, point: Vec3) {
        self.points[index] = point;
    }

    pub fn points(&self) -> &[Vec3; LANDMARK_COUNT] {
        &self.points
    }

    /// Palm base (wrist) landmark
    pub fn wrist(&self) -> Vec3 {
        self.points[WRIST]
    }

    /// Index fingertip, used as the on-screen pointer
    pub fn index_tip(&self) -> Vec3 {
        self.points[INDEX_TIP]
    }

    /// Screen-space pointer (index fingertip x, y)
    pub fn pointer(&self) -> Vec2 {
        self.index_tip().truncate()
    }

    /// Distance between two landmarks in landmark space
    pub fn distance(&self, a: usize, b: usize) -> f32 {
        self.points[a].distance(self.points[b])
    }
}

impl TryFrom<Vec<Vec3>> for HandLandmarks {
    type Error = String;

    fn try_from(points: Vec<Vec3>) -> Result<Self, Self::Error> {
        Self::from_slice(&points)
            .ok_or_else(|| format!("expected {} landmarks, got {}", LANDMARK_COUNT, points.len()))
    }
}

impl From<HandLandmarks> for Vec<Vec3> {
    fn from(hand: HandLandmarks) -> Self {
        hand.points.to_vec()
    }
}
