//! Frame payloads as they arrive from JavaScript
//!
//! Times are milliseconds since the session started, as delivered by
//! `requestAnimationFrame` and touch events.

use devices::{TouchPhase, TouchPoint};
use glam::{Quat, Vec2, Vec3, Vec4};
use placement::{AnchorHandle, Pose, SurfaceHit, XrFrame};
use serde::Deserialize;
use std::time::Duration;

/// Convert a JavaScript millisecond timestamp, clamping garbage to zero
pub fn millis(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PoseInput {
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`
    pub orientation: Option<[f32; 4]>,
}

impl From<PoseInput> for Pose {
    fn from(input: PoseInput) -> Self {
        let orientation = input
            .orientation
            .and_then(|q| Vec4::from_array(q).try_normalize().map(Quat::from_vec4))
            .unwrap_or(Quat::IDENTITY);
        Pose::new(Vec3::from_array(input.position), orientation)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HitInput {
    #[serde(flatten)]
    pub pose: PoseInput,
    pub distance: f32,
}

/// Touch phase as spelled by the page (`"started"`, `"moved"`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TouchPhaseInput {
    Started,
    Moved,
    Ended,
    Cancelled,
}

impl From<TouchPhaseInput> for TouchPhase {
    fn from(phase: TouchPhaseInput) -> Self {
        match phase {
            TouchPhaseInput::Started => TouchPhase::Started,
            TouchPhaseInput::Moved => TouchPhase::Moved,
            TouchPhaseInput::Ended => TouchPhase::Ended,
            TouchPhaseInput::Cancelled => TouchPhase::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchInput {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub phase: TouchPhaseInput,
    pub timestamp_ms: f64,
}

/// Pose of a platform anchor that is currently tracked
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnchorPoseInput {
    pub handle: u32,
    #[serde(flatten)]
    pub pose: PoseInput,
}

/// One immersive frame
///
/// Anchors missing from `anchors` are treated as not tracked this frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XrFrameInput {
    pub timestamp_ms: f64,
    pub viewer: PoseInput,
    pub hits: Vec<HitInput>,
    pub select: bool,
    pub touches: Vec<TouchInput>,
    pub anchors: Vec<AnchorPoseInput>,
}

impl XrFrameInput {
    pub fn to_frame(&self) -> XrFrame {
        XrFrame {
            timestamp: millis(self.timestamp_ms),
            viewer: self.viewer.into(),
            hits: self
                .hits
                .iter()
                .map(|hit| SurfaceHit {
                    pose: hit.pose.into(),
                    distance: hit.distance,
                })
                .collect(),
            select: self.select,
            touches: self
                .touches
                .iter()
                .map(|touch| {
                    TouchPoint::new(
                        touch.id.into(),
                        Vec2::new(touch.x, touch.y),
                        touch.phase.into(),
                        millis(touch.timestamp_ms),
                    )
                })
                .collect(),
        }
    }

    pub fn anchor_poses(&self) -> impl Iterator<Item = (AnchorHandle, Pose)> + '_ {
        self.anchors
            .iter()
            .map(|anchor| (AnchorHandle(anchor.handle.into()), anchor.pose.into()))
    }
}
