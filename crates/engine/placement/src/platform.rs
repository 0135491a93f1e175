//! Platform collaborators: spatial anchors and capture devices

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::camera::Pose;
use crate::error::{AcquireError, AnchorError};
use crate::session::SessionId;

/// Handle to a spatial anchor owned by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorHandle(pub u64);

/// Ticket for an anchor creation request that has not resolved yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorRequestId(pub u64);

impl fmt::Display for AnchorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor#{}", self.0)
    }
}

impl fmt::Display for AnchorRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request#{}", self.0)
    }
}

/// Spatial anchor support of an immersive session
///
/// Creation is asynchronous: [`AnchorPlatform::request_anchor`] only issues
/// the request, and the outcome comes back later as an
/// [`AnchorResolution`] through [`crate::ArSession::resolve_anchor`].
pub trait AnchorPlatform {
    /// Start creating an anchor at `pose`
    ///
    /// Returns None when the platform has no anchor support.
    fn request_anchor(&mut self, pose: Pose) -> Option<AnchorRequestId>;

    /// Current pose of a live anchor, None while tracking is lost
    fn anchor_pose(&self, handle: AnchorHandle) -> Option<Pose>;

    /// Destroy an anchor
    fn release_anchor(&mut self, handle: AnchorHandle);
}

/// Platform without spatial anchors
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnchors;

impl AnchorPlatform for NoAnchors {
    fn request_anchor(&mut self, _pose: Pose) -> Option<AnchorRequestId> {
        None
    }

    fn anchor_pose(&self, _handle: AnchorHandle) -> Option<Pose> {
        None
    }

    fn release_anchor(&mut self, _handle: AnchorHandle) {}
}

/// Completed anchor request, delivered back to the session that issued it
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorResolution {
    pub session: SessionId,
    pub request: AnchorRequestId,
    pub result: Result<AnchorHandle, AnchorError>,
}

/// Which way a camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Rear camera
    #[default]
    Environment,
    /// Front ("selfie") camera
    User,
}

/// What to capture from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    /// Any camera facing the given way
    Facing(Facing),
    /// A specific camera by device id
    Device(String),
    /// An immersive AR session
    Immersive,
}

impl Default for CaptureSource {
    fn default() -> Self {
        CaptureSource::Facing(Facing::default())
    }
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Facing(Facing::Environment) => write!(f, "environment camera"),
            CaptureSource::Facing(Facing::User) => write!(f, "user camera"),
            CaptureSource::Device(id) => write!(f, "camera {}", id),
            CaptureSource::Immersive => write!(f, "immersive session"),
        }
    }
}

/// Camera stream or immersive session provider
pub trait CaptureDevice {
    /// Acquire the source; the previous one must already be stopped
    fn start(&mut self, source: &CaptureSource) -> Result<(), AcquireError>;

    /// Release whatever is currently acquired
    fn stop(&mut self);
}
