//! Depth providers
//!
//! Placement needs to know how far away a screen point is. Two backends
//! answer that question:
//!
//! - [`EstimatedDepth`]: a monocular depth map produced by a model running
//!   on the webcam image. The model is slow, so the map is refreshed on a
//!   fixed cadence and sampled from the last delivered result.
//! - [`HitTestDepth`]: real-time surface hit tests from an immersive session.
//!
//! Neither backend fails. Missing data is reported as
//! [`DepthSample::Unavailable`] and callers pick a fallback.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::camera::Pose;
use crate::error::DepthMapError;
use crate::session::SessionId;

/// Result of a depth query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DepthSample {
    /// Distance from the camera along the view ray
    Distance(f32),
    /// A detected surface
    Surface(Pose),
    Unavailable,
}

impl DepthSample {
    /// Distance from `origin`, if any data is available
    pub fn distance_from(&self, origin: Vec3) -> Option<f32> {
        match self {
            DepthSample::Distance(d) => Some(*d),
            DepthSample::Surface(pose) => Some(pose.position.distance(origin)),
            DepthSample::Unavailable => None,
        }
    }

    pub fn surface(&self) -> Option<Pose> {
        match self {
            DepthSample::Surface(pose) => Some(*pose),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, DepthSample::Unavailable)
    }
}

/// Common contract for depth backends
pub trait DepthProvider {
    /// Depth at a normalized screen point
    fn sample(&self, screen: Vec2) -> DepthSample;
}

/// Linear mapping from raw depth-model output to distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthScale {
    pub offset: f32,
    pub range: f32,
}

impl Default for DepthScale {
    fn default() -> Self {
        Self {
            offset: 0.5,
            range: 4.5,
        }
    }
}

impl DepthScale {
    pub fn apply(&self, raw: f32) -> f32 {
        self.offset + raw * self.range
    }
}

/// Fallback distance derived from a hand landmark's relative z
///
/// Landmark z grows as the hand moves away from the camera, so the distance
/// shrinks as z grows: `base + (1 - z) * range`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandDepthHeuristic {
    pub base: f32,
    pub range: f32,
}

impl Default for HandDepthHeuristic {
    fn default() -> Self {
        Self {
            base: 1.0,
            range: 2.5,
        }
    }
}

impl HandDepthHeuristic {
    pub fn apply(&self, hand_z: f32) -> f32 {
        self.base + (1.0 - hand_z) * self.range
    }
}

/// Row-major per-pixel raw depth values
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl DepthMap {
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Result<Self, DepthMapError> {
        if width == 0 || height == 0 {
            return Err(DepthMapError::Empty);
        }
        if values.len() != width * height {
            return Err(DepthMapError::SizeMismatch {
                width,
                height,
                actual: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// A map with the same raw value everywhere
    pub fn uniform(width: usize, height: usize, value: f32) -> Result<Self, DepthMapError> {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw value at the pixel nearest a normalized screen point
    ///
    /// Points outside [0, 1] clamp to the border. Non-finite values read as
    /// missing.
    pub fn sample(&self, screen: Vec2) -> Option<f32> {
        let x = ((screen.x * self.width as f32).floor().max(0.0) as usize).min(self.width - 1);
        let y = ((screen.y * self.height as f32).floor().max(0.0) as usize).min(self.height - 1);
        let value = self.values[y * self.width + x];
        value.is_finite().then_some(value)
    }
}

/// Ticket for an asynchronous depth map refresh
///
/// The frame loop hands this out when a refresh is due. Whoever runs the
/// model returns the ticket with the finished map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthRequest {
    pub session: SessionId,
    pub issued_at: Duration,
}

/// Depth from a periodically refreshed estimation map
#[derive(Debug, Clone)]
pub struct EstimatedDepth {
    session: SessionId,
    scale: DepthScale,
    refresh_interval: Duration,
    last_request: Option<Duration>,
    map: Option<DepthMap>,
    map_issued_at: Option<Duration>,
}

impl EstimatedDepth {
    pub fn new(session: SessionId, scale: DepthScale, refresh_interval: Duration) -> Self {
        Self {
            session,
            scale,
            refresh_interval,
            last_request: None,
            map: None,
            map_issued_at: None,
        }
    }

    /// Issue a refresh ticket if the refresh interval has elapsed
    pub fn poll_refresh(&mut self, now: Duration) -> Option<DepthRequest> {
        let due = match self.last_request {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.refresh_interval,
        };
        if !due {
            return None;
        }

        self.last_request = Some(now);
        Some(DepthRequest {
            session: self.session,
            issued_at: now,
        })
    }

    /// Accept a finished map
    ///
    /// Maps for another session, or older than the current one, are dropped.
    pub fn deliver(&mut self, request: DepthRequest, map: DepthMap) -> bool {
        if request.session != self.session {
            tracing::debug!(
                "Dropping depth map from stale session {} (current {})",
                request.session,
                self.session
            );
            return false;
        }
        if self
            .map_issued_at
            .is_some_and(|current| request.issued_at < current)
        {
            tracing::debug!("Dropping out-of-order depth map");
            return false;
        }

        self.map = Some(map);
        self.map_issued_at = Some(request.issued_at);
        true
    }

    /// Forget the current map and start over for a new session
    pub fn reset(&mut self, session: SessionId) {
        self.session = session;
        self.last_request = None;
        self.map = None;
        self.map_issued_at = None;
    }

    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }
}

impl DepthProvider for EstimatedDepth {
    fn sample(&self, screen: Vec2) -> DepthSample {
        self.map
            .as_ref()
            .and_then(|map| map.sample(screen))
            .map_or(DepthSample::Unavailable, |raw| {
                DepthSample::Distance(self.scale.apply(raw))
            })
    }
}

/// One surface intersection reported by the platform hit test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceHit {
    pub pose: Pose,
    /// Distance from the viewer
    pub distance: f32,
}

/// Depth from platform surface hit tests along the viewer ray
///
/// The hit-test source is bound to the viewer's forward ray, so the screen
/// point passed to [`DepthProvider::sample`] is not used.
#[derive(Debug, Clone, Default)]
pub struct HitTestDepth {
    latest: Option<Pose>,
}

impl HitTestDepth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current hit with the nearest of this frame's results
    pub fn update(&mut self, hits: &[SurfaceHit]) {
        self.latest = hits
            .iter()
            .filter(|hit| hit.distance.is_finite())
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .map(|hit| hit.pose);
    }

}

impl DepthProvider for HitTestDepth {
    fn sample(&self, _screen: Vec2) -> DepthSample {
        self.latest
            .map_or(DepthSample::Unavailable, DepthSample::Surface)
    }
}
