//! Simulated platform: capture device, anchor platform and synthetic hands

use devices::hand::{INDEX_TIP, LANDMARK_COUNT, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP, WRIST};
use devices::{HandLandmarks, HandTracker, NullTracker, ReplayTracker};
use glam::{Vec2, Vec3};
use placement::{
    AcquireError, AnchorHandle, AnchorPlatform, AnchorRequestId, CaptureDevice, CaptureSource,
    DepthMap, DepthMapError, DepthScale, Pose, Variant,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::scenario::{Scenario, Step};

/// Capture device that accepts any source, one at a time
#[derive(Debug, Default)]
pub struct SimulatedCapture {
    active: Option<CaptureSource>,
}

impl SimulatedCapture {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureDevice for SimulatedCapture {
    fn start(&mut self, source: &CaptureSource) -> Result<(), AcquireError> {
        if self.active.is_some() {
            return Err(AcquireError::Other("previous source still running".to_string()));
        }
        tracing::debug!("Simulated capture started: {}", source);
        self.active = Some(source.clone());
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(source) = self.active.take() {
            tracing::debug!("Simulated capture stopped: {}", source);
        }
    }
}

#[derive(Debug, Default)]
struct AnchorState {
    next_request: u64,
    next_handle: u64,
    pending: Vec<(AnchorRequestId, Pose)>,
    live: HashMap<AnchorHandle, Pose>,
    released: usize,
}

/// Anchor platform that resolves every request on the next frame
///
/// Clones share state, so the runner can keep one handle while the session
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAnchors {
    state: Rc<RefCell<AnchorState>>,
}

impl SimulatedAnchors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create anchors for every outstanding request
    pub fn resolve_pending(&self) -> Vec<(AnchorRequestId, AnchorHandle)> {
        let mut state = self.state.borrow_mut();
        let pending = std::mem::take(&mut state.pending);
        pending
            .into_iter()
            .map(|(request, pose)| {
                state.next_handle += 1;
                let handle = AnchorHandle(state.next_handle);
                state.live.insert(handle, pose);
                (request, handle)
            })
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn released_count(&self) -> usize {
        self.state.borrow().released
    }
}

impl AnchorPlatform for SimulatedAnchors {
    fn request_anchor(&mut self, pose: Pose) -> Option<AnchorRequestId> {
        let mut state = self.state.borrow_mut();
        state.next_request += 1;
        let request = AnchorRequestId(state.next_request);
        state.pending.push((request, pose));
        Some(request)
    }

    fn anchor_pose(&self, handle: AnchorHandle) -> Option<Pose> {
        self.state.borrow().live.get(&handle).copied()
    }

    fn release_anchor(&mut self, handle: AnchorHandle) {
        let mut state = self.state.borrow_mut();
        if state.live.remove(&handle).is_some() {
            state.released += 1;
        }
    }
}

/// Hand pose to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandShape {
    /// Index finger pointing, thumb away
    Open,
    /// Thumb and index tips together
    Pinch,
    /// All fingertips curled to the palm
    Fist,
}

/// Build a 21-landmark hand whose index tip sits at `pointer`
pub fn synthetic_hand(shape: HandShape, pointer: Vec2, z: f32) -> HandLandmarks {
    let (wrist, thumb, others) = match shape {
        HandShape::Open => (Vec2::new(0.0, 0.35), Vec2::new(0.15, 0.05), Vec2::new(-0.05, 0.02)),
        HandShape::Pinch => (Vec2::new(0.0, 0.35), Vec2::new(0.01, 0.01), Vec2::new(-0.05, 0.02)),
        HandShape::Fist => (Vec2::new(0.0, 0.05), Vec2::new(0.06, 0.0), Vec2::new(0.0, 0.03)),
    };

    let at = |offset: Vec2| (pointer + offset).extend(z);
    let mut points = [at(wrist); LANDMARK_COUNT];
    points[WRIST] = at(wrist);
    points[THUMB_TIP] = at(thumb);
    points[INDEX_TIP] = pointer.extend(z);
    points[MIDDLE_TIP] = at(others);
    points[RING_TIP] = at(others + Vec2::new(0.03, 0.0));
    points[PINKY_TIP] = at(others + Vec2::new(0.06, 0.0));
    HandLandmarks::new(points)
}

/// Hand tracker that plays a scenario's hand frames back in order
///
/// Every webcam frame the scenario produces gets one entry: a synthetic hand
/// for `Hand` steps and nothing for `Idle` steps. Immersive scenarios have no
/// hand tracking.
pub fn scenario_tracker(scenario: &Scenario) -> Box<dyn HandTracker> {
    if scenario.variant == Variant::Xr {
        return Box::new(NullTracker::new());
    }

    let mut tracker = ReplayTracker::default();
    for step in &scenario.steps {
        match step {
            Step::Hand {
                shape,
                from,
                to,
                frames,
            } => {
                for i in 0..*frames {
                    let t = if *frames > 1 { i as f32 / (*frames - 1) as f32 } else { 1.0 };
                    let pointer = to.map_or(*from, |to| from.lerp(to, t));
                    tracker.push(Some(synthetic_hand(*shape, pointer, 0.0)));
                }
            }
            Step::Idle { frames } => (0..*frames).for_each(|_| tracker.push(None)),
            _ => {}
        }
    }
    Box::new(tracker)
}

/// Depth map that reads as `distance` everywhere under `scale`
pub fn flat_depth_map(distance: f32, scale: &DepthScale) -> Result<DepthMap, DepthMapError> {
    let raw = (distance - scale.offset) / scale.range;
    DepthMap::uniform(16, 12, raw)
}

/// Surface pose on a horizontal plane
pub fn floor_pose(position: Vec3) -> Pose {
    Pose::from_position(position)
}
