//! Shared fixtures for placement integration tests

#![allow(dead_code)]

use devices::hand::{INDEX_TIP, LANDMARK_COUNT, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP, WRIST};
use devices::HandLandmarks;
use glam::{Vec2, Vec3};
use placement::{
    AcquireError, AnchorHandle, AnchorPlatform, AnchorRequestId, ArSession, CaptureDevice,
    CaptureSource, CommandQueue, PlacementConfig, Pose, Variant,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Capture device that always starts
pub struct AlwaysOn;

impl CaptureDevice for AlwaysOn {
    fn start(&mut self, _source: &CaptureSource) -> Result<(), AcquireError> {
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Observable state of a [`RecordingAnchors`] platform
#[derive(Debug, Default)]
pub struct AnchorLog {
    pub requested: Vec<(AnchorRequestId, Pose)>,
    pub released: Vec<AnchorHandle>,
    pub poses: HashMap<AnchorHandle, Pose>,
}

/// Anchor platform that records every call
#[derive(Clone, Default)]
pub struct RecordingAnchors(pub Rc<RefCell<AnchorLog>>);

impl AnchorPlatform for RecordingAnchors {
    fn request_anchor(&mut self, pose: Pose) -> Option<AnchorRequestId> {
        let mut log = self.0.borrow_mut();
        let request = AnchorRequestId(log.requested.len() as u64 + 1);
        log.requested.push((request, pose));
        Some(request)
    }

    fn anchor_pose(&self, handle: AnchorHandle) -> Option<Pose> {
        self.0.borrow().poses.get(&handle).copied()
    }

    fn release_anchor(&mut self, handle: AnchorHandle) {
        let mut log = self.0.borrow_mut();
        log.poses.remove(&handle);
        log.released.push(handle);
    }
}

pub fn webcam_session() -> ArSession<CommandQueue> {
    ArSession::new(
        PlacementConfig::default(),
        Variant::Webcam,
        Box::new(AlwaysOn),
        CommandQueue::new(),
    )
}

pub fn xr_session(anchors: RecordingAnchors) -> ArSession<CommandQueue> {
    ArSession::new(
        PlacementConfig::default(),
        Variant::Xr,
        Box::new(AlwaysOn),
        CommandQueue::new(),
    )
    .with_anchor_platform(Box::new(anchors))
}

fn hand_at(pointer: Vec2, wrist: Vec2, thumb: Vec2, others: Vec2) -> HandLandmarks {
    let mut points = [wrist.extend(0.0); LANDMARK_COUNT];
    points[WRIST] = wrist.extend(0.0);
    points[INDEX_TIP] = pointer.extend(0.0);
    points[THUMB_TIP] = thumb.extend(0.0);
    points[MIDDLE_TIP] = others.extend(0.0);
    points[RING_TIP] = (others + Vec2::new(0.03, 0.0)).extend(0.0);
    points[PINKY_TIP] = (others + Vec2::new(0.06, 0.0)).extend(0.0);
    HandLandmarks::new(points)
}

/// Open hand pointing with the index finger
pub fn open_hand(pointer: Vec2) -> HandLandmarks {
    hand_at(
        pointer,
        pointer + Vec2::new(0.0, 0.35),
        pointer + Vec2::new(0.15, 0.05),
        pointer + Vec2::new(-0.05, 0.02),
    )
}

/// Thumb and index fingertips touching
pub fn pinching_hand(pointer: Vec2) -> HandLandmarks {
    hand_at(
        pointer,
        pointer + Vec2::new(0.0, 0.35),
        pointer + Vec2::new(0.01, 0.01),
        pointer + Vec2::new(-0.05, 0.02),
    )
}

/// All fingertips curled towards the wrist
pub fn fist(pointer: Vec2) -> HandLandmarks {
    hand_at(
        pointer,
        pointer + Vec2::new(0.0, 0.05),
        pointer + Vec2::new(0.06, 0.0),
        pointer + Vec2::new(0.0, 0.03),
    )
}

pub fn ahead(distance: f32) -> Vec3 {
    Vec3::new(0.0, 0.0, -distance)
}
