//! AR session: owns all placement state and runs the frame loop
//!
//! One [`ArSession`] replaces what would otherwise be a pile of global
//! mutable state. Each frame runs in a fixed order:
//!
//! 1. update the camera (orientation sensor or tracked viewer pose)
//! 2. classify input (hand gesture or tap)
//! 3. run the placement controller
//! 4. update anchored objects
//!
//! Render sync happens through the [`RenderScene`] the session owns.
//!
//! Asynchronous work (depth estimation, anchor creation) is handed out as
//! tickets tagged with the [`SessionId`]. Every start or stop bumps the id,
//! so results that arrive after a source switch are recognised as stale.

use devices::{
    GestureClassifier, GestureFrame, HandLandmarks, OrientationReading, OrientationSensor,
    TapDetector, TouchPoint,
};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::anchor::AnchorUpdater;
use crate::camera::{Camera, Pose};
use crate::config::PlacementConfig;
use crate::controller::{PlacementContext, PlacementController, PlacementEvent};
use crate::depth::{
    DepthMap, DepthProvider, DepthRequest, EstimatedDepth, HitTestDepth, SurfaceHit,
};
use crate::error::SessionError;
use crate::platform::{
    AnchorPlatform, AnchorResolution, CaptureDevice, CaptureSource, NoAnchors,
};
use crate::scene::RenderScene;
use crate::store::{ObjectId, ObjectStore, PlatformAnchor};

/// Generation counter for a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Plain camera stream, hand gestures, estimated depth
    #[default]
    Webcam,
    /// Immersive session with hit testing and spatial anchors
    Xr,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Webcam => write!(f, "webcam"),
            Variant::Xr => write!(f, "xr"),
        }
    }
}

/// Input for one webcam frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebcamFrame {
    /// Time since the session started
    pub timestamp: Duration,
    /// Landmarks of the tracked hand, if one is visible
    pub hand: Option<HandLandmarks>,
    /// Latest device orientation reading, if one arrived since the last frame
    pub orientation: Option<OrientationReading>,
}

/// Input for one immersive frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XrFrame {
    pub timestamp: Duration,
    /// Tracked viewer pose
    pub viewer: Pose,
    /// Surface hits along the viewer ray
    pub hits: Vec<SurfaceHit>,
    /// A controller select event fired this frame
    pub select: bool,
    /// Raw touch events since the last frame
    pub touches: Vec<TouchPoint>,
}

/// What happened during one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub gesture: Option<GestureFrame>,
    pub events: Vec<PlacementEvent>,
    /// Depth map refresh the host should start
    pub depth_request: Option<DepthRequest>,
    /// Locked objects moved by the anchor update
    pub anchored_moves: usize,
}

/// Per-variant tracking state of a running session
#[derive(Debug)]
enum Tracking {
    Stopped,
    Webcam {
        depth: EstimatedDepth,
        classifier: GestureClassifier,
    },
    Xr {
        depth: HitTestDepth,
        taps: TapDetector,
    },
}

/// A placement session driving one render scene
pub struct ArSession<S: RenderScene> {
    config: PlacementConfig,
    variant: Variant,
    id: SessionId,
    source: Option<CaptureSource>,
    capture: Box<dyn CaptureDevice>,
    anchors: Box<dyn AnchorPlatform>,
    scene: S,
    camera: Camera,
    orientation: OrientationSensor,
    store: ObjectStore,
    controller: PlacementController,
    updater: AnchorUpdater,
    tracking: Tracking,
    reticle: Option<Pose>,
}

impl<S: RenderScene> ArSession<S> {
    pub fn new(
        config: PlacementConfig,
        variant: Variant,
        capture: Box<dyn CaptureDevice>,
        scene: S,
    ) -> Self {
        let controller = PlacementController::new(&config);
        let camera = Camera::from_config(&config.camera);
        Self {
            config,
            variant,
            id: SessionId::default(),
            source: None,
            capture,
            anchors: Box::new(NoAnchors),
            scene,
            camera,
            orientation: OrientationSensor::new(),
            store: ObjectStore::new(),
            controller,
            updater: AnchorUpdater::new(),
            tracking: Tracking::Stopped,
            reticle: None,
        }
    }

    /// Use a platform with spatial anchor support
    pub fn with_anchor_platform(mut self, anchors: Box<dyn AnchorPlatform>) -> Self {
        self.anchors = anchors;
        self
    }

    /// Acquire a capture source and begin tracking
    ///
    /// A running source is stopped first. Acquisition failures are fatal to
    /// the start and are not retried.
    pub fn start(&mut self, source: CaptureSource) -> Result<SessionId, SessionError> {
        if self.source.is_some() {
            self.stop();
        }

        if let Err(err) = self.capture.start(&source) {
            tracing::error!("Failed to start {}: {}", source, err);
            return Err(err.into());
        }

        self.id = self.id.next();
        self.tracking = match self.variant {
            Variant::Webcam => Tracking::Webcam {
                depth: EstimatedDepth::new(
                    self.id,
                    self.config.depth.scale,
                    self.config.depth.refresh_interval(),
                ),
                classifier: GestureClassifier::new(self.config.gesture),
            },
            Variant::Xr => Tracking::Xr {
                depth: HitTestDepth::new(),
                taps: TapDetector::new(self.config.tap),
            },
        };
        self.camera = Camera::from_config(&self.config.camera);
        self.orientation.recenter();

        tracing::info!("Started {} session {} on {}", self.variant, self.id, source);
        self.source = Some(source);
        Ok(self.id)
    }

    /// Release the capture source
    ///
    /// Placed objects are kept and locked where they are. Anchor requests
    /// still in flight are abandoned.
    pub fn stop(&mut self) {
        let Some(source) = self.source.take() else {
            return;
        };

        self.capture.stop();
        self.release_selection();

        let abandoned = self.store.abandon_pending_anchors();
        if abandoned > 0 {
            tracing::warn!("Abandoned {} pending anchor requests", abandoned);
        }

        self.set_reticle(None);
        self.tracking = Tracking::Stopped;
        self.id = self.id.next();
        tracing::info!("Stopped {}", source);
    }

    /// Stop the current source and start another
    pub fn switch_source(&mut self, source: CaptureSource) -> Result<SessionId, SessionError> {
        tracing::info!("Switching capture source to {}", source);
        self.stop();
        self.start(source)
    }

    fn expect_variant(&self, actual: Variant) -> Result<(), SessionError> {
        if self.source.is_none() {
            return Err(SessionError::NotStarted);
        }
        if self.variant != actual {
            return Err(SessionError::VariantMismatch {
                expected: self.variant,
                actual,
            });
        }
        Ok(())
    }

    fn set_reticle(&mut self, pose: Option<Pose>) {
        if self.reticle != pose {
            self.scene.set_reticle(pose);
            self.reticle = pose;
        }
    }

    fn release_selection(&mut self) {
        let mut ctx = PlacementContext {
            camera: &self.camera,
            store: &mut self.store,
            scene: &mut self.scene,
            anchors: self.anchors.as_mut(),
        };
        self.controller.deselect(&mut ctx);
    }

    /// Process one webcam frame
    pub fn process_webcam_frame(&mut self, frame: &WebcamFrame) -> Result<FrameReport, SessionError> {
        self.expect_variant(Variant::Webcam)?;

        if let Some(reading) = frame.orientation {
            self.orientation.update(reading);
        }
        if let Some(rotation) = self.orientation.camera_rotation() {
            self.camera.rotation = rotation;
        }

        let Tracking::Webcam { depth, classifier } = &mut self.tracking else {
            return Err(SessionError::NotStarted);
        };

        let mut report = FrameReport {
            depth_request: depth.poll_refresh(frame.timestamp),
            ..FrameReport::default()
        };

        let gesture = classifier.classify(frame.hand.as_ref());
        let mut reticle = self.reticle;
        if let Some(gesture) = gesture {
            reticle = Some(self.controller.pointer_reticle(&self.camera, gesture.pointer, depth));

            let mut ctx = PlacementContext {
                camera: &self.camera,
                store: &mut self.store,
                scene: &mut self.scene,
                anchors: self.anchors.as_mut(),
            };
            report.events = self.controller.handle_gesture(&mut ctx, &gesture, depth);
            tracing::debug!("Gesture {} at {:?}", gesture.label(), gesture.pointer);
        }
        report.gesture = gesture;
        self.set_reticle(reticle);

        report.anchored_moves = self.updater.update(
            &self.camera,
            &mut self.store,
            self.anchors.as_ref(),
            &mut self.scene,
        );
        Ok(report)
    }

    /// Process one immersive frame
    pub fn process_xr_frame(&mut self, frame: &XrFrame) -> Result<FrameReport, SessionError> {
        self.expect_variant(Variant::Xr)?;

        self.camera.set_pose(frame.viewer);

        let Tracking::Xr { depth, taps } = &mut self.tracking else {
            return Err(SessionError::NotStarted);
        };

        depth.update(&frame.hits);
        // The hit-test source follows the viewer ray, so sample the view center
        let surface = depth.sample(Vec2::splat(0.5)).surface();
        // Feed every touch to the detector even when select already fired
        let touch_tapped = !taps.update_all(&frame.touches).is_empty();
        let tapped = frame.select || touch_tapped;

        let mut report = FrameReport::default();
        if tapped {
            let mut ctx = PlacementContext {
                camera: &self.camera,
                store: &mut self.store,
                scene: &mut self.scene,
                anchors: self.anchors.as_mut(),
            };
            report.events = self.controller.handle_tap(&mut ctx, surface);
        }
        self.set_reticle(surface);

        report.anchored_moves = self.updater.update(
            &self.camera,
            &mut self.store,
            self.anchors.as_ref(),
            &mut self.scene,
        );
        Ok(report)
    }

    /// Hand a finished depth map back to the session
    ///
    /// Returns false when the map was stale and dropped.
    pub fn deliver_depth_map(&mut self, request: DepthRequest, map: DepthMap) -> bool {
        match &mut self.tracking {
            Tracking::Webcam { depth, .. } => depth.deliver(request, map),
            _ => {
                tracing::debug!("Dropping depth map: no webcam session running");
                false
            }
        }
    }

    /// Hand a finished anchor request back to the session
    ///
    /// Returns the object that now owns the anchor. Handles created for
    /// deleted objects or an old session are released right away.
    pub fn resolve_anchor(&mut self, resolution: AnchorResolution) -> Option<ObjectId> {
        let AnchorResolution {
            session,
            request,
            result,
        } = resolution;

        if session != self.id {
            tracing::warn!("Ignoring anchor {} from stale session {}", request, session);
            if let Ok(handle) = result {
                self.anchors.release_anchor(handle);
            }
            return None;
        }

        let Some(id) = self.store.find_pending(request) else {
            tracing::debug!("Anchor {} resolved for a deleted object", request);
            if let Ok(handle) = result {
                self.anchors.release_anchor(handle);
            }
            return None;
        };

        match result {
            Ok(handle) => {
                self.store.set_platform_anchor(id, PlatformAnchor::Attached(handle));
                tracing::info!("Attached {} to {}", handle, id);
                Some(id)
            }
            Err(err) => {
                tracing::warn!("Anchor creation for {} failed: {}", id, err);
                self.store.set_platform_anchor(id, PlatformAnchor::Unavailable);
                None
            }
        }
    }

    /// Allow or deny orientation readings
    pub fn set_orientation_permission(&mut self, granted: bool) {
        self.orientation.set_permission(granted);
    }

    /// Make the next orientation reading the forward direction
    pub fn recenter(&mut self) {
        self.orientation.recenter();
    }

    pub fn toggle_grid_snap(&mut self) -> bool {
        self.controller.toggle_grid_snap()
    }

    /// Delete every placed object
    pub fn clear_all(&mut self) -> usize {
        let mut ctx = PlacementContext {
            camera: &self.camera,
            store: &mut self.store,
            scene: &mut self.scene,
            anchors: self.anchors.as_mut(),
        };
        self.controller.clear_all(&mut ctx)
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_running(&self) -> bool {
        self.source.is_some()
    }

    pub fn source(&self) -> Option<&CaptureSource> {
        self.source.as_ref()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn grid_snap(&self) -> bool {
        self.controller.grid_snap()
    }

    pub fn reticle(&self) -> Option<Pose> {
        self.reticle
    }
}
