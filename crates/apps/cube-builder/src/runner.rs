//! Headless scenario playback through an [`ArSession`]

use devices::{HandTracker, OrientationReading};
use glam::{Quat, Vec3};
use placement::{
    AnchorResolution, ArSession, CaptureSource, CommandQueue, PlacementConfig, PlacementEvent,
    Pose, SceneCommand, SessionError, SurfaceHit, Variant, WebcamFrame, XrFrame,
};
use std::time::Duration;

use crate::scenario::{Scenario, Step};
use crate::sim::{flat_depth_map, floor_pose, scenario_tracker, SimulatedAnchors, SimulatedCapture};

/// Totals for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub created: usize,
    pub deleted: usize,
    pub locked: usize,
    pub scene_commands: usize,
    pub remaining: usize,
    pub live_anchors: usize,
    pub released_anchors: usize,
}

/// Input state carried between steps
#[derive(Debug, Default)]
struct Inputs {
    orientation: Option<OrientationReading>,
    viewer: Pose,
    surface: Option<Vec3>,
}

pub struct Runner {
    session: ArSession<CommandQueue>,
    anchors: SimulatedAnchors,
    hands: Box<dyn HandTracker>,
    depth: Option<f32>,
    interval: Duration,
    max_frames: Option<u64>,
    inputs: Inputs,
    summary: RunSummary,
}

impl Runner {
    pub fn new(config: PlacementConfig, scenario: &Scenario, max_frames: Option<u64>) -> Self {
        let anchors = SimulatedAnchors::new();
        let mut session = ArSession::new(
            config,
            scenario.variant,
            Box::new(SimulatedCapture::new()),
            CommandQueue::new(),
        )
        .with_anchor_platform(Box::new(anchors.clone()));
        session.set_orientation_permission(true);

        let hands = scenario_tracker(scenario);
        if hands.is_available() {
            tracing::info!("Hand tracking: {}", hands.name());
        }

        Self {
            session,
            anchors,
            hands,
            depth: scenario.depth,
            interval: Duration::from_millis(scenario.frame_interval_ms),
            max_frames,
            inputs: Inputs::default(),
            summary: RunSummary::default(),
        }
    }

    fn frame_budget_left(&self) -> bool {
        self.max_frames.map_or(true, |max| self.summary.frames < max)
    }

    fn timestamp(&self) -> Duration {
        self.interval * self.summary.frames as u32
    }

    /// Play every step, stopping early when the frame budget runs out
    pub fn run(mut self, scenario: &Scenario) -> Result<RunSummary, SessionError> {
        let source = match scenario.variant {
            Variant::Webcam => CaptureSource::default(),
            Variant::Xr => CaptureSource::Immersive,
        };
        self.session.start(source)?;
        tracing::info!(
            "Running scenario '{}' ({} frames)",
            scenario.name,
            scenario.total_frames()
        );

        for step in &scenario.steps {
            if !self.frame_budget_left() {
                tracing::info!("Frame limit reached");
                break;
            }
            self.step(step)?;
        }

        self.session.stop();
        self.flush_scene();
        self.summary.remaining = self.session.store().len();
        self.summary.live_anchors = self.anchors.live_count();
        self.summary.released_anchors = self.anchors.released_count();
        Ok(self.summary)
    }

    fn step(&mut self, step: &Step) -> Result<(), SessionError> {
        match step {
            Step::Hand { frames, .. } => {
                for _ in 0..*frames {
                    self.webcam_frame()?;
                }
            }
            Step::Idle { frames } => {
                for _ in 0..*frames {
                    match self.session.variant() {
                        Variant::Webcam => self.webcam_frame()?,
                        Variant::Xr => self.xr_frame(false)?,
                    }
                }
            }
            Step::Orientation(reading) => self.inputs.orientation = Some(*reading),
            Step::Viewer {
                position,
                yaw_degrees,
            } => {
                self.inputs.viewer = Pose::new(*position, Quat::from_rotation_y(yaw_degrees.to_radians()));
            }
            Step::Surface(surface) => self.inputs.surface = *surface,
            Step::Tap => self.xr_frame(true)?,
            Step::ToggleGridSnap => {
                self.session.toggle_grid_snap();
            }
            Step::ClearAll => {
                self.summary.deleted += self.session.clear_all();
            }
            Step::SwitchCamera(facing) => {
                self.session.switch_source(CaptureSource::Facing(*facing))?;
            }
        }
        Ok(())
    }

    fn webcam_frame(&mut self) -> Result<(), SessionError> {
        if !self.frame_budget_left() {
            return Ok(());
        }

        let frame = WebcamFrame {
            timestamp: self.timestamp(),
            hand: self.hands.poll(),
            orientation: self.inputs.orientation.take(),
        };
        let report = self.session.process_webcam_frame(&frame)?;

        // The simulated depth model answers immediately
        if let (Some(request), Some(distance)) = (report.depth_request, self.depth) {
            match flat_depth_map(distance, &self.session.config().depth.scale) {
                Ok(map) => {
                    self.session.deliver_depth_map(request, map);
                }
                Err(err) => tracing::warn!("Simulated depth map rejected: {}", err),
            }
        }

        self.record(&report.events);
        Ok(())
    }

    fn xr_frame(&mut self, select: bool) -> Result<(), SessionError> {
        if !self.frame_budget_left() {
            return Ok(());
        }

        let viewer = self.inputs.viewer;
        let hits = self
            .inputs
            .surface
            .map(|position| SurfaceHit {
                pose: floor_pose(position),
                distance: position.distance(viewer.position),
            })
            .into_iter()
            .collect();

        let frame = XrFrame {
            timestamp: self.timestamp(),
            viewer,
            hits,
            select,
            touches: Vec::new(),
        };
        let report = self.session.process_xr_frame(&frame)?;
        self.record(&report.events);

        for (request, handle) in self.anchors.resolve_pending() {
            self.session.resolve_anchor(AnchorResolution {
                session: self.session.id(),
                request,
                result: Ok(handle),
            });
        }
        Ok(())
    }

    fn record(&mut self, events: &[PlacementEvent]) {
        self.summary.frames += 1;
        for event in events {
            match event {
                PlacementEvent::Created { .. } => self.summary.created += 1,
                PlacementEvent::Deleted { .. } => self.summary.deleted += 1,
                PlacementEvent::Locked { .. } => self.summary.locked += 1,
                _ => {}
            }
            tracing::info!("Frame {}: {:?}", self.summary.frames, event);
        }
        self.flush_scene();
    }

    fn flush_scene(&mut self) {
        for command in self.session.scene_mut().drain() {
            self.summary.scene_commands += 1;
            match command {
                SceneCommand::UpdateCube { .. } | SceneCommand::Reticle { .. } => {
                    tracing::trace!("Scene: {:?}", command)
                }
                _ => tracing::debug!("Scene: {:?}", command),
            }
        }
    }
}
