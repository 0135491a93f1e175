//! Scripted input scenarios
//!
//! A scenario is a RON file listing input steps. Each step expands to one or
//! more frames:
//!
//! ```ron
//! Scenario(
//!     name: "drag",
//!     variant: webcam,
//!     depth: Some(2.0),
//!     steps: [
//!         Hand(shape: Pinch, from: (0.5, 0.5), to: Some((0.3, 0.5)), frames: 10),
//!         Hand(shape: Open, from: (0.3, 0.5), frames: 2),
//!     ],
//! )
//! ```

use devices::OrientationReading;
use glam::{Vec2, Vec3};
use placement::{Facing, Variant};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sim::HandShape;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("{0}")]
    Invalid(String),
}

/// One scripted input step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Show a hand, optionally moving the pointer linearly from `from` to `to`
    Hand {
        shape: HandShape,
        from: Vec2,
        #[serde(default)]
        to: Option<Vec2>,
        #[serde(default = "one")]
        frames: u32,
    },
    /// Frames with no input
    Idle {
        #[serde(default = "one")]
        frames: u32,
    },
    /// Device orientation reading for the next frame
    Orientation(OrientationReading),
    /// Move the tracked viewer (immersive)
    Viewer { position: Vec3, yaw_degrees: f32 },
    /// Surface under the viewer ray, or none (immersive)
    Surface(Option<Vec3>),
    /// Controller select for one frame (immersive)
    Tap,
    ToggleGridSnap,
    ClearAll,
    SwitchCamera(Facing),
}

fn one() -> u32 {
    1
}

impl Step {
    /// Frames this step consumes
    pub fn frame_count(&self) -> u32 {
        match self {
            Step::Hand { frames, .. } | Step::Idle { frames } => *frames,
            Step::Tap => 1,
            _ => 0,
        }
    }

    fn immersive_only(&self) -> bool {
        matches!(self, Step::Viewer { .. } | Step::Surface(_) | Step::Tap)
    }

    fn webcam_only(&self) -> bool {
        matches!(self, Step::Hand { .. } | Step::Orientation(_) | Step::SwitchCamera(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub variant: Variant,
    /// Simulated distance reported by the depth model, if any
    #[serde(default)]
    pub depth: Option<f32>,
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
    pub steps: Vec<Step>,
}

fn default_frame_interval() -> u64 {
    16
}

impl Scenario {
    /// Load and validate a RON scenario file
    pub fn load_from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&content)
    }

    pub fn from_ron(content: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject steps that make no sense for the scenario's variant
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for (index, step) in self.steps.iter().enumerate() {
            let wrong_variant = match self.variant {
                Variant::Webcam => step.immersive_only(),
                Variant::Xr => step.webcam_only(),
            };
            if wrong_variant {
                return Err(ScenarioError::Invalid(format!(
                    "step {} ({:?}) is not available in the {} variant",
                    index, step, self.variant
                )));
            }
        }
        if self.frame_interval_ms == 0 {
            return Err(ScenarioError::Invalid("frame_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn total_frames(&self) -> u64 {
        self.steps.iter().map(|step| step.frame_count() as u64).sum()
    }

    /// Built-in scenario for a variant
    pub fn demo(variant: Variant) -> Self {
        match variant {
            Variant::Webcam => Self::webcam_demo(),
            Variant::Xr => Self::xr_demo(),
        }
    }

    /// Place a cube, drag it, place a second, then delete the first
    fn webcam_demo() -> Self {
        let center = Vec2::new(0.5, 0.5);
        let left = Vec2::new(0.3, 0.5);
        let right = Vec2::new(0.7, 0.4);
        Self {
            name: "webcam-demo".to_string(),
            variant: Variant::Webcam,
            depth: Some(2.0),
            frame_interval_ms: 16,
            steps: vec![
                Step::Orientation(OrientationReading::new(0.0, 90.0, 0.0)),
                Step::Idle { frames: 6 },
                Step::Hand { shape: HandShape::Open, from: center, to: None, frames: 3 },
                Step::Hand { shape: HandShape::Pinch, from: center, to: Some(left), frames: 20 },
                Step::Hand { shape: HandShape::Open, from: left, to: None, frames: 3 },
                Step::Hand { shape: HandShape::Open, from: left, to: Some(right), frames: 10 },
                Step::Hand { shape: HandShape::Pinch, from: right, to: None, frames: 5 },
                Step::Hand { shape: HandShape::Open, from: right, to: None, frames: 3 },
                Step::Orientation(OrientationReading::new(10.0, 90.0, 0.0)),
                Step::Idle { frames: 5 },
                Step::Orientation(OrientationReading::new(0.0, 90.0, 0.0)),
                Step::Hand { shape: HandShape::Fist, from: left, to: None, frames: 3 },
                Step::Hand { shape: HandShape::Open, from: left, to: None, frames: 2 },
            ],
        }
    }

    /// Tap two cubes onto the floor and walk around them
    fn xr_demo() -> Self {
        Self {
            name: "xr-demo".to_string(),
            variant: Variant::Xr,
            depth: None,
            frame_interval_ms: 16,
            steps: vec![
                Step::Viewer { position: Vec3::new(0.0, 1.6, 0.0), yaw_degrees: 0.0 },
                Step::Idle { frames: 5 },
                Step::Tap,
                Step::Surface(Some(Vec3::new(0.1, 0.0, -1.9))),
                Step::Idle { frames: 3 },
                Step::Tap,
                Step::Surface(Some(Vec3::new(1.0, 0.0, -2.4))),
                Step::Tap,
                Step::Viewer { position: Vec3::new(0.5, 1.6, -0.5), yaw_degrees: 30.0 },
                Step::Idle { frames: 10 },
                Step::Surface(None),
                Step::Tap,
                Step::Idle { frames: 3 },
            ],
        }
    }
}
