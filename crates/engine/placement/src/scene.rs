//! Render scene boundary
//!
//! Placement never draws anything itself. Cube meshes, the selection
//! highlight and the reticle live in an external renderer that is driven
//! through [`RenderScene`]. [`CommandQueue`] records the calls as
//! serializable commands for hosts that sync the scene on their own schedule.

use serde::{Deserialize, Serialize};

use crate::camera::Pose;
use crate::store::ObjectId;

/// Render operations issued by the placement system
///
/// Every cube is keyed by its [`ObjectId`]. Implementations should treat
/// updates and removals of unknown ids as no-ops.
pub trait RenderScene {
    /// Create a cube mesh of the given edge length
    fn add_cube(&mut self, id: ObjectId, size: f32, pose: Pose);

    /// Move an existing cube mesh
    fn update_cube(&mut self, id: ObjectId, pose: Pose);

    /// Remove a cube mesh and free its resources
    fn remove_cube(&mut self, id: ObjectId);

    /// Highlight one cube, or none
    fn set_highlight(&mut self, id: Option<ObjectId>);

    /// Show the placement reticle at a pose, or hide it
    fn set_reticle(&mut self, pose: Option<Pose>);
}

/// A recorded scene operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneCommand {
    AddCube { id: ObjectId, size: f32, pose: Pose },
    UpdateCube { id: ObjectId, pose: Pose },
    RemoveCube { id: ObjectId },
    Highlight { id: Option<ObjectId> },
    Reticle { pose: Option<Pose> },
}

impl SceneCommand {
    /// The cube this command targets, if any
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            SceneCommand::AddCube { id, .. }
            | SceneCommand::UpdateCube { id, .. }
            | SceneCommand::RemoveCube { id } => Some(*id),
            SceneCommand::Highlight { id } => *id,
            SceneCommand::Reticle { .. } => None,
        }
    }
}

/// Scene that buffers commands until the host drains them
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    commands: Vec<SceneCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all commands recorded since the last drain
    pub fn drain(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn pending(&self) -> &[SceneCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl RenderScene for CommandQueue {
    fn add_cube(&mut self, id: ObjectId, size: f32, pose: Pose) {
        self.commands.push(SceneCommand::AddCube { id, size, pose });
    }

    fn update_cube(&mut self, id: ObjectId, pose: Pose) {
        self.commands.push(SceneCommand::UpdateCube { id, pose });
    }

    fn remove_cube(&mut self, id: ObjectId) {
        self.commands.push(SceneCommand::RemoveCube { id });
    }

    fn set_highlight(&mut self, id: Option<ObjectId>) {
        self.commands.push(SceneCommand::Highlight { id });
    }

    fn set_reticle(&mut self, pose: Option<Pose>) {
        self.commands.push(SceneCommand::Reticle { pose });
    }
}
