//! Camera and pose types
//!
//! # Coordinate System
//!
//! Uses OpenGL convention:
//! - +X is right
//! - +Y is up
//! - -Z is forward (into the screen)

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Default vertical field of view: 75 degrees
pub const DEFAULT_VFOV: f32 = 75.0 * std::f32::consts::PI / 180.0;

/// Position and orientation in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose at a position with no rotation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    /// Local-to-world transform
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

/// Projection parameters for the camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub vfov_degrees: f32,
    /// Viewport width / height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            vfov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

/// Perspective camera following the device
///
/// In the webcam variant the camera sits at the origin and only its rotation
/// follows the orientation sensor. In the WebXR variant the full viewer pose
/// is copied in every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Camera rotation (orientation) as quaternion
    pub rotation: Quat,
    /// Vertical field of view in radians
    pub vfov: f32,
    /// Viewport width / height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl Camera {
    /// Create a camera at the origin looking down -Z
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            vfov: config.vfov_degrees.to_radians(),
            aspect: config.aspect,
            near: config.near,
            far: config.far,
        }
    }

    /// Create camera with position looking at target
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let mut camera = Self {
            position,
            ..Self::default()
        };
        camera.set_look_at(target, up);
        camera
    }

    /// Rotate the camera to look at a target position
    pub fn set_look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize();
        let right = forward.cross(up).normalize();
        let cam_up = right.cross(forward);

        // In camera space: right=+X, up=+Y, forward=-Z
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, cam_up, -forward));
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    /// Adopt a tracked viewer pose
    pub fn set_pose(&mut self, pose: Pose) {
        self.position = pose.position;
        self.rotation = pose.orientation;
    }

    /// Get the forward direction vector
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction vector
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction vector
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Camera-to-world transform
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.vfov, self.aspect, self.near, self.far)
    }

    /// Map a point in normalized device coordinates back to world space
    ///
    /// `ndc.z = -1` lies on the near plane, `ndc.z = 1` on the far plane.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        let inverse_projection = self.projection_matrix().inverse();
        self.world_matrix()
            .transform_point3(inverse_projection.project_point3(ndc))
    }

    /// Map a world point to normalized device coordinates
    pub fn project(&self, world: Vec3) -> Vec3 {
        (self.projection_matrix() * self.view_matrix()).project_point3(world)
    }

    /// Convert a world-space point into the camera's local frame
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    /// Convert a point in the camera's local frame to world space
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.rotation * local + self.position
    }
}
