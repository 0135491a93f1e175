//! Screen-to-world projection, grid snapping and ray picking
//!
//! Screen points are normalized to [0, 1] on both axes with the origin at the
//! top-left of the camera image. The preview of a front-facing camera is
//! mirrored, so screen x is flipped before conversion to NDC.

use glam::{Quat, Vec2, Vec3};

use crate::camera::Camera;

/// Ray with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at distance `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Convert a mirrored normalized screen point to NDC x/y
pub fn screen_to_ndc(screen: Vec2) -> Vec2 {
    let mirrored_x = 1.0 - screen.x;
    Vec2::new(mirrored_x * 2.0 - 1.0, 1.0 - screen.y * 2.0)
}

/// Ray from the camera through a normalized screen point
pub fn screen_ray(camera: &Camera, screen: Vec2) -> Ray {
    let ndc = screen_to_ndc(screen);
    let near = camera.unproject(ndc.extend(-1.0));
    Ray::new(camera.position, near - camera.position)
}

/// World position `depth` units from the camera along the ray through `screen`
pub fn project(camera: &Camera, screen: Vec2, depth: f32) -> Vec3 {
    screen_ray(camera, screen).at(depth)
}

/// Round each coordinate to the nearest multiple of `grid_size`
///
/// Non-positive grid sizes return the position unchanged.
pub fn snap(position: Vec3, grid_size: f32) -> Vec3 {
    if !(grid_size > 0.0) {
        return position;
    }
    (position / grid_size).round() * grid_size
}

/// Ray-box intersection against an axis-aligned box
///
/// Returns the distance to the entry point, or to the exit point when the ray
/// starts inside the box.
pub fn intersect_box(ray: &Ray, box_min: Vec3, box_max: Vec3) -> Option<f32> {
    let inv_dir = ray.direction.recip();
    let t_min = (box_min - ray.origin) * inv_dir;
    let t_max = (box_max - ray.origin) * inv_dir;

    let t1 = t_min.min(t_max);
    let t2 = t_min.max(t_max);

    let t_near = t1.max_element();
    let t_far = t2.min_element();

    if t_near.is_nan() || t_far.is_nan() || t_near > t_far || t_far < 0.0 {
        return None;
    }

    Some(if t_near > 0.0 { t_near } else { t_far })
}

/// A cube that may be rotated, used for picking placed objects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeBounds {
    pub center: Vec3,
    pub orientation: Quat,
    pub size: f32,
}

impl CubeBounds {
    pub fn new(center: Vec3, orientation: Quat, size: f32) -> Self {
        Self {
            center,
            orientation,
            size,
        }
    }

    /// Distance along the ray to the cube surface
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        // Move the ray into the cube's frame; the rotation preserves distances
        let to_local = self.orientation.inverse();
        let local = Ray {
            origin: to_local * (ray.origin - self.center),
            direction: to_local * ray.direction,
        };
        let half = Vec3::splat(self.size * 0.5);
        intersect_box(&local, -half, half)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let local = self.orientation.inverse() * (point - self.center);
        local.abs().max_element() <= self.size * 0.5
    }
}
