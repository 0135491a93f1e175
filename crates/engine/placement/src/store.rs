//! Placed objects and their anchoring data
//!
//! The store is the single owner of every placed cube. It keeps the render
//! scene and the anchor platform in step with its own contents: creating an
//! object adds its mesh, deleting one removes the mesh and releases the
//! platform anchor.
//!
//! At most one object is unlocked at any time. Every operation that unlocks
//! or creates an unlocked object locks the previous one first.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::camera::{Camera, Pose};
use crate::geometry::{CubeBounds, Ray};
use crate::platform::{AnchorHandle, AnchorPlatform, AnchorRequestId};
use crate::scene::RenderScene;

/// Stable identity of a placed object, shared with the render scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cube#{}", self.0)
    }
}

/// Lifecycle of a platform spatial anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformAnchor {
    /// Creation requested, not resolved yet
    Pending(AnchorRequestId),
    /// Live anchor owned by the platform
    Attached(AnchorHandle),
    /// Creation failed or is unsupported; the object keeps its last pose
    Unavailable,
}

/// How a locked object's pose is maintained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Fixed relative to the camera
    ///
    /// `offset` is expressed in the camera's local frame as it was when the
    /// anchor was taken, and `camera_rotation` is that camera rotation.
    CameraRelative { offset: Vec3, camera_rotation: Quat },
    /// Tracked by the platform
    Platform(PlatformAnchor),
}

impl Anchor {
    /// Anchor that keeps `world` where it currently is relative to `camera`
    pub fn camera_relative(camera: &Camera, world: Vec3) -> Self {
        Anchor::CameraRelative {
            offset: camera.to_local(world),
            camera_rotation: camera.rotation,
        }
    }

    /// World position implied by a camera-relative anchor for `camera`
    pub fn resolve_camera_relative(&self, camera: &Camera) -> Option<Vec3> {
        match self {
            Anchor::CameraRelative { offset, .. } => Some(camera.to_world(*offset)),
            Anchor::Platform(_) => None,
        }
    }

    /// Offset from the camera in world axes at the time the anchor was taken
    pub fn world_offset(&self) -> Option<Vec3> {
        match self {
            Anchor::CameraRelative {
                offset,
                camera_rotation,
            } => Some(*camera_rotation * *offset),
            Anchor::Platform(_) => None,
        }
    }

    pub fn platform_handle(&self) -> Option<AnchorHandle> {
        match self {
            Anchor::Platform(PlatformAnchor::Attached(handle)) => Some(*handle),
            _ => None,
        }
    }
}

/// A cube placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub id: ObjectId,
    /// Edge length
    pub size: f32,
    pub world_position: Vec3,
    pub orientation: Quat,
    /// Distance along the view ray at creation, reused while dragging
    pub depth: f32,
    pub anchor: Anchor,
    pub locked: bool,
}

impl PlacedObject {
    pub fn pose(&self) -> Pose {
        Pose::new(self.world_position, self.orientation)
    }

    pub fn bounds(&self) -> CubeBounds {
        CubeBounds::new(self.world_position, self.orientation, self.size)
    }

    /// Freeze the current position relative to the camera and lock
    fn lock(&mut self, camera: &Camera) {
        if let Anchor::CameraRelative { .. } = self.anchor {
            self.anchor = Anchor::camera_relative(camera, self.world_position);
        }
        self.locked = true;
    }
}

/// Owner of all placed objects
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: Vec<PlacedObject>,
    next_id: u64,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ObjectId {
        self.next_id += 1;
        ObjectId(self.next_id)
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id == id)
    }

    fn insert(&mut self, object: PlacedObject, scene: &mut dyn RenderScene) -> ObjectId {
        let id = object.id;
        scene.add_cube(id, object.size, object.pose());
        tracing::info!(
            "Created {} at ({:.2}, {:.2}, {:.2}), locked={}",
            id,
            object.world_position.x,
            object.world_position.y,
            object.world_position.z,
            object.locked
        );
        self.objects.push(object);
        id
    }

    /// Lock every unlocked object except `keep`
    fn lock_others(&mut self, keep: Option<ObjectId>, camera: &Camera) {
        for object in self.objects.iter_mut() {
            if !object.locked && Some(object.id) != keep {
                object.lock(camera);
                tracing::debug!("Locked {} to make room for a new selection", object.id);
            }
        }
    }

    /// Create an object that follows input until it is locked
    pub fn create_unlocked(
        &mut self,
        position: Vec3,
        depth: f32,
        size: f32,
        camera: &Camera,
        scene: &mut dyn RenderScene,
    ) -> ObjectId {
        self.lock_others(None, camera);
        let object = PlacedObject {
            id: self.allocate_id(),
            size,
            world_position: position,
            orientation: Quat::IDENTITY,
            depth,
            anchor: Anchor::camera_relative(camera, position),
            locked: false,
        };
        self.insert(object, scene)
    }

    /// Create an object that is locked from the start
    pub fn create_locked(
        &mut self,
        pose: Pose,
        depth: f32,
        size: f32,
        anchor: Anchor,
        camera: &Camera,
        scene: &mut dyn RenderScene,
    ) -> ObjectId {
        self.lock_others(None, camera);
        let object = PlacedObject {
            id: self.allocate_id(),
            size,
            world_position: pose.position,
            orientation: pose.orientation,
            depth,
            anchor,
            locked: true,
        };
        self.insert(object, scene)
    }

    pub fn get(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut PlacedObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    /// Unlock an object for dragging, locking any other unlocked object
    pub fn unlock(&mut self, id: ObjectId, camera: &Camera) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.lock_others(Some(id), camera);
        if let Some(object) = self.get_mut(id) {
            object.locked = false;
            tracing::debug!("Unlocked {}", id);
        }
        true
    }

    /// Move an unlocked object and refresh its camera-relative offset
    pub fn move_to(
        &mut self,
        id: ObjectId,
        position: Vec3,
        camera: &Camera,
        scene: &mut dyn RenderScene,
    ) -> bool {
        let Some(object) = self.get_mut(id) else {
            return false;
        };
        if object.locked {
            tracing::warn!("Ignoring move of locked {}", id);
            return false;
        }

        object.world_position = position;
        if let Anchor::CameraRelative { .. } = object.anchor {
            object.anchor = Anchor::camera_relative(camera, position);
        }
        scene.update_cube(id, object.pose());
        true
    }

    /// Freeze an object's offset and camera rotation, then lock it
    pub fn lock(&mut self, id: ObjectId, camera: &Camera) -> bool {
        match self.get_mut(id) {
            Some(object) => {
                object.lock(camera);
                match object.anchor.world_offset() {
                    Some(offset) => tracing::info!("Locked {} at {:.2?} from the camera", id, offset),
                    None => tracing::info!("Locked {}", id),
                }
                true
            }
            None => false,
        }
    }

    /// Remove an object, its render resource and its platform anchor
    pub fn delete(
        &mut self,
        id: ObjectId,
        scene: &mut dyn RenderScene,
        anchors: &mut dyn AnchorPlatform,
    ) -> Option<PlacedObject> {
        let index = self.index_of(id)?;
        let object = self.objects.remove(index);

        scene.remove_cube(id);
        if let Some(handle) = object.anchor.platform_handle() {
            anchors.release_anchor(handle);
        }
        tracing::info!("Deleted {}", id);
        Some(object)
    }

    /// Delete every object, returning how many were removed
    pub fn clear(&mut self, scene: &mut dyn RenderScene, anchors: &mut dyn AnchorPlatform) -> usize {
        let objects = std::mem::take(&mut self.objects);
        for object in &objects {
            scene.remove_cube(object.id);
            if let Some(handle) = object.anchor.platform_handle() {
                anchors.release_anchor(handle);
            }
        }
        if !objects.is_empty() {
            tracing::info!("Cleared {} objects", objects.len());
        }
        objects.len()
    }

    /// Nearest object hit by the ray
    pub fn pick(&self, ray: &Ray) -> Option<ObjectId> {
        self.objects
            .iter()
            .filter_map(|object| object.bounds().intersect(ray).map(|t| (object.id, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Object waiting on the given anchor request
    pub fn find_pending(&self, request: AnchorRequestId) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|object| {
                object.anchor == Anchor::Platform(PlatformAnchor::Pending(request))
            })
            .map(|object| object.id)
    }

    pub fn set_platform_anchor(&mut self, id: ObjectId, state: PlatformAnchor) -> bool {
        match self.get_mut(id) {
            Some(object) => {
                object.anchor = Anchor::Platform(state);
                true
            }
            None => false,
        }
    }

    /// Give up on every outstanding anchor request
    pub fn abandon_pending_anchors(&mut self) -> usize {
        let mut count = 0;
        for object in self.objects.iter_mut() {
            if let Anchor::Platform(PlatformAnchor::Pending(_)) = object.anchor {
                object.anchor = Anchor::Platform(PlatformAnchor::Unavailable);
                count += 1;
            }
        }
        count
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlacedObject> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn unlocked_count(&self) -> usize {
        self.objects.iter().filter(|object| !object.locked).count()
    }

    /// The unlocked object, if any
    pub fn selected(&self) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|object| !object.locked)
            .map(|object| object.id)
    }
}
