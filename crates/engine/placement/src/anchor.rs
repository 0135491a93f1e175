//! Per-frame pose maintenance for locked objects

use crate::camera::{Camera, Pose};
use crate::platform::AnchorPlatform;
use crate::scene::RenderScene;
use crate::store::{Anchor, ObjectStore, PlatformAnchor};

/// Poses closer than this are not re-sent to the scene
const POSE_EPSILON: f32 = 1e-6;

/// Recomputes the world pose of every locked object from its anchor
///
/// Unlocked objects follow input and are left alone. The updater never
/// creates or destroys objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorUpdater;

impl AnchorUpdater {
    pub fn new() -> Self {
        Self
    }

    /// Update locked objects, returning how many moved
    pub fn update(
        &self,
        camera: &Camera,
        store: &mut ObjectStore,
        anchors: &dyn AnchorPlatform,
        scene: &mut dyn RenderScene,
    ) -> usize {
        let mut moved = 0;

        for object in store.iter_mut().filter(|object| object.locked) {
            let target = match object.anchor {
                Anchor::CameraRelative { offset, .. } => {
                    Pose::new(camera.to_world(offset), object.orientation)
                }
                Anchor::Platform(PlatformAnchor::Attached(handle)) => {
                    match anchors.anchor_pose(handle) {
                        Some(pose) => pose,
                        // Tracking lost: keep the last known pose
                        None => continue,
                    }
                }
                Anchor::Platform(PlatformAnchor::Pending(_) | PlatformAnchor::Unavailable) => continue,
            };

            if pose_changed(&object.pose(), &target) {
                object.world_position = target.position;
                object.orientation = target.orientation;
                scene.update_cube(object.id, target);
                moved += 1;
            }
        }

        if moved > 0 {
            tracing::trace!("Anchor update moved {} objects", moved);
        }
        moved
    }
}

fn pose_changed(a: &Pose, b: &Pose) -> bool {
    a.position.distance_squared(b.position) > POSE_EPSILON * POSE_EPSILON
        || !a.orientation.abs_diff_eq(b.orientation, POSE_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AnchorHandle, AnchorRequestId, NoAnchors};
    use crate::scene::{CommandQueue, SceneCommand};
    use glam::{Quat, Vec3};
    use std::collections::HashMap;

    #[derive(Default)]
    struct FixedAnchors(HashMap<AnchorHandle, Pose>);

    impl AnchorPlatform for FixedAnchors {
        fn request_anchor(&mut self, _pose: Pose) -> Option<AnchorRequestId> {
            None
        }

        fn anchor_pose(&self, handle: AnchorHandle) -> Option<Pose> {
            self.0.get(&handle).copied()
        }

        fn release_anchor(&mut self, handle: AnchorHandle) {
            self.0.remove(&handle);
        }
    }

    #[test]
    fn test_camera_translation_shifts_locked_object() {
        let mut camera = Camera::default();
        let mut store = ObjectStore::new();
        let mut scene = CommandQueue::new();

        let start = Vec3::new(0.5, 0.0, -2.0);
        let id = store.create_unlocked(start, 2.0, 0.5, &camera, &mut scene);
        store.lock(id, &camera);

        let delta = Vec3::new(0.3, -0.2, 1.0);
        camera.position += delta;
        let moved = AnchorUpdater::new().update(&camera, &mut store, &NoAnchors, &mut scene);

        assert_eq!(moved, 1);
        let position = store.get(id).unwrap().world_position;
        assert!((position - (start + delta)).length() < 1e-5);
    }

    #[test]
    fn test_camera_rotation_carries_object() {
        let mut camera = Camera::default();
        let mut store = ObjectStore::new();
        let mut scene = CommandQueue::new();

        let id = store.create_unlocked(Vec3::new(0.0, 0.0, -2.0), 2.0, 0.5, &camera, &mut scene);
        store.lock(id, &camera);

        camera.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        AnchorUpdater::new().update(&camera, &mut store, &NoAnchors, &mut scene);

        // Still straight ahead of the camera, which now faces -X
        let position = store.get(id).unwrap().world_position;
        assert!((position - Vec3::new(-2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_unlocked_objects_untouched() {
        let mut camera = Camera::default();
        let mut store = ObjectStore::new();
        let mut scene = CommandQueue::new();

        let id = store.create_unlocked(Vec3::new(0.0, 0.0, -2.0), 2.0, 0.5, &camera, &mut scene);
        camera.position = Vec3::new(5.0, 0.0, 0.0);

        let moved = AnchorUpdater::new().update(&camera, &mut store, &NoAnchors, &mut scene);
        assert_eq!(moved, 0);
        assert_eq!(store.get(id).unwrap().world_position, Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn test_static_camera_sends_no_updates() {
        let camera = Camera::default();
        let mut store = ObjectStore::new();
        let mut scene = CommandQueue::new();

        let id = store.create_unlocked(Vec3::new(0.0, 0.0, -2.0), 2.0, 0.5, &camera, &mut scene);
        store.lock(id, &camera);
        scene.drain();

        AnchorUpdater::new().update(&camera, &mut store, &NoAnchors, &mut scene);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_platform_anchor_pose_adopted() {
        let camera = Camera::default();
        let mut store = ObjectStore::new();
        let mut scene = CommandQueue::new();
        let mut anchors = FixedAnchors::default();

        let placed = Pose::from_position(Vec3::new(0.0, -1.0, -2.0));
        let id = store.create_locked(
            placed,
            2.0,
            0.5,
            Anchor::Platform(PlatformAnchor::Attached(AnchorHandle(1))),
            &camera,
            &mut scene,
        );
        scene.drain();

        // Tracking lost: last pose retained
        AnchorUpdater::new().update(&camera, &mut store, &anchors, &mut scene);
        assert_eq!(store.get(id).unwrap().pose(), placed);

        let refined = Pose::new(Vec3::new(0.02, -1.0, -2.01), Quat::from_rotation_y(0.1));
        anchors.0.insert(AnchorHandle(1), refined);
        AnchorUpdater::new().update(&camera, &mut store, &anchors, &mut scene);

        assert_eq!(store.get(id).unwrap().pose(), refined);
        assert_eq!(scene.drain(), vec![SceneCommand::UpdateCube { id, pose: refined }]);
    }

    #[test]
    fn test_unavailable_anchor_keeps_pose() {
        let mut camera = Camera::default();
        let mut store = ObjectStore::new();
        let mut scene = CommandQueue::new();

        let placed = Pose::from_position(Vec3::new(0.0, -1.0, -2.0));
        let id = store.create_locked(
            placed,
            2.0,
            0.5,
            Anchor::Platform(PlatformAnchor::Unavailable),
            &camera,
            &mut scene,
        );
        camera.position = Vec3::new(1.0, 0.0, 0.0);

        AnchorUpdater::new().update(&camera, &mut store, &NoAnchors, &mut scene);
        assert_eq!(store.get(id).unwrap().pose(), placed);
    }
}
