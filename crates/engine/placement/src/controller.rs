//! Placement state machine
//!
//! Turns classified gestures (webcam) or taps on detected surfaces (WebXR)
//! into object store mutations. Per target the lifecycle is
//! `Idle -> Placing (unlocked) -> Locked`, with deletion possible from any
//! state.

use devices::{GestureFrame, PinchPhase};
use glam::{Quat, Vec2, Vec3};
use serde::Serialize;

use crate::camera::{Camera, Pose};
use crate::config::PlacementConfig;
use crate::depth::{DepthProvider, HandDepthHeuristic};
use crate::geometry::{project, screen_ray, snap};
use crate::platform::{AnchorPlatform, AnchorRequestId};
use crate::scene::RenderScene;
use crate::store::{Anchor, ObjectId, ObjectStore, PlatformAnchor};

/// Something the controller did this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlacementEvent {
    Created { id: ObjectId, position: Vec3 },
    Selected { id: ObjectId },
    Moved { id: ObjectId, position: Vec3 },
    Locked { id: ObjectId },
    Deleted { id: ObjectId },
    AnchorRequested { id: ObjectId, request: AnchorRequestId },
}

/// Borrowed state the controller operates on for one call
pub struct PlacementContext<'a> {
    pub camera: &'a Camera,
    pub store: &'a mut ObjectStore,
    pub scene: &'a mut dyn RenderScene,
    pub anchors: &'a mut dyn AnchorPlatform,
}

/// Decides between create, move, lock and delete
#[derive(Debug, Clone)]
pub struct PlacementController {
    grid_size: f32,
    grid_snap: bool,
    default_depth: f32,
    hand_depth: HandDepthHeuristic,
    request_anchors: bool,
    highlighted: Option<ObjectId>,
}

impl PlacementController {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            grid_snap: config.grid_snap,
            default_depth: config.default_depth,
            hand_depth: config.depth.hand,
            request_anchors: config.request_anchors,
            highlighted: None,
        }
    }

    pub fn grid_snap(&self) -> bool {
        self.grid_snap
    }

    /// Flip grid snapping, returning the new state
    pub fn toggle_grid_snap(&mut self) -> bool {
        self.grid_snap = !self.grid_snap;
        tracing::info!("Grid snap {}", if self.grid_snap { "on" } else { "off" });
        self.grid_snap
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    fn snapped(&self, position: Vec3) -> Vec3 {
        if self.grid_snap {
            snap(position, self.grid_size)
        } else {
            position
        }
    }

    /// Reticle pose for a pointer in the webcam variant
    ///
    /// Falls back to the default depth when no sample is available.
    pub fn pointer_reticle(&self, camera: &Camera, pointer: Vec2, depth: &dyn DepthProvider) -> Pose {
        let distance = depth
            .sample(pointer)
            .distance_from(camera.position)
            .unwrap_or(self.default_depth);
        Pose::new(
            project(camera, pointer, distance),
            Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        )
    }

    /// React to one classified webcam frame
    pub fn handle_gesture(
        &mut self,
        ctx: &mut PlacementContext<'_>,
        frame: &GestureFrame,
        depth: &dyn DepthProvider,
    ) -> Vec<PlacementEvent> {
        let mut events = Vec::new();

        if frame.fist {
            let ray = screen_ray(ctx.camera, frame.pointer);
            if let Some(id) = ctx.store.pick(&ray) {
                ctx.store.delete(id, ctx.scene, ctx.anchors);
                events.push(PlacementEvent::Deleted { id });
            }
        } else {
            match frame.pinch {
                PinchPhase::Started => self.pinch_started(ctx, frame, depth, &mut events),
                PinchPhase::Held => self.pinch_held(ctx, frame, &mut events),
                PinchPhase::Released | PinchPhase::Idle => self.release_selection(ctx, &mut events),
            }
        }

        self.sync_highlight(ctx);
        events
    }

    fn pinch_started(
        &mut self,
        ctx: &mut PlacementContext<'_>,
        frame: &GestureFrame,
        depth: &dyn DepthProvider,
        events: &mut Vec<PlacementEvent>,
    ) {
        let ray = screen_ray(ctx.camera, frame.pointer);
        if let Some(id) = ctx.store.pick(&ray) {
            ctx.store.unlock(id, ctx.camera);
            events.push(PlacementEvent::Selected { id });
            return;
        }

        let distance = depth
            .sample(frame.pointer)
            .distance_from(ctx.camera.position)
            .unwrap_or_else(|| self.hand_depth.apply(frame.pointer_depth));
        let position = self.snapped(project(ctx.camera, frame.pointer, distance));
        let id = ctx
            .store
            .create_unlocked(position, distance, self.grid_size, ctx.camera, ctx.scene);
        events.push(PlacementEvent::Created { id, position });
    }

    fn pinch_held(
        &mut self,
        ctx: &mut PlacementContext<'_>,
        frame: &GestureFrame,
        events: &mut Vec<PlacementEvent>,
    ) {
        let Some(id) = ctx.store.selected() else {
            return;
        };
        let Some(distance) = ctx.store.get(id).map(|object| object.depth) else {
            return;
        };

        let position = self.snapped(project(ctx.camera, frame.pointer, distance));
        if ctx.store.get(id).is_some_and(|object| object.world_position == position) {
            return;
        }
        if ctx.store.move_to(id, position, ctx.camera, ctx.scene) {
            events.push(PlacementEvent::Moved { id, position });
        }
    }

    /// Snap and lock the selected object, if there is one
    fn release_selection(&mut self, ctx: &mut PlacementContext<'_>, events: &mut Vec<PlacementEvent>) {
        let Some(id) = ctx.store.selected() else {
            return;
        };

        if let Some(current) = ctx.store.get(id).map(|object| object.world_position) {
            let position = self.snapped(current);
            if position != current {
                ctx.store.move_to(id, position, ctx.camera, ctx.scene);
            }
        }
        ctx.store.lock(id, ctx.camera);
        events.push(PlacementEvent::Locked { id });
    }

    /// React to a tap in the WebXR variant
    ///
    /// Without a surface hit placement is disabled and the tap is ignored.
    pub fn handle_tap(&mut self, ctx: &mut PlacementContext<'_>, surface: Option<Pose>) -> Vec<PlacementEvent> {
        let mut events = Vec::new();
        let Some(hit) = surface else {
            tracing::debug!("Tap ignored: no surface under the reticle");
            return events;
        };

        let pose = Pose::new(self.snapped(hit.position), hit.orientation);
        let distance = pose.position.distance(ctx.camera.position);

        let request = if self.request_anchors {
            ctx.anchors.request_anchor(pose)
        } else {
            None
        };
        let anchor = match request {
            Some(request) => Anchor::Platform(PlatformAnchor::Pending(request)),
            None => {
                if self.request_anchors {
                    tracing::warn!("Spatial anchors unavailable, cube keeps its placement pose");
                }
                Anchor::Platform(PlatformAnchor::Unavailable)
            }
        };

        let id = ctx
            .store
            .create_locked(pose, distance, self.grid_size, anchor, ctx.camera, ctx.scene);
        events.push(PlacementEvent::Created {
            id,
            position: pose.position,
        });
        if let Some(request) = request {
            events.push(PlacementEvent::AnchorRequested { id, request });
        }

        self.sync_highlight(ctx);
        events
    }

    /// Delete every object and release every anchor
    pub fn clear_all(&mut self, ctx: &mut PlacementContext<'_>) -> usize {
        let count = ctx.store.clear(ctx.scene, ctx.anchors);
        self.sync_highlight(ctx);
        count
    }

    /// Lock whatever is still selected, e.g. when the hand disappears for good
    pub fn deselect(&mut self, ctx: &mut PlacementContext<'_>) -> Vec<PlacementEvent> {
        let mut events = Vec::new();
        self.release_selection(ctx, &mut events);
        self.sync_highlight(ctx);
        events
    }

    fn sync_highlight(&mut self, ctx: &mut PlacementContext<'_>) {
        let selected = ctx.store.selected();
        if selected != self.highlighted {
            ctx.scene.set_highlight(selected);
            self.highlighted = selected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::DepthSample;
    use crate::platform::{AnchorHandle, NoAnchors};
    use crate::scene::{CommandQueue, SceneCommand};

    struct FixedDepth(DepthSample);

    impl DepthProvider for FixedDepth {
        fn sample(&self, _screen: Vec2) -> DepthSample {
            self.0
        }
    }

    struct CountingAnchors {
        next: u64,
    }

    impl AnchorPlatform for CountingAnchors {
        fn request_anchor(&mut self, _pose: Pose) -> Option<AnchorRequestId> {
            self.next += 1;
            Some(AnchorRequestId(self.next))
        }

        fn anchor_pose(&self, _handle: AnchorHandle) -> Option<Pose> {
            None
        }

        fn release_anchor(&mut self, _handle: AnchorHandle) {}
    }

    fn frame(pinch: PinchPhase, fist: bool, pointer: Vec2) -> GestureFrame {
        GestureFrame {
            pinch,
            fist,
            pointer,
            pointer_depth: 0.0,
        }
    }

    struct Fixture {
        camera: Camera,
        store: ObjectStore,
        scene: CommandQueue,
        anchors: NoAnchors,
        controller: PlacementController,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                camera: Camera::default(),
                store: ObjectStore::new(),
                scene: CommandQueue::new(),
                anchors: NoAnchors,
                controller: PlacementController::new(&PlacementConfig::default()),
            }
        }

        fn gesture(&mut self, frame: GestureFrame, depth: &dyn DepthProvider) -> Vec<PlacementEvent> {
            let mut ctx = PlacementContext {
                camera: &self.camera,
                store: &mut self.store,
                scene: &mut self.scene,
                anchors: &mut self.anchors,
            };
            self.controller.handle_gesture(&mut ctx, &frame, depth)
        }
    }

    const CENTER: Vec2 = Vec2::new(0.5, 0.5);

    #[test]
    fn test_pinch_creates_at_sampled_depth() {
        let mut f = Fixture::new();
        let depth = FixedDepth(DepthSample::Distance(2.0));

        let events = f.gesture(frame(PinchPhase::Started, false, CENTER), &depth);
        let [PlacementEvent::Created { id, position }] = events[..] else {
            panic!("unexpected events {:?}", events);
        };
        assert_eq!(position, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(f.store.selected(), Some(id));
        assert_eq!(f.store.get(id).unwrap().depth, 2.0);
        assert!(f.scene.pending().contains(&SceneCommand::Highlight { id: Some(id) }));
    }

    #[test]
    fn test_pinch_without_depth_uses_hand_heuristic() {
        let mut f = Fixture::new();
        let mut pinch = frame(PinchPhase::Started, false, CENTER);
        pinch.pointer_depth = 0.6;

        f.gesture(pinch, &FixedDepth(DepthSample::Unavailable));
        let object = f.store.iter().next().unwrap();
        assert!((object.depth - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_pinch_on_existing_selects_it() {
        let mut f = Fixture::new();
        let depth = FixedDepth(DepthSample::Distance(2.0));

        f.gesture(frame(PinchPhase::Started, false, CENTER), &depth);
        f.gesture(frame(PinchPhase::Released, false, CENTER), &depth);
        assert_eq!(f.store.unlocked_count(), 0);

        let events = f.gesture(frame(PinchPhase::Started, false, CENTER), &depth);
        assert!(matches!(events[..], [PlacementEvent::Selected { .. }]));
        assert_eq!(f.store.len(), 1);
        assert_eq!(f.store.unlocked_count(), 1);
    }

    #[test]
    fn test_drag_keeps_creation_depth_and_snaps() {
        let mut f = Fixture::new();
        f.gesture(
            frame(PinchPhase::Started, false, CENTER),
            &FixedDepth(DepthSample::Distance(2.0)),
        );
        // Depth changes under the pointer do not affect the drag
        let events = f.gesture(
            frame(PinchPhase::Held, false, Vec2::new(0.3, 0.5)),
            &FixedDepth(DepthSample::Distance(4.0)),
        );
        let [PlacementEvent::Moved { position, .. }] = events[..] else {
            panic!("unexpected events {:?}", events);
        };
        assert_eq!(snap(position, 0.5), position);
        assert!(position.x > 0.0);
        assert!(position.length() < 2.5);
    }

    #[test]
    fn test_release_locks_and_clears_highlight() {
        let mut f = Fixture::new();
        let depth = FixedDepth(DepthSample::Distance(2.0));

        f.gesture(frame(PinchPhase::Started, false, CENTER), &depth);
        f.scene.drain();
        let events = f.gesture(frame(PinchPhase::Released, false, CENTER), &depth);

        assert!(matches!(events[..], [PlacementEvent::Locked { .. }]));
        assert_eq!(f.store.selected(), None);
        assert_eq!(f.scene.drain(), vec![SceneCommand::Highlight { id: None }]);
    }

    #[test]
    fn test_idle_locks_leftover_selection() {
        let mut f = Fixture::new();
        let depth = FixedDepth(DepthSample::Distance(2.0));

        f.gesture(frame(PinchPhase::Started, false, CENTER), &depth);
        // Fist over empty space while pinching, then the pinch edge is lost
        f.gesture(frame(PinchPhase::Held, true, Vec2::new(0.0, 0.0)), &depth);
        assert_eq!(f.store.unlocked_count(), 1);

        f.gesture(frame(PinchPhase::Idle, false, CENTER), &depth);
        assert_eq!(f.store.unlocked_count(), 0);
    }

    #[test]
    fn test_fist_deletes_and_takes_priority() {
        let mut f = Fixture::new();
        let depth = FixedDepth(DepthSample::Distance(2.0));

        f.gesture(frame(PinchPhase::Started, false, CENTER), &depth);
        f.gesture(frame(PinchPhase::Released, false, CENTER), &depth);

        let events = f.gesture(frame(PinchPhase::Started, true, CENTER), &depth);
        assert!(matches!(events[..], [PlacementEvent::Deleted { .. }]));
        assert!(f.store.is_empty());
    }

    #[test]
    fn test_fist_over_nothing_does_nothing() {
        let mut f = Fixture::new();
        let events = f.gesture(
            frame(PinchPhase::Idle, true, CENTER),
            &FixedDepth(DepthSample::Unavailable),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_grid_snap_toggle() {
        let mut f = Fixture::new();
        assert!(f.controller.grid_snap());
        assert!(!f.controller.toggle_grid_snap());

        f.gesture(
            frame(PinchPhase::Started, false, Vec2::new(0.37, 0.41)),
            &FixedDepth(DepthSample::Distance(2.0)),
        );
        let object = f.store.iter().next().unwrap();
        assert_ne!(snap(object.world_position, 0.5), object.world_position);
    }

    #[test]
    fn test_reticle_default_depth() {
        let f = Fixture::new();
        let reticle = f
            .controller
            .pointer_reticle(&f.camera, CENTER, &FixedDepth(DepthSample::Unavailable));
        assert!((reticle.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-4);
    }

    #[test]
    fn test_tap_requires_surface() {
        let mut f = Fixture::new();
        let mut ctx = PlacementContext {
            camera: &f.camera,
            store: &mut f.store,
            scene: &mut f.scene,
            anchors: &mut f.anchors,
        };
        assert!(f.controller.handle_tap(&mut ctx, None).is_empty());
        assert!(f.store.is_empty());
    }

    #[test]
    fn test_tap_creates_locked_with_pending_anchor() {
        let camera = Camera::default();
        let mut store = ObjectStore::new();
        let mut scene = CommandQueue::new();
        let mut anchors = CountingAnchors { next: 0 };
        let mut controller = PlacementController::new(&PlacementConfig::default());

        let mut ctx = PlacementContext {
            camera: &camera,
            store: &mut store,
            scene: &mut scene,
            anchors: &mut anchors,
        };
        let hit = Pose::from_position(Vec3::new(0.1, -1.1, -1.9));
        let events = controller.handle_tap(&mut ctx, Some(hit));

        let [PlacementEvent::Created { id, position }, PlacementEvent::AnchorRequested { request, .. }] =
            events[..]
        else {
            panic!("unexpected events {:?}", events);
        };
        assert_eq!(position, Vec3::new(0.0, -1.0, -2.0));
        let object = store.get(id).unwrap();
        assert!(object.locked);
        assert_eq!(object.anchor, Anchor::Platform(PlatformAnchor::Pending(request)));
    }

    #[test]
    fn test_tap_without_anchor_support() {
        let mut f = Fixture::new();
        let mut ctx = PlacementContext {
            camera: &f.camera,
            store: &mut f.store,
            scene: &mut f.scene,
            anchors: &mut f.anchors,
        };
        let events = f
            .controller
            .handle_tap(&mut ctx, Some(Pose::from_position(Vec3::new(0.0, 0.0, -1.0))));
        assert_eq!(events.len(), 1);

        let object = f.store.iter().next().unwrap();
        assert_eq!(object.anchor, Anchor::Platform(PlatformAnchor::Unavailable));
    }

    #[test]
    fn test_event_wire_format() {
        let event = PlacementEvent::Moved {
            id: ObjectId::new(2),
            position: Vec3::new(0.5, 0.0, -2.0),
        };
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            serde_json::json!({ "event": "moved", "id": 2, "position": [0.5, 0.0, -2.0] })
        );
    }
}
