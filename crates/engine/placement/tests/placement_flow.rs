//! Webcam placement flow: pinch to create and move, release to lock, fist to delete

mod common;

use common::{ahead, fist, open_hand, pinching_hand, webcam_session};
use devices::PinchPhase;
use glam::{Vec2, Vec3};
use placement::{
    snap, CaptureSource, DepthMap, PlacementEvent, SceneCommand, WebcamFrame,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const CENTER: Vec2 = Vec2::new(0.5, 0.5);

fn frame(ms: u64, hand: Option<devices::HandLandmarks>) -> WebcamFrame {
    WebcamFrame {
        timestamp: Duration::from_millis(ms),
        hand,
        orientation: None,
    }
}

/// Raw model output that maps to `distance` with the default depth scale
fn raw_for(distance: f32) -> f32 {
    (distance - 0.5) / 4.5
}

#[test]
fn test_create_lock_delete_at_center() {
    let mut session = webcam_session();
    session.start(CaptureSource::default()).unwrap();

    // Warm-up frame issues the first depth request
    let report = session.process_webcam_frame(&frame(0, None)).unwrap();
    let request = report.depth_request.expect("first frame requests depth");
    assert!(session.deliver_depth_map(request, DepthMap::uniform(8, 8, raw_for(2.0)).unwrap()));

    // Pinch start creates one object at the projected point
    let report = session
        .process_webcam_frame(&frame(16, Some(pinching_hand(CENTER))))
        .unwrap();
    assert_eq!(report.gesture.unwrap().pinch, PinchPhase::Started);
    let [PlacementEvent::Created { id, position }] = report.events[..] else {
        panic!("expected a single create, got {:?}", report.events);
    };
    assert!((position - ahead(2.0)).length() < 1e-4);
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.store().selected(), Some(id));

    let commands = session.scene_mut().drain();
    assert!(commands.iter().any(|c| matches!(c, SceneCommand::AddCube { id: added, .. } if *added == id)));
    assert!(commands.contains(&SceneCommand::Highlight { id: Some(id) }));

    // Release locks it
    let report = session
        .process_webcam_frame(&frame(33, Some(open_hand(CENTER))))
        .unwrap();
    assert_eq!(report.events, vec![PlacementEvent::Locked { id }]);
    let object = session.store().get(id).unwrap();
    assert!(object.locked);
    assert_eq!(snap(object.world_position, 0.5), object.world_position);

    // Fist over the same point deletes it
    let report = session
        .process_webcam_frame(&frame(50, Some(fist(CENTER))))
        .unwrap();
    assert_eq!(report.events, vec![PlacementEvent::Deleted { id }]);
    assert!(session.store().is_empty());
    assert!(session
        .scene_mut()
        .drain()
        .contains(&SceneCommand::RemoveCube { id }));
}

#[test]
fn test_drag_follows_pointer_at_creation_depth() {
    let mut session = webcam_session();
    session.start(CaptureSource::default()).unwrap();

    session
        .process_webcam_frame(&frame(0, Some(pinching_hand(CENTER))))
        .unwrap();
    let id = session.store().selected().unwrap();
    let depth = session.store().get(id).unwrap().depth;

    // Move the hand to the left of the image: mirrored, so +X in the world
    let mut ms = 16;
    for x in [0.45, 0.4, 0.35, 0.3] {
        session
            .process_webcam_frame(&frame(ms, Some(pinching_hand(Vec2::new(x, 0.5)))))
            .unwrap();
        ms += 16;
        assert_eq!(session.store().unlocked_count(), 1);
    }

    let object = session.store().get(id).unwrap();
    assert!(object.world_position.x > 0.0);
    assert_eq!(object.depth, depth);

    session
        .process_webcam_frame(&frame(ms, Some(open_hand(Vec2::new(0.3, 0.5)))))
        .unwrap();
    assert_eq!(session.store().unlocked_count(), 0);
}

#[test]
fn test_pinch_existing_object_selects_without_creating() {
    let mut session = webcam_session();
    session.start(CaptureSource::default()).unwrap();

    session
        .process_webcam_frame(&frame(0, Some(pinching_hand(CENTER))))
        .unwrap();
    session.process_webcam_frame(&frame(16, Some(open_hand(CENTER)))).unwrap();

    let report = session
        .process_webcam_frame(&frame(33, Some(pinching_hand(CENTER))))
        .unwrap();
    assert!(matches!(report.events[..], [PlacementEvent::Selected { .. }]));
    assert_eq!(session.store().len(), 1);
}

#[test]
fn test_hand_loss_keeps_pinch_state() {
    let mut session = webcam_session();
    session.start(CaptureSource::default()).unwrap();

    session
        .process_webcam_frame(&frame(0, Some(pinching_hand(CENTER))))
        .unwrap();
    // No hand: nothing happens downstream
    let report = session.process_webcam_frame(&frame(16, None)).unwrap();
    assert!(report.gesture.is_none());
    assert!(report.events.is_empty());
    assert_eq!(session.store().unlocked_count(), 1);

    // Hand comes back still pinching: a drag, not a second creation
    let report = session
        .process_webcam_frame(&frame(33, Some(pinching_hand(Vec2::new(0.3, 0.5)))))
        .unwrap();
    assert_eq!(report.gesture.unwrap().pinch, PinchPhase::Held);
    assert_eq!(session.store().len(), 1);
}

#[test]
fn test_at_most_one_unlocked_object() {
    let mut session = webcam_session();
    session.start(CaptureSource::default()).unwrap();

    let mut rng = StdRng::seed_from_u64(0x2545_f491);

    for i in 0..400u64 {
        let pointer = Vec2::new(rng.random_range(0.0..1.0), rng.random_range(0.0..1.0));
        let hand = match rng.random_range(0..4) {
            0 => None,
            1 => Some(open_hand(pointer)),
            2 => Some(pinching_hand(pointer)),
            _ => Some(fist(pointer)),
        };
        session.process_webcam_frame(&frame(i * 16, hand)).unwrap();
        assert!(
            session.store().unlocked_count() <= 1,
            "frame {}: {} unlocked objects",
            i,
            session.store().unlocked_count()
        );
    }
}

#[test]
fn test_toggle_grid_snap_and_clear_all() {
    let mut session = webcam_session();
    session.start(CaptureSource::default()).unwrap();
    assert!(session.grid_snap());
    assert!(!session.toggle_grid_snap());

    session
        .process_webcam_frame(&frame(0, Some(pinching_hand(Vec2::new(0.42, 0.57)))))
        .unwrap();
    session
        .process_webcam_frame(&frame(16, Some(open_hand(Vec2::new(0.42, 0.57)))))
        .unwrap();
    session
        .process_webcam_frame(&frame(33, Some(pinching_hand(Vec2::new(0.9, 0.1)))))
        .unwrap();
    assert_eq!(session.store().len(), 2);

    session.scene_mut().drain();
    assert_eq!(session.clear_all(), 2);
    assert!(session.store().is_empty());

    let removed = session
        .scene_mut()
        .drain()
        .into_iter()
        .filter(|c| matches!(c, SceneCommand::RemoveCube { .. }))
        .count();
    assert_eq!(removed, 2);
}

#[test]
fn test_reticle_tracks_pointer() {
    let mut session = webcam_session();
    session.start(CaptureSource::default()).unwrap();

    session.process_webcam_frame(&frame(0, Some(open_hand(CENTER)))).unwrap();
    let reticle = session.reticle().unwrap();
    // No depth map yet: default distance
    assert!((reticle.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-4);
}
