//! Cube placement and anchoring for handheld AR
//!
//! Places, moves and deletes cubes in real-world space, driven either by
//! hand gestures over a plain camera stream or by taps on surfaces detected
//! by an immersive session. Rendering, camera access and hand tracking stay
//! outside this crate behind the traits in [`scene`] and [`platform`].
//!
//! # Example
//!
//! ```no_run
//! use placement::{ArSession, CaptureSource, CommandQueue, PlacementConfig, Variant, WebcamFrame};
//! # fn capture() -> Box<dyn placement::CaptureDevice> { unimplemented!() }
//!
//! let mut session = ArSession::new(PlacementConfig::default(), Variant::Webcam, capture(), CommandQueue::new());
//! session.start(CaptureSource::default())?;
//! let _report = session.process_webcam_frame(&WebcamFrame::default())?;
//! for command in session.scene_mut().drain() {
//!     println!("{:?}", command);
//! }
//! # Ok::<(), placement::SessionError>(())
//! ```

pub mod anchor;
pub mod camera;
pub mod config;
pub mod controller;
pub mod depth;
pub mod error;
pub mod geometry;
pub mod platform;
pub mod scene;
pub mod session;
pub mod store;

pub use anchor::AnchorUpdater;
pub use camera::{Camera, CameraConfig, Pose};
pub use config::{DepthConfig, PlacementConfig};
pub use controller::{PlacementContext, PlacementController, PlacementEvent};
pub use depth::{
    DepthMap, DepthProvider, DepthRequest, DepthSample, DepthScale, EstimatedDepth,
    HandDepthHeuristic, HitTestDepth, SurfaceHit,
};
pub use error::{AcquireError, AnchorError, ConfigError, DepthMapError, SessionError};
pub use geometry::{project, screen_ray, snap, CubeBounds, Ray};
pub use platform::{
    AnchorHandle, AnchorPlatform, AnchorRequestId, AnchorResolution, CaptureDevice,
    CaptureSource, Facing, NoAnchors,
};
pub use scene::{CommandQueue, RenderScene, SceneCommand};
pub use session::{ArSession, FrameReport, SessionId, Variant, WebcamFrame, XrFrame};
pub use store::{Anchor, ObjectId, ObjectStore, PlacedObject, PlatformAnchor};
