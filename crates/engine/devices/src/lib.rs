//! Input device abstractions for the AR cube builder
//!
//! This crate provides platform-agnostic input types that can be compiled
//! both natively and to WebAssembly.
//!
//! # Modules
//!
//! - [`hand`]: 21-point hand landmark frames
//! - [`gesture`]: Pinch / fist classification with pinch edge tracking
//! - [`touch`]: Touch events and tap detection
//! - [`sensors`]: Device orientation sensor driving a rotation-only camera
//! - [`backend`]: Hand tracker backend trait for platform-specific implementations

pub mod backend;
pub mod gesture;
pub mod hand;
pub mod sensors;
pub mod touch;

// Re-export commonly used types at crate root
pub use backend::{HandTracker, NullTracker, ReplayTracker};
pub use gesture::{GestureClassifier, GestureConfig, GestureFrame, PinchPhase};
pub use hand::{HandLandmarks, LANDMARK_COUNT};
pub use sensors::{OrientationReading, OrientationSensor};
pub use touch::{Tap, TapConfig, TapDetector, TouchPhase, TouchPoint};
