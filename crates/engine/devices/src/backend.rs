//! Hand tracker backend trait for platform-specific implementations
//!
//! The actual landmark model runs outside this crate (a browser library, a
//! native inference runtime, a recorded session). Backends hand the latest
//! result to the frame loop, which polls once per tick.

use std::collections::VecDeque;

use crate::hand::HandLandmarks;

/// Trait for hand tracking backends
///
/// A backend delivers zero or one hand per frame. Implementations must not
/// block: if inference for the current camera frame is still running, return
/// the most recent completed result.
pub trait HandTracker {
    /// Poll for the latest tracking result
    ///
    /// Should be called once per frame. Returns None when no hand is visible.
    fn poll(&mut self) -> Option<HandLandmarks>;

    /// Human-readable backend name for status output
    fn name(&self) -> &str;

    /// Whether the backend can produce results at all
    fn is_available(&self) -> bool {
        true
    }
}

/// A no-op tracker for platforms without hand tracking
///
/// Lets the frame loop run unchanged when the tracking library failed to load.
pub struct NullTracker;

impl NullTracker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HandTracker for NullTracker {
    fn poll(&mut self) -> Option<HandLandmarks> {
        None
    }

    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Plays back a recorded sequence of per-frame tracking results
///
/// Each poll consumes one entry. Once exhausted the tracker reports no hand.
#[derive(Debug, Clone, Default)]
pub struct ReplayTracker {
    frames: VecDeque<Option<HandLandmarks>>,
}

impl ReplayTracker {
    pub fn new(frames: impl IntoIterator<Item = Option<HandLandmarks>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Append a frame to the end of the recording
    pub fn push(&mut self, frame: Option<HandLandmarks>) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl HandTracker for ReplayTracker {
    fn poll(&mut self) -> Option<HandLandmarks> {
        self.frames.pop_front().flatten()
    }

    fn name(&self) -> &str {
        "replay"
    }
}
