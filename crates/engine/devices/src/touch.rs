//! Touch input and tap detection
//!
//! Immersive sessions report controller "select" events directly. On
//! handheld devices without them, a short near-stationary touch is treated as
//! the same tap.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Touch event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    /// A finger touched the screen
    Started,
    /// A finger moved on the screen
    Moved,
    /// A finger was lifted from the screen
    Ended,
    /// The touch was cancelled (e.g., by a system gesture)
    Cancelled,
}

/// A single touch event in normalized screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Identifier for multi-touch tracking
    pub id: u64,
    /// Position in normalized screen space ([0, 1] on both axes)
    pub position: Vec2,
    pub phase: TouchPhase,
    /// Time of the event since session start
    pub timestamp: Duration,
}

impl TouchPoint {
    pub fn new(id: u64, position: Vec2, phase: TouchPhase, timestamp: Duration) -> Self {
        Self {
            id,
            position,
            phase,
            timestamp,
        }
    }
}

/// A completed tap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tap {
    pub position: Vec2,
    pub timestamp: Duration,
}

/// Limits that separate a tap from a drag or a long press
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Maximum travel in normalized screen units
    pub max_travel: f32,
    /// Maximum press duration in milliseconds
    pub max_duration_ms: u64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            max_travel: 0.03,
            max_duration_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveTouch {
    id: u64,
    start: Vec2,
    started_at: Duration,
    travel: f32,
}

/// Turns raw touch events into taps
#[derive(Debug, Clone, Default)]
pub struct TapDetector {
    config: TapConfig,
    active: Vec<ActiveTouch>,
}

impl TapDetector {
    pub fn new(config: TapConfig) -> Self {
        Self {
            config,
            active: Vec::new(),
        }
    }

    /// Feed one touch event, returning a tap when a touch ends as one
    pub fn update(&mut self, touch: TouchPoint) -> Option<Tap> {
        match touch.phase {
            TouchPhase::Started => {
                self.active.retain(|t| t.id != touch.id);
                self.active.push(ActiveTouch {
                    id: touch.id,
                    start: touch.position,
                    started_at: touch.timestamp,
                    travel: 0.0,
                });
                None
            }
            TouchPhase::Moved => {
                if let Some(active) = self.active.iter_mut().find(|t| t.id == touch.id) {
                    active.travel = active.travel.max(touch.position.distance(active.start));
                }
                None
            }
            TouchPhase::Ended => {
                let index = self.active.iter().position(|t| t.id == touch.id)?;
                let active = self.active.remove(index);
                let travel = active.travel.max(touch.position.distance(active.start));
                let duration = touch.timestamp.saturating_sub(active.started_at);

                if travel <= self.config.max_travel
                    && duration <= Duration::from_millis(self.config.max_duration_ms)
                {
                    Some(Tap {
                        position: active.start,
                        timestamp: touch.timestamp,
                    })
                } else {
                    None
                }
            }
            TouchPhase::Cancelled => {
                self.active.retain(|t| t.id != touch.id);
                None
            }
        }
    }

    /// Feed a batch of events, returning every tap they complete
    pub fn update_all(&mut self, touches: &[TouchPoint]) -> Vec<Tap> {
        touches.iter().filter_map(|t| self.update(*t)).collect()
    }

    /// Number of touches currently down
    pub fn touch_count(&self) -> usize {
        self.active.len()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}
