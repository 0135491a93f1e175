//! Browser binding for the AR cube builder
//!
//! The page owns the camera, the hand tracker, the depth model, the WebXR
//! session and the renderer. It feeds per-frame input into a
//! [`WebArSession`] and applies the scene commands drained from it.

mod bridge;
mod input;

pub use bridge::{JsAnchors, JsCapture};
pub use input::XrFrameInput;

use devices::{HandLandmarks, OrientationReading};
use placement::{
    AnchorError, AnchorHandle, AnchorRequestId, AnchorResolution, ArSession, CaptureSource,
    CommandQueue, DepthMap, DepthRequest, FrameReport, PlacementConfig, PlacementEvent, SessionError,
    SessionId, Variant, WebcamFrame,
};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

/// Depth requests the host may still answer
const MAX_PENDING_DEPTH: usize = 4;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Frame outcome handed back to the page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameOutput {
    gesture: Option<&'static str>,
    events: Vec<PlacementEvent>,
    /// Ticket to pass to `deliverDepthMap` once the depth model has run
    depth_ticket: Option<u32>,
    anchored_moves: usize,
}

/// Anchor creation the page should perform
#[derive(Debug, Serialize)]
struct AnchorRequestOutput {
    session: u32,
    request: u32,
    position: [f32; 3],
    orientation: [f32; 4],
}

/// Outstanding depth requests keyed by the ticket given to the page
#[derive(Debug, Default)]
struct DepthTickets {
    next: u32,
    pending: BTreeMap<u32, DepthRequest>,
}

impl DepthTickets {
    fn issue(&mut self, request: DepthRequest) -> u32 {
        self.next = self.next.wrapping_add(1);
        self.pending.insert(self.next, request);
        while self.pending.len() > MAX_PENDING_DEPTH {
            self.pending.pop_first();
        }
        self.next
    }

    fn redeem(&mut self, ticket: u32) -> Option<DepthRequest> {
        self.pending.remove(&ticket)
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}

fn parse_variant(variant: &str) -> Result<Variant, JsValue> {
    match variant {
        "webcam" => Ok(Variant::Webcam),
        "xr" => Ok(Variant::Xr),
        other => Err(JsValue::from_str(&format!(
            "unknown variant '{}', expected 'webcam' or 'xr'",
            other
        ))),
    }
}

/// Placement session driven from JavaScript
#[wasm_bindgen]
pub struct WebArSession {
    inner: RefCell<ArSession<CommandQueue>>,
    capture: JsCapture,
    anchors: JsAnchors,
    depth_tickets: RefCell<DepthTickets>,
    orientation: Cell<Option<OrientationReading>>,
}

impl WebArSession {
    fn source_from(&self, source: JsValue) -> Result<CaptureSource, JsValue> {
        if source.is_undefined() || source.is_null() {
            return Ok(match self.inner.borrow().variant() {
                Variant::Webcam => CaptureSource::default(),
                Variant::Xr => CaptureSource::Immersive,
            });
        }
        serde_wasm_bindgen::from_value(source).map_err(JsValue::from)
    }

    /// Hand queued capture changes to the host, rolling back a refused start
    fn flush_capture(&self) -> Result<(), JsValue> {
        let Err(err) = self.capture.flush() else {
            return Ok(());
        };
        tracing::warn!("Capture source refused by the host: {}", err);
        self.inner.borrow_mut().stop();
        self.capture.take_actions();
        Err(js_error(SessionError::from(err)))
    }

    fn output(&self, report: FrameReport) -> Result<JsValue, JsValue> {
        let depth_ticket = report
            .depth_request
            .map(|request| self.depth_tickets.borrow_mut().issue(request));
        let output = FrameOutput {
            gesture: report.gesture.map(|gesture| gesture.label()),
            events: report.events,
            depth_ticket,
            anchored_moves: report.anchored_moves,
        };
        serde_wasm_bindgen::to_value(&output).map_err(JsValue::from)
    }
}

#[wasm_bindgen]
impl WebArSession {
    /// Create a session for `"webcam"` or `"xr"`, optionally with TOML config
    #[wasm_bindgen(constructor)]
    pub fn new(variant: &str, config_toml: Option<String>) -> Result<WebArSession, JsValue> {
        let variant = parse_variant(variant)?;
        let config = match config_toml {
            Some(content) => PlacementConfig::from_toml_str(&content).map_err(js_error)?,
            None => PlacementConfig::default(),
        };

        let capture = JsCapture::new();
        let anchors = JsAnchors::new();
        let session = ArSession::new(config, variant, Box::new(capture.clone()), CommandQueue::new())
            .with_anchor_platform(Box::new(anchors.clone()));

        Ok(Self {
            inner: RefCell::new(session),
            capture,
            anchors,
            depth_tickets: RefCell::new(DepthTickets::default()),
            orientation: Cell::new(None),
        })
    }

    /// Install `handler(action, source)`, called when a capture source starts or stops
    #[wasm_bindgen(js_name = setCaptureHandler)]
    pub fn set_capture_handler(&self, handler: Option<js_sys::Function>) {
        self.capture.set_handler(handler);
    }

    #[wasm_bindgen(js_name = setAnchorsSupported)]
    pub fn set_anchors_supported(&self, supported: bool) {
        self.anchors.set_supported(supported);
    }

    /// Start capture, returning the new session id
    ///
    /// `source` is `"immersive"`, `{ facing: "environment" | "user" }` or
    /// `{ device: id }`; omit it for the variant's default.
    pub fn start(&self, source: JsValue) -> Result<u32, JsValue> {
        let source = self.source_from(source)?;
        self.depth_tickets.borrow_mut().clear();
        let id = self.inner.borrow_mut().start(source).map_err(js_error)?;
        self.flush_capture()?;
        Ok(id.raw() as u32)
    }

    pub fn stop(&self) {
        self.depth_tickets.borrow_mut().clear();
        self.inner.borrow_mut().stop();
        if let Err(err) = self.capture.flush() {
            tracing::warn!("Capture handler failed on stop: {}", err);
        }
    }

    #[wasm_bindgen(js_name = switchSource)]
    pub fn switch_source(&self, source: JsValue) -> Result<u32, JsValue> {
        let source = self.source_from(source)?;
        self.depth_tickets.borrow_mut().clear();
        let id = self.inner.borrow_mut().switch_source(source).map_err(js_error)?;
        self.flush_capture()?;
        Ok(id.raw() as u32)
    }

    /// Record a `deviceorientation` reading for the next webcam frame
    #[wasm_bindgen(js_name = setOrientation)]
    pub fn set_orientation(&self, alpha: f32, beta: f32, gamma: f32) {
        self.orientation.set(Some(OrientationReading::new(alpha, beta, gamma)));
    }

    #[wasm_bindgen(js_name = setOrientationPermission)]
    pub fn set_orientation_permission(&self, granted: bool) {
        self.inner.borrow_mut().set_orientation_permission(granted);
    }

    pub fn recenter(&self) {
        self.inner.borrow_mut().recenter();
    }

    /// Process one webcam frame
    ///
    /// `landmarks` is the tracked hand as 21 `[x, y, z]` triples, or
    /// undefined when no hand is visible.
    #[wasm_bindgen(js_name = webcamFrame)]
    pub fn webcam_frame(&self, timestamp_ms: f64, landmarks: Option<Vec<f32>>) -> Result<JsValue, JsValue> {
        let hand = match landmarks {
            Some(values) => Some(HandLandmarks::from_flat(&values).ok_or_else(|| {
                JsValue::from_str(&format!("expected 63 landmark values, got {}", values.len()))
            })?),
            None => None,
        };

        let frame = WebcamFrame {
            timestamp: input::millis(timestamp_ms),
            hand,
            orientation: self.orientation.take(),
        };
        let report = self.inner.borrow_mut().process_webcam_frame(&frame).map_err(js_error)?;
        self.output(report)
    }

    /// Process one immersive frame, see [`XrFrameInput`] for the shape
    #[wasm_bindgen(js_name = xrFrame)]
    pub fn xr_frame(&self, input: JsValue) -> Result<JsValue, JsValue> {
        let input: XrFrameInput = serde_wasm_bindgen::from_value(input)?;
        self.anchors.set_tracked(input.anchor_poses());
        let report = self
            .inner
            .borrow_mut()
            .process_xr_frame(&input.to_frame())
            .map_err(js_error)?;
        self.output(report)
    }

    /// Answer a depth ticket with a row-major map of raw model output
    ///
    /// Returns false when the ticket is unknown or the map was stale.
    #[wasm_bindgen(js_name = deliverDepthMap)]
    pub fn deliver_depth_map(&self, ticket: u32, width: u32, height: u32, values: Vec<f32>) -> Result<bool, JsValue> {
        let Some(request) = self.depth_tickets.borrow_mut().redeem(ticket) else {
            tracing::debug!("Unknown depth ticket {}", ticket);
            return Ok(false);
        };
        let map = DepthMap::new(width as usize, height as usize, values).map_err(js_error)?;
        Ok(self.inner.borrow_mut().deliver_depth_map(request, map))
    }

    /// Anchor creations to perform, as `[{ session, request, position, orientation }]`
    #[wasm_bindgen(js_name = takeAnchorRequests)]
    pub fn take_anchor_requests(&self) -> Result<JsValue, JsValue> {
        let session = self.inner.borrow().id().raw() as u32;
        let requests: Vec<AnchorRequestOutput> = self
            .anchors
            .take_requests()
            .into_iter()
            .map(|(request, pose)| AnchorRequestOutput {
                session,
                request: request.0 as u32,
                position: pose.position.to_array(),
                orientation: pose.orientation.to_array(),
            })
            .collect();
        serde_wasm_bindgen::to_value(&requests).map_err(JsValue::from)
    }

    /// Report the outcome of an anchor request
    ///
    /// Pass the created anchor's `handle`, or an `error` message on failure.
    /// Returns the id of the cube that now owns the anchor.
    #[wasm_bindgen(js_name = resolveAnchor)]
    pub fn resolve_anchor(&self, session: u32, request: u32, handle: Option<u32>, error: Option<String>) -> Option<u32> {
        let result = match (handle, error) {
            (Some(handle), None) => Ok(AnchorHandle(handle.into())),
            (_, Some(message)) => Err(AnchorError::Rejected(message)),
            (None, None) => Err(AnchorError::Unsupported),
        };
        let resolution = AnchorResolution {
            session: SessionId::new(session.into()),
            request: AnchorRequestId(request.into()),
            result,
        };
        self.inner
            .borrow_mut()
            .resolve_anchor(resolution)
            .map(|id| id.raw() as u32)
    }

    /// Anchor handles the page should delete
    #[wasm_bindgen(js_name = takeReleasedAnchors)]
    pub fn take_released_anchors(&self) -> Vec<u32> {
        self.anchors
            .take_released()
            .into_iter()
            .map(|handle| handle.0 as u32)
            .collect()
    }

    /// Scene commands since the last drain, as tagged objects
    #[wasm_bindgen(js_name = drainCommands)]
    pub fn drain_commands(&self) -> Result<JsValue, JsValue> {
        let commands = self.inner.borrow_mut().scene_mut().drain();
        serde_wasm_bindgen::to_value(&commands).map_err(JsValue::from)
    }

    #[wasm_bindgen(js_name = toggleGridSnap)]
    pub fn toggle_grid_snap(&self) -> bool {
        self.inner.borrow_mut().toggle_grid_snap()
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&self) -> u32 {
        self.inner.borrow_mut().clear_all() as u32
    }

    #[wasm_bindgen(getter, js_name = objectCount)]
    pub fn object_count(&self) -> u32 {
        self.inner.borrow().store().len() as u32
    }

    #[wasm_bindgen(getter, js_name = sessionId)]
    pub fn session_id(&self) -> u32 {
        self.inner.borrow().id().raw() as u32
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.borrow().is_running()
    }
}
