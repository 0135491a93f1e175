//! Capture and anchor platforms backed by the JavaScript host
//!
//! Both sides are asynchronous in the browser. The host acquires streams and
//! creates anchors on its own schedule; these types only queue requests for it
//! and record what it reports back.

use placement::{AcquireError, AnchorHandle, AnchorPlatform, AnchorRequestId, CaptureDevice, CaptureSource, Pose};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsValue;

/// Capture change the session asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureAction {
    Start(CaptureSource),
    Stop,
}

/// Capture device that hands start/stop to an optional host callback
///
/// The session side only queues actions. [`JsCapture::flush`] then invokes the
/// callback as `handler("start", source)` and `handler("stop")`, so the host
/// may call back into the binding. Returning `false` denies the source;
/// throwing fails it.
#[derive(Debug, Clone, Default)]
pub struct JsCapture {
    handler: Rc<RefCell<Option<js_sys::Function>>>,
    pending: Rc<RefCell<Vec<CaptureAction>>>,
}

impl JsCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_handler(&self, handler: Option<js_sys::Function>) {
        *self.handler.borrow_mut() = handler;
    }

    /// Actions queued since the last flush, oldest first
    pub fn take_actions(&self) -> Vec<CaptureAction> {
        std::mem::take(&mut self.pending.borrow_mut())
    }

    /// Run queued actions through the host callback
    ///
    /// Must be called while no session borrow is held. Stops at the first
    /// start the host refuses; later actions are dropped.
    pub fn flush(&self) -> Result<(), AcquireError> {
        let actions = self.take_actions();
        let Some(handler) = self.handler.borrow().clone() else {
            return Ok(());
        };

        for action in actions {
            match action {
                CaptureAction::Start(source) => {
                    let source_value = serde_wasm_bindgen::to_value(&source)
                        .map_err(|err| AcquireError::Other(err.to_string()))?;
                    match handler.call2(&JsValue::NULL, &JsValue::from_str("start"), &source_value) {
                        Ok(result) if result.as_bool() == Some(false) => {
                            return Err(AcquireError::PermissionDenied)
                        }
                        Ok(_) => {}
                        Err(err) => return Err(AcquireError::Other(describe(&err))),
                    }
                }
                CaptureAction::Stop => {
                    if let Err(err) = handler.call1(&JsValue::NULL, &JsValue::from_str("stop")) {
                        tracing::warn!("Capture stop handler failed: {}", describe(&err));
                    }
                }
            }
        }
        Ok(())
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

impl CaptureDevice for JsCapture {
    fn start(&mut self, source: &CaptureSource) -> Result<(), AcquireError> {
        self.pending.borrow_mut().push(CaptureAction::Start(source.clone()));
        Ok(())
    }

    fn stop(&mut self) {
        self.pending.borrow_mut().push(CaptureAction::Stop);
    }
}

#[derive(Debug)]
struct AnchorQueue {
    supported: bool,
    next_request: u64,
    requests: Vec<(AnchorRequestId, Pose)>,
    tracked: HashMap<AnchorHandle, Pose>,
    released: Vec<AnchorHandle>,
}

impl Default for AnchorQueue {
    fn default() -> Self {
        Self {
            supported: true,
            next_request: 0,
            requests: Vec::new(),
            tracked: HashMap::new(),
            released: Vec::new(),
        }
    }
}

/// Anchor platform whose requests and releases are drained by the host
///
/// Clones share one queue: the session owns one, the binding keeps another.
#[derive(Debug, Clone, Default)]
pub struct JsAnchors {
    queue: Rc<RefCell<AnchorQueue>>,
}

impl JsAnchors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_supported(&self, supported: bool) {
        self.queue.borrow_mut().supported = supported;
    }

    /// Anchor creations the host has not picked up yet
    pub fn take_requests(&self) -> Vec<(AnchorRequestId, Pose)> {
        std::mem::take(&mut self.queue.borrow_mut().requests)
    }

    /// Anchors the host should destroy
    pub fn take_released(&self) -> Vec<AnchorHandle> {
        std::mem::take(&mut self.queue.borrow_mut().released)
    }

    /// Replace the set of tracked anchor poses for this frame
    pub fn set_tracked(&self, poses: impl IntoIterator<Item = (AnchorHandle, Pose)>) {
        let mut queue = self.queue.borrow_mut();
        queue.tracked.clear();
        queue.tracked.extend(poses);
    }
}

impl AnchorPlatform for JsAnchors {
    fn request_anchor(&mut self, pose: Pose) -> Option<AnchorRequestId> {
        let mut queue = self.queue.borrow_mut();
        if !queue.supported {
            return None;
        }
        queue.next_request += 1;
        let request = AnchorRequestId(queue.next_request);
        queue.requests.push((request, pose));
        Some(request)
    }

    fn anchor_pose(&self, handle: AnchorHandle) -> Option<Pose> {
        self.queue.borrow().tracked.get(&handle).copied()
    }

    fn release_anchor(&mut self, handle: AnchorHandle) {
        let mut queue = self.queue.borrow_mut();
        queue.tracked.remove(&handle);
        queue.released.push(handle);
    }
}
