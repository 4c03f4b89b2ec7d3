//! Synthetic camera backend for offline testing.
//!
//! Implements the `device` traits against in-memory state. A shared
//! [`SyntheticHub`] exposes counters and injection points so tests can
//! observe opens, session builds, and repeating requests, and feed image
//! buffers into the live producers.

use crate::device::{
    AvailabilityObserver, CameraDevice, CameraProvider, DeviceEvent, PlatformSession,
    RepeatingRequest, StillRequest,
};
use crate::errors::{CameraError, DeviceError, SessionError};
use crate::outputs::{OutputSet, ProducerHandle};
use crate::types::{CameraCapabilities, CameraFormat, CaptureMetadata, ImageBuffer, Orientation,
    OutputKind, Size};
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A capability set resembling a typical phone back camera.
pub fn synthetic_capabilities() -> CameraCapabilities {
    CameraCapabilities {
        formats: vec![
            CameraFormat::new(1920, 1080, 30),
            CameraFormat::new(1920, 1080, 60).with_hdr(true),
            CameraFormat::new(3840, 2160, 30),
        ],
        photo_sizes: vec![Size::new(4000, 3000), Size::new(1920, 1080)],
        video_sizes: vec![Size::new(1920, 1080), Size::new(1280, 720)],
        preview_sizes: vec![Size::new(1280, 720), Size::new(640, 480)],
        supported_outputs: vec![OutputKind::Photo, OutputKind::Video, OutputKind::Preview],
        supports_low_light_boost: false,
    }
}

/// A gradient test image keyed by timestamp.
pub fn synthetic_image(timestamp: i64, width: u32, height: u32) -> ImageBuffer {
    let base = (timestamp % 256) as u8;
    let mut data = vec![0u8; (width * height) as usize];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = base.wrapping_add((i % 256) as u8);
    }
    ImageBuffer::new(timestamp, width, height, Bytes::from(data))
}

struct SessionTaps {
    photo: Option<ProducerHandle>,
    video: Option<ProducerHandle>,
}

/// Shared observation and injection surface for synthetic devices.
#[derive(Default)]
pub struct SyntheticHub {
    opens: AtomicU64,
    sessions_created: AtomicU64,
    stills_submitted: AtomicU64,
    repeating_starts: AtomicU64,
    next_timestamp: AtomicI64,
    last_still_timestamp: AtomicI64,
    auto_deliver_photos: AtomicBool,
    repeating_active: AtomicBool,
    last_repeating: Mutex<Option<RepeatingRequest>>,
    taps: Mutex<Option<SessionTaps>>,
    events: Mutex<Option<mpsc::UnboundedSender<DeviceEvent>>>,
}

impl SyntheticHub {
    /// Devices opened since construction.
    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::SeqCst)
    }

    /// Platform sessions created since construction.
    pub fn sessions_created(&self) -> u64 {
        self.sessions_created.load(Ordering::SeqCst)
    }

    pub fn stills_submitted(&self) -> u64 {
        self.stills_submitted.load(Ordering::SeqCst)
    }

    /// Times `start_repeating` succeeded on any session.
    pub fn repeating_starts(&self) -> u64 {
        self.repeating_starts.load(Ordering::SeqCst)
    }

    pub fn repeating_active(&self) -> bool {
        self.repeating_active.load(Ordering::SeqCst)
    }

    pub fn last_repeating_request(&self) -> Option<RepeatingRequest> {
        self.last_repeating.lock().expect("lock poisoned").clone()
    }

    /// Timestamp handed out by the most recent still submission.
    pub fn last_still_timestamp(&self) -> i64 {
        self.last_still_timestamp.load(Ordering::SeqCst)
    }

    /// When false, still submissions yield metadata but no buffer; tests
    /// deliver (or abort) by hand.
    pub fn set_auto_deliver_photos(&self, enabled: bool) {
        self.auto_deliver_photos.store(enabled, Ordering::SeqCst);
    }

    /// Push a buffer into the current session's video producer.
    /// Returns false when no video output is bound.
    pub fn deliver_video_frame(&self, buffer: ImageBuffer) -> bool {
        let taps = self.taps.lock().expect("lock poisoned");
        match taps.as_ref().and_then(|t| t.video.as_ref()) {
            Some(handle) => {
                handle.push(buffer);
                true
            }
            None => false,
        }
    }

    /// Push a buffer into the current session's photo producer.
    pub fn deliver_photo_buffer(&self, buffer: ImageBuffer) -> bool {
        let taps = self.taps.lock().expect("lock poisoned");
        match taps.as_ref().and_then(|t| t.photo.as_ref()) {
            Some(handle) => {
                handle.push(buffer);
                true
            }
            None => false,
        }
    }

    /// Raise an asynchronous device event on the most recently opened
    /// device's channel. Returns false when nothing is open.
    pub fn emit(&self, event: DeviceEvent) -> bool {
        let events = self.events.lock().expect("lock poisoned");
        match events.as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    fn allocate_timestamp(&self) -> i64 {
        let ts = self.next_timestamp.fetch_add(1, Ordering::SeqCst) + 1;
        self.last_still_timestamp.store(ts, Ordering::SeqCst);
        ts
    }
}

/// In-memory provider with scriptable devices.
pub struct SyntheticProvider {
    devices: Mutex<HashMap<String, CameraCapabilities>>,
    observers: Mutex<HashMap<u64, Arc<dyn AvailabilityObserver>>>,
    next_token: AtomicU64,
    hub: Arc<SyntheticHub>,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticProvider {
    pub fn new() -> Self {
        let hub = Arc::new(SyntheticHub::default());
        hub.auto_deliver_photos.store(true, Ordering::SeqCst);
        Self {
            devices: Mutex::new(HashMap::new()),
            observers: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
            hub,
        }
    }

    pub fn with_device(self, camera_id: &str, capabilities: CameraCapabilities) -> Self {
        self.devices
            .lock()
            .expect("lock poisoned")
            .insert(camera_id.to_string(), capabilities);
        self
    }

    pub fn hub(&self) -> Arc<SyntheticHub> {
        self.hub.clone()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().expect("lock poisoned").len()
    }

    /// Fan an availability notification out to subscribed observers.
    pub fn notify_available(&self, camera_id: &str) {
        for observer in self.observers.lock().expect("lock poisoned").values() {
            observer.on_available(camera_id);
        }
    }

    pub fn notify_unavailable(&self, camera_id: &str) {
        for observer in self.observers.lock().expect("lock poisoned").values() {
            observer.on_unavailable(camera_id);
        }
    }
}

impl CameraProvider for SyntheticProvider {
    fn open(
        &self,
        camera_id: &str,
        events: mpsc::UnboundedSender<DeviceEvent>,
    ) -> Result<Box<dyn CameraDevice>, CameraError> {
        let capabilities = self
            .devices
            .lock()
            .expect("lock poisoned")
            .get(camera_id)
            .cloned()
            .ok_or(DeviceError::NoDevice)?;
        self.hub.opens.fetch_add(1, Ordering::SeqCst);
        *self.hub.events.lock().expect("lock poisoned") = Some(events);
        Ok(Box::new(SyntheticDevice {
            id: camera_id.to_string(),
            capabilities,
            hub: self.hub.clone(),
        }))
    }

    fn subscribe(&self, observer: Arc<dyn AvailabilityObserver>) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        self.observers
            .lock()
            .expect("lock poisoned")
            .insert(token, observer);
        token
    }

    fn unsubscribe(&self, token: u64) {
        self.observers.lock().expect("lock poisoned").remove(&token);
    }
}

struct SyntheticDevice {
    id: String,
    capabilities: CameraCapabilities,
    hub: Arc<SyntheticHub>,
}

impl CameraDevice for SyntheticDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> &CameraCapabilities {
        &self.capabilities
    }

    fn create_session(
        &mut self,
        outputs: &OutputSet,
    ) -> Result<Box<dyn PlatformSession>, CameraError> {
        self.hub.sessions_created.fetch_add(1, Ordering::SeqCst);
        self.hub.repeating_active.store(false, Ordering::SeqCst);
        *self.hub.taps.lock().expect("lock poisoned") = Some(SessionTaps {
            photo: outputs.photo.as_ref().map(|p| p.handle()),
            video: outputs.video.as_ref().map(|p| p.handle()),
        });
        Ok(Box::new(SyntheticSession {
            hub: self.hub.clone(),
            closed: false,
        }))
    }
}

struct SyntheticSession {
    hub: Arc<SyntheticHub>,
    closed: bool,
}

impl PlatformSession for SyntheticSession {
    fn start_repeating(&mut self, request: &RepeatingRequest) -> Result<(), CameraError> {
        if self.closed {
            return Err(SessionError::CameraNotReady.into());
        }
        *self.hub.last_repeating.lock().expect("lock poisoned") = Some(request.clone());
        self.hub.repeating_starts.fetch_add(1, Ordering::SeqCst);
        self.hub.repeating_active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_repeating(&mut self) {
        self.hub.repeating_active.store(false, Ordering::SeqCst);
    }

    fn submit_still(&mut self, request: &StillRequest) -> Result<CaptureMetadata, CameraError> {
        if self.closed {
            return Err(SessionError::CameraNotReady.into());
        }
        self.hub.stills_submitted.fetch_add(1, Ordering::SeqCst);
        let timestamp = self.hub.allocate_timestamp();

        if self.hub.auto_deliver_photos.load(Ordering::SeqCst) {
            let hub = self.hub.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(10));
                hub.deliver_photo_buffer(synthetic_image(timestamp, 4000, 3000));
            });
        }

        Ok(CaptureMetadata {
            request_id: request.id,
            timestamp,
            captured_at: Utc::now(),
            orientation: Orientation::Portrait,
        })
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn close(&mut self) {
        self.closed = true;
        self.hub.repeating_active.store(false, Ordering::SeqCst);
    }
}
