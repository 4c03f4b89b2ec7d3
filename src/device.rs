//! Platform seam: trait interfaces the capture controller drives.
//!
//! Real backends (V4L2, AVFoundation, Camera2, ...) implement these; the
//! crate's `testing` module ships a synthetic implementation for offline
//! tests. All trait calls happen on the controller's serialized control
//! path, so implementations do not need internal locking for them.

use crate::errors::CameraError;
use crate::outputs::OutputSet;
use crate::types::{CameraCapabilities, CaptureMetadata, FlashMode, OutputKind,
    QualityPrioritization, StabilizationMode};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Asynchronous notifications a bound device can raise after opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Platform-level runtime failure with its native message.
    RuntimeError(String),
    /// The device was disconnected out from under the session.
    Disconnected,
}

/// Informational camera-availability notifications. Explicit subscription,
/// never inheritance.
pub trait AvailabilityObserver: Send + Sync {
    fn on_available(&self, camera_id: &str);
    fn on_unavailable(&self, camera_id: &str);
}

/// Entry point to a platform's camera stack.
pub trait CameraProvider: Send + Sync {
    /// Open a device by id. Runtime events for the opened device are sent
    /// on `events` until the device is dropped.
    fn open(
        &self,
        camera_id: &str,
        events: mpsc::UnboundedSender<DeviceEvent>,
    ) -> Result<Box<dyn CameraDevice>, CameraError>;

    /// Register an availability observer; returns an unsubscribe token.
    fn subscribe(&self, observer: std::sync::Arc<dyn AvailabilityObserver>) -> u64;

    fn unsubscribe(&self, token: u64);
}

/// An open camera device handle.
pub trait CameraDevice: Send {
    fn id(&self) -> &str;

    fn capabilities(&self) -> &CameraCapabilities;

    /// Bind a capture session to the given outputs. The controller
    /// guarantees the outputs outlive the session.
    fn create_session(&mut self, outputs: &OutputSet) -> Result<Box<dyn PlatformSession>, CameraError>;
}

/// The repeating capture instruction keeping video/preview surfaces fed.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatingRequest {
    pub targets: Vec<OutputKind>,
    pub fps: Option<u32>,
    pub stabilization: Option<StabilizationMode>,
    pub hdr: bool,
    pub low_light_boost: bool,
}

/// A one-shot still-capture instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct StillRequest {
    pub id: Uuid,
    pub quality: QualityPrioritization,
    pub flash: FlashMode,
    pub red_eye_reduction: bool,
    pub auto_stabilization: bool,
}

/// A live platform capture session.
pub trait PlatformSession: Send {
    fn start_repeating(&mut self, request: &RepeatingRequest) -> Result<(), CameraError>;

    fn stop_repeating(&mut self);

    /// Submit a one-shot capture; completion yields metadata whose
    /// timestamp keys the eventual image buffer.
    fn submit_still(&mut self, request: &StillRequest) -> Result<CaptureMetadata, CameraError>;

    /// True once the session has been closed, including close races the
    /// controller treats as benign.
    fn is_closed(&self) -> bool;

    fn close(&mut self);
}
