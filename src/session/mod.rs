//! The capture session controller: the state machine reconciling camera
//! selection, output descriptors, format parameters, and the active flag
//! into an ordered open-device → build-outputs → build-session → start/stop
//! pipeline.
//!
//! All control-plane mutation happens under one `tokio::sync::Mutex` that
//! spans the entire controller state; a later call queues behind an
//! in-flight rebuild instead of interleaving with it. Frame delivery runs
//! on the producers' own threads and never takes this lock.

pub mod photo;
pub mod request;

use crate::config::SessionConfig;
use crate::device::{
    AvailabilityObserver, CameraDevice, CameraProvider, DeviceEvent, PlatformSession,
};
use crate::errors::{CameraError, CaptureError, DeviceError, SessionError};
use crate::format::{self, FormatFilter};
use crate::outputs::{
    self, FrameCallback, OutputDescriptors, OutputSet, PhotoOutputDescriptor,
    PreviewOutputDescriptor, VideoOutputDescriptor,
};
use crate::session::photo::PhotoSynchronizer;
use crate::session::request::FormatParameters;
use crate::types::{CameraFormat, CapturedPhoto, FlashMode, QualityPrioritization};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Callbacks emitted to the owning layer.
pub trait SessionCallback: Send + Sync {
    /// First successful session start, fired once per controller lifetime.
    fn on_initialized(&self);
    fn on_error(&self, error: &CameraError);
}

/// Where the controller currently stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    CameraOpen,
    OutputsReady,
    SessionStopped,
    SessionRunning,
    Closed,
}

struct ControllerState {
    camera_id: Option<String>,
    device: Option<Box<dyn CameraDevice>>,
    format_filter: Option<FormatFilter>,
    active_format: Option<CameraFormat>,
    descriptors: OutputDescriptors,
    outputs: Option<OutputSet>,
    session: Option<Box<dyn PlatformSession>>,
    parameters: FormatParameters,
    active: bool,
    running: bool,
    closed: bool,
}

impl ControllerState {
    fn phase(&self) -> SessionPhase {
        if self.closed {
            SessionPhase::Closed
        } else if self.device.is_none() {
            SessionPhase::Idle
        } else if self.outputs.is_none() {
            SessionPhase::CameraOpen
        } else if self.session.is_none() {
            SessionPhase::OutputsReady
        } else if self.running {
            SessionPhase::SessionRunning
        } else {
            SessionPhase::SessionStopped
        }
    }
}

struct LogAvailabilityObserver;

impl AvailabilityObserver for LogAvailabilityObserver {
    fn on_available(&self, camera_id: &str) {
        log::info!("camera {} became available", camera_id);
    }

    fn on_unavailable(&self, camera_id: &str) {
        log::info!("camera {} became unavailable", camera_id);
    }
}

struct SessionInner {
    provider: Arc<dyn CameraProvider>,
    callback: Arc<dyn SessionCallback>,
    config: SessionConfig,
    state: Mutex<ControllerState>,
    photo_sync: Arc<PhotoSynchronizer>,
    initialized: AtomicBool,
    event_tx: mpsc::UnboundedSender<DeviceEvent>,
    availability_token: u64,
    pump: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SessionInner {
    /// Report an error to the owning layer exactly once and pass it back.
    fn report(&self, error: CameraError) -> CameraError {
        log::error!("[{}] {}", error.code(), error);
        self.callback.on_error(&error);
        error
    }

    fn ensure_open(&self, state: &ControllerState) -> Result<(), CameraError> {
        if state.closed {
            return Err(SessionError::CameraNotReady.into());
        }
        Ok(())
    }

    /// Close the live platform session, if any, and cancel pending photo
    /// waits so nobody blocks on a buffer that will never arrive.
    fn teardown_session(&self, state: &mut ControllerState) {
        if let Some(mut session) = state.session.take() {
            session.close();
            log::debug!("closed previous capture session");
        }
        state.running = false;
        self.photo_sync.clear();
    }

    /// Rebuild outputs from the current descriptors. The descriptor set is
    /// probed against the device's capabilities first; a rejected set
    /// leaves the previous outputs and session running. Only then is the
    /// previous output set (and the session bound to it) closed in full,
    /// before any new producer is allocated.
    fn configure_outputs(&self, state: &mut ControllerState) -> Result<(), CameraError> {
        let Some(device) = state.device.as_ref() else {
            return Ok(());
        };
        outputs::builder::probe_outputs(device.capabilities(), &state.descriptors)?;
        self.teardown_session(state);
        if let Some(mut previous) = state.outputs.take() {
            previous.close();
        }

        let sync = self.photo_sync.clone();
        let photo_sink: FrameCallback = Arc::new(move |buffer| {
            let timestamp = buffer.timestamp;
            sync.deliver(timestamp, buffer);
        });

        let Some(device) = state.device.as_ref() else {
            return Ok(());
        };
        let outputs = outputs::builder::build_outputs(
            device.capabilities(),
            &state.descriptors,
            &self.config,
            photo_sink,
        )?;
        state.outputs = Some(outputs);
        Ok(())
    }

    /// Rebuild the platform session against the current outputs and re-apply
    /// the latched active flag.
    fn configure_session(&self, state: &mut ControllerState) -> Result<(), CameraError> {
        self.teardown_session(state);
        if state.device.is_none() || state.outputs.is_none() {
            return Ok(());
        }
        let session = {
            let outputs = state.outputs.as_ref().ok_or(SessionError::CameraNotReady)?;
            let device = state.device.as_mut().ok_or(SessionError::CameraNotReady)?;
            device.create_session(outputs)?
        };
        state.session = Some(session);
        log::info!(
            "capture session ready for camera {}",
            state.camera_id.as_deref().unwrap_or("<unbound>")
        );
        if state.active {
            self.start_running(state)?;
        }
        Ok(())
    }

    fn reconfigure(&self, state: &mut ControllerState) -> Result<(), CameraError> {
        self.configure_outputs(state)?;
        self.configure_session(state)
    }

    /// Build and start the repeating request. A start racing a concurrent
    /// session close is logged and benign.
    fn start_running(&self, state: &mut ControllerState) -> Result<(), CameraError> {
        let capabilities = match state.device.as_ref() {
            Some(device) => device.capabilities().clone(),
            None => return Ok(()),
        };
        let request = {
            let Some(outputs) = state.outputs.as_ref() else {
                return Ok(());
            };
            request::build_repeating_request(
                outputs,
                state.active_format.as_ref(),
                &state.parameters,
                &capabilities,
            )?
        };
        if request.targets.is_empty() {
            log::debug!("no repeating targets configured, nothing to start");
            return Ok(());
        }
        let Some(session) = state.session.as_mut() else {
            return Ok(());
        };
        match session.start_repeating(&request) {
            Ok(()) => {
                state.running = true;
                log::info!("repeating request started for {:?}", request.targets);
                if !self.initialized.swap(true, Ordering::SeqCst) {
                    self.callback.on_initialized();
                }
                Ok(())
            }
            Err(error) if session.is_closed() => {
                log::warn!("repeating request start raced a session close: {}", error);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn stop_running(&self, state: &mut ControllerState) {
        if let Some(session) = state.session.as_mut() {
            session.stop_repeating();
            log::info!("repeating request stopped");
        }
        state.running = false;
    }

    fn close_locked(&self, state: &mut ControllerState) {
        self.stop_running(state);
        self.teardown_session(state);
        if let Some(mut outputs) = state.outputs.take() {
            outputs.close();
        }
        state.device = None;
        state.closed = true;
        self.provider.unsubscribe(self.availability_token);
        if let Some(handle) = self.pump.lock().expect("lock poisoned").take() {
            handle.abort();
        }
        log::info!("camera session closed");
    }

    async fn handle_device_event(self: &Arc<Self>, event: DeviceEvent) {
        let error = match event {
            DeviceEvent::RuntimeError(message) => CameraError::Unknown(message),
            DeviceEvent::Disconnected => CameraError::unknown("camera device disconnected"),
        };
        self.report(error);

        let should_restart = {
            let state = self.state.lock().await;
            state.active && !state.closed
        };
        if should_restart {
            // Best-effort recovery off the notification path.
            let inner = self.clone();
            tokio::spawn(async move {
                inner.restart_with_backoff().await;
            });
        }
    }

    async fn restart_with_backoff(self: &Arc<Self>) {
        for attempt in 1..=self.config.restart_attempts {
            let shift = (attempt - 1).min(16);
            let backoff =
                Duration::from_millis(self.config.restart_backoff_ms.saturating_mul(1 << shift));
            tokio::time::sleep(backoff).await;

            let mut state = self.state.lock().await;
            if state.closed || !state.active {
                return;
            }
            log::info!(
                "session restart attempt {}/{}",
                attempt,
                self.config.restart_attempts
            );
            match self.reconfigure(&mut state) {
                Ok(()) => {
                    log::info!("session restarted after runtime error");
                    return;
                }
                Err(error) => {
                    log::warn!("session restart attempt {} failed: {}", attempt, error);
                }
            }
        }
        self.report(
            DeviceError::ConfigureFailed("automatic session restart attempts exhausted".to_string())
                .into(),
        );
    }
}

/// The capture session controller.
///
/// Must be created inside a tokio runtime: the device-event pump runs as a
/// spawned task.
pub struct CameraSession {
    inner: Arc<SessionInner>,
}

impl CameraSession {
    pub fn new(
        provider: Arc<dyn CameraProvider>,
        callback: Arc<dyn SessionCallback>,
        config: SessionConfig,
    ) -> Self {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let availability_token = provider.subscribe(Arc::new(LogAvailabilityObserver));

        let inner = Arc::new(SessionInner {
            provider,
            callback,
            config,
            state: Mutex::new(ControllerState {
                camera_id: None,
                device: None,
                format_filter: None,
                active_format: None,
                descriptors: OutputDescriptors::default(),
                outputs: None,
                session: None,
                parameters: FormatParameters::default(),
                active: false,
                running: false,
                closed: false,
            }),
            photo_sync: Arc::new(PhotoSynchronizer::new()),
            initialized: AtomicBool::new(false),
            event_tx,
            availability_token,
            pump: std::sync::Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let pump = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                inner.handle_device_event(event).await;
            }
        });
        *inner.pump.lock().expect("lock poisoned") = Some(pump);

        Self { inner }
    }

    /// Bind a camera by id. A no-op when the same id is already bound;
    /// otherwise tears down and rebuilds the whole pipeline.
    pub async fn set_input_device(&self, camera_id: &str) -> Result<(), CameraError> {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        inner.ensure_open(&state)?;

        if state.camera_id.as_deref() == Some(camera_id) && state.device.is_some() {
            log::debug!("camera {} already bound, skipping rebuild", camera_id);
            return Ok(());
        }
        if camera_id.is_empty() {
            return Err(inner.report(DeviceError::Invalid.into()));
        }

        inner.teardown_session(&mut state);
        if let Some(mut outputs) = state.outputs.take() {
            outputs.close();
        }
        state.device = None;
        state.active_format = None;

        log::info!("opening camera {}", camera_id);
        let device = match inner.provider.open(camera_id, inner.event_tx.clone()) {
            Ok(device) => device,
            Err(error) => {
                state.camera_id = None;
                return Err(inner.report(error));
            }
        };
        state.camera_id = Some(camera_id.to_string());
        state.device = Some(device);

        // Re-run negotiation for the new device's supported set.
        if let Some(filter) = state.format_filter.clone() {
            if let Some(device) = state.device.as_ref() {
                match format::select_format(&device.capabilities().formats, &filter) {
                    Ok(selected) => state.active_format = Some(selected),
                    Err(error) => {
                        inner.report(error.into());
                    }
                }
            }
        }

        inner.reconfigure(&mut state).map_err(|e| inner.report(e))
    }

    /// Negotiate an active format for the bound device. A failed
    /// negotiation leaves the previous active format and session untouched.
    pub async fn set_format_filter(&self, filter: FormatFilter) -> Result<(), CameraError> {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        inner.ensure_open(&state)?;

        state.format_filter = Some(filter.clone());
        let Some(device) = state.device.as_ref() else {
            return Ok(());
        };
        match format::select_format(&device.capabilities().formats, &filter) {
            Ok(selected) => {
                if state.active_format.as_ref() == Some(&selected) {
                    log::debug!("active format already satisfies filter, skipping rebuild");
                    return Ok(());
                }
                log::info!("negotiated format {}@{}fps", selected.size(), selected.max_fps());
                state.active_format = Some(selected);
                inner.reconfigure(&mut state).map_err(|e| inner.report(e))
            }
            Err(error) => Err(inner.report(error.into())),
        }
    }

    /// Replace the output descriptor set wholesale and rebuild.
    pub async fn set_outputs(
        &self,
        photo: Option<PhotoOutputDescriptor>,
        video: Option<VideoOutputDescriptor>,
        preview: Option<PreviewOutputDescriptor>,
    ) -> Result<(), CameraError> {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        inner.ensure_open(&state)?;

        state.descriptors = OutputDescriptors {
            photo,
            video,
            preview,
        };
        if state.device.is_none() {
            return Ok(());
        }
        inner.reconfigure(&mut state).map_err(|e| inner.report(e))
    }

    /// Store format-dependent request parameters; validated and applied the
    /// next time the repeating request starts.
    pub async fn configure_format(&self, parameters: FormatParameters) -> Result<(), CameraError> {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        inner.ensure_open(&state)?;
        log::debug!("stored format parameters: {:?}", parameters);
        state.parameters = parameters;
        Ok(())
    }

    /// Set the streaming intent. Latched when no session exists yet.
    pub async fn set_active(&self, active: bool) -> Result<(), CameraError> {
        let inner = &self.inner;
        let mut state = inner.state.lock().await;
        inner.ensure_open(&state)?;

        if state.active == active {
            log::debug!("active flag already {}, no-op", active);
            return Ok(());
        }
        state.active = active;
        if active {
            if state.session.is_some() {
                // Revert the intent on failure so the caller can fix the
                // offending parameters and retry with set_active(true).
                if let Err(error) = inner.start_running(&mut state) {
                    state.active = false;
                    return Err(inner.report(error));
                }
            } else {
                log::debug!("active latched, waiting for session");
            }
        } else {
            inner.stop_running(&mut state);
        }
        Ok(())
    }

    /// Capture a still photo, suspending until the matching image buffer
    /// arrives. Failures go to this caller only, not the error surface.
    pub async fn take_photo(
        &self,
        quality: QualityPrioritization,
        flash: FlashMode,
        red_eye_reduction: bool,
        auto_stabilization: bool,
    ) -> Result<CapturedPhoto, CameraError> {
        let inner = &self.inner;
        let (metadata, pending) = {
            let mut state = inner.state.lock().await;
            if state.closed || state.session.is_none() {
                return Err(SessionError::CameraNotReady.into());
            }
            if !state.outputs.as_ref().is_some_and(OutputSet::has_photo) {
                return Err(CaptureError::PhotoNotEnabled.into());
            }
            let request = request::build_still_request(
                quality,
                flash,
                red_eye_reduction,
                auto_stabilization,
            );
            log::info!("submitting still capture {}", request.id);
            let session = state.session.as_mut().ok_or(SessionError::CameraNotReady)?;
            let metadata = session.submit_still(&request)?;
            // Register under the lock so a teardown can never slip between
            // submission and the wait.
            let pending = inner.photo_sync.register(metadata.timestamp)?;
            (metadata, pending)
        };
        // The control lock is released while awaiting the buffer so teardown
        // (which cancels this wait) can proceed.
        let buffer = pending.resolve().await?;
        log::info!("still capture complete at timestamp {}", metadata.timestamp);
        Ok(CapturedPhoto { buffer, metadata })
    }

    /// Release every native resource and unregister availability
    /// observation. Terminal; later calls are no-ops.
    pub async fn close(&self) -> Result<(), CameraError> {
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Ok(());
        }
        self.inner.close_locked(&mut state);
        Ok(())
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.state.lock().await.phase()
    }

    /// Video buffers lost to overflow since the current outputs were built.
    pub async fn dropped_video_frames(&self) -> u64 {
        let state = self.inner.state.lock().await;
        state
            .outputs
            .as_ref()
            .and_then(|outputs| outputs.video.as_ref())
            .map(|producer| producer.dropped())
            .unwrap_or(0)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.state.try_lock() {
            if !state.closed {
                self.inner.close_locked(&mut state);
            }
        } else if let Some(handle) = self.inner.pump.lock().expect("lock poisoned").take() {
            handle.abort();
        }
    }
}
