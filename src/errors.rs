//! Error taxonomy surfaced to the owning layer.
//!
//! Every failure carries a stable `code()` tag so embedders can translate
//! errors into user-facing messages without understanding platform details.

use crate::types::OutputKind;
use thiserror::Error;

/// Failures tied to a physical device or its configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("no camera device matches the requested id")]
    NoDevice,
    #[error("the requested camera id is invalid")]
    Invalid,
    #[error("camera devices are not available on a simulator")]
    NotAvailableOnSimulator,
    #[error("failed to configure the camera device: {0}")]
    ConfigureFailed(String),
    #[error("low-light boost is not supported by this device")]
    LowLightBoostUnsupported,
}

impl DeviceError {
    pub fn code(&self) -> &'static str {
        match self {
            DeviceError::NoDevice => "device/no-device",
            DeviceError::Invalid => "device/invalid",
            DeviceError::NotAvailableOnSimulator => "device/not-available-on-simulator",
            DeviceError::ConfigureFailed(_) => "device/configure-failed",
            DeviceError::LowLightBoostUnsupported => "device/low-light-boost-not-supported",
        }
    }
}

/// Failures in format negotiation or format-dependent parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("fps {0} is outside every supported range of the active format")]
    InvalidFps(u32),
    #[error("HDR was requested but the active format does not support it")]
    InvalidHdr,
    #[error("no supported format matches the requested filter")]
    NoMatchingFormat,
}

impl FormatError {
    pub fn code(&self) -> &'static str {
        match self {
            FormatError::InvalidFps(_) => "format/invalid-fps",
            FormatError::InvalidHdr => "format/invalid-hdr",
            FormatError::NoMatchingFormat => "format/no-matching-format",
        }
    }
}

/// Unsupported inputs or outputs for the bound device.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("the requested input is not supported by this device")]
    UnsupportedInput,
    #[error("the device cannot host a {0} output")]
    UnsupportedOutput(OutputKind),
}

impl ParameterError {
    pub fn code(&self) -> &'static str {
        match self {
            ParameterError::UnsupportedInput => "parameter/unsupported-input",
            ParameterError::UnsupportedOutput(_) => "parameter/unsupported-output",
        }
    }
}

/// Session lifecycle failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("the capture session is not ready")]
    CameraNotReady,
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::CameraNotReady => "session/camera-not-ready",
        }
    }
}

/// Still-capture failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("no photo output is configured")]
    PhotoNotEnabled,
    #[error("the capture was aborted before an image arrived")]
    CaptureAborted,
}

impl CaptureError {
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::PhotoNotEnabled => "capture/photo-not-enabled",
            CaptureError::CaptureAborted => "capture/aborted",
        }
    }
}

/// Top-level error reported through the owning layer's callback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    #[error("{0}")]
    Device(#[from] DeviceError),
    #[error("{0}")]
    Format(#[from] FormatError),
    #[error("{0}")]
    Parameter(#[from] ParameterError),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("{0}")]
    Capture(#[from] CaptureError),
    #[error("unknown camera error: {0}")]
    Unknown(String),
}

impl CameraError {
    /// Stable kind tag for UI-level translation.
    pub fn code(&self) -> &'static str {
        match self {
            CameraError::Device(e) => e.code(),
            CameraError::Format(e) => e.code(),
            CameraError::Parameter(e) => e.code(),
            CameraError::Session(e) => e.code(),
            CameraError::Capture(e) => e.code(),
            CameraError::Unknown(_) => "unknown/unknown",
        }
    }

    /// Wrap an unrecognized platform-level failure with its native message.
    pub fn unknown(cause: impl std::fmt::Display) -> Self {
        CameraError::Unknown(cause.to_string())
    }
}
