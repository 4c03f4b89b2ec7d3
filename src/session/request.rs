//! Capture-request construction and parameter validation.

use crate::device::{RepeatingRequest, StillRequest};
use crate::errors::{CameraError, DeviceError, FormatError};
use crate::outputs::OutputSet;
use crate::types::{
    CameraCapabilities, CameraFormat, FlashMode, QualityPrioritization, StabilizationMode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Format-dependent request parameters. Stored by `configure_format` and
/// validated the next time the repeating request starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatParameters {
    pub fps: Option<u32>,
    pub stabilization: Option<StabilizationMode>,
    pub hdr: bool,
    pub low_light_boost: bool,
}

/// Build the repeating request targeting video + preview, never photo.
///
/// Validation order: fps against the active format's ranges, HDR against
/// the format, low-light boost against the device. An unsupported
/// stabilization mode is skipped with a warning rather than failing the
/// start, matching how platforms treat it as a hint.
pub(crate) fn build_repeating_request(
    outputs: &OutputSet,
    active_format: Option<&CameraFormat>,
    parameters: &FormatParameters,
    capabilities: &CameraCapabilities,
) -> Result<RepeatingRequest, CameraError> {
    if let (Some(fps), Some(format)) = (parameters.fps, active_format) {
        if !format.supports_fps(fps) {
            return Err(FormatError::InvalidFps(fps).into());
        }
    }
    if parameters.hdr && !active_format.is_some_and(|f| f.supports_hdr) {
        return Err(FormatError::InvalidHdr.into());
    }
    if parameters.low_light_boost && !capabilities.supports_low_light_boost {
        return Err(DeviceError::LowLightBoostUnsupported.into());
    }

    let stabilization = parameters.stabilization.filter(|mode| {
        let supported = active_format.is_some_and(|f| f.supports_stabilization(*mode));
        if !supported {
            log::warn!("stabilization mode {:?} not supported by active format, skipping", mode);
        }
        supported
    });

    Ok(RepeatingRequest {
        targets: outputs.repeating_targets(),
        fps: parameters.fps,
        stabilization,
        hdr: parameters.hdr,
        low_light_boost: parameters.low_light_boost,
    })
}

pub(crate) fn build_still_request(
    quality: QualityPrioritization,
    flash: FlashMode,
    red_eye_reduction: bool,
    auto_stabilization: bool,
) -> StillRequest {
    StillRequest {
        id: Uuid::new_v4(),
        quality,
        flash,
        red_eye_reduction,
        auto_stabilization,
    }
}
