//! Core value types shared across the capture pipeline.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pixel dimensions of a surface, buffer, or format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Inclusive frame-rate range supported by a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FpsRange {
    pub min: u32,
    pub max: u32,
}

impl FpsRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, fps: u32) -> bool {
        fps >= self.min && fps <= self.max
    }
}

/// Video stabilization modes a format may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StabilizationMode {
    Off,
    Standard,
    Cinematic,
    CinematicExtended,
}

/// Flash behavior for a still capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlashMode {
    Off,
    On,
    Auto,
}

/// Speed/quality trade-off for a still capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityPrioritization {
    Speed,
    Balanced,
    Quality,
}

/// Sensor orientation reported with capture metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Portrait,
    LandscapeLeft,
    PortraitUpsideDown,
    LandscapeRight,
}

/// The three output streams a session can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    Photo,
    Video,
    Preview,
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputKind::Photo => write!(f, "photo"),
            OutputKind::Video => write!(f, "video"),
            OutputKind::Preview => write!(f, "preview"),
        }
    }
}

/// Opaque handle to a caller-owned preview surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

/// A device-supported capture configuration.
///
/// Selecting one of these as the active format decides which resolutions,
/// frame-rate ranges, and feature hints the repeating request may use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub fps_ranges: Vec<FpsRange>,
    pub supports_hdr: bool,
    pub stabilization_modes: Vec<StabilizationMode>,
}

impl CameraFormat {
    pub fn new(width: u32, height: u32, max_fps: u32) -> Self {
        Self {
            width,
            height,
            fps_ranges: vec![FpsRange::new(1, max_fps)],
            supports_hdr: false,
            stabilization_modes: vec![StabilizationMode::Off],
        }
    }

    pub fn with_fps_ranges(mut self, ranges: Vec<FpsRange>) -> Self {
        self.fps_ranges = ranges;
        self
    }

    pub fn with_hdr(mut self, supported: bool) -> Self {
        self.supports_hdr = supported;
        self
    }

    pub fn with_stabilization_modes(mut self, modes: Vec<StabilizationMode>) -> Self {
        self.stabilization_modes = modes;
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Highest frame rate any of this format's ranges reaches.
    pub fn max_fps(&self) -> u32 {
        self.fps_ranges.iter().map(|r| r.max).max().unwrap_or(0)
    }

    pub fn supports_fps(&self, fps: u32) -> bool {
        self.fps_ranges.iter().any(|r| r.contains(fps))
    }

    pub fn supports_stabilization(&self, mode: StabilizationMode) -> bool {
        self.stabilization_modes.contains(&mode)
    }
}

/// Everything a bound device advertises about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraCapabilities {
    pub formats: Vec<CameraFormat>,
    pub photo_sizes: Vec<Size>,
    pub video_sizes: Vec<Size>,
    pub preview_sizes: Vec<Size>,
    pub supported_outputs: Vec<OutputKind>,
    pub supports_low_light_boost: bool,
}

impl CameraCapabilities {
    pub fn supports_output(&self, kind: OutputKind) -> bool {
        self.supported_outputs.contains(&kind)
    }

    pub fn sizes_for(&self, kind: OutputKind) -> &[Size] {
        match kind {
            OutputKind::Photo => &self.photo_sizes,
            OutputKind::Video => &self.video_sizes,
            OutputKind::Preview => &self.preview_sizes,
        }
    }
}

/// A decoded image handed to delivery callbacks.
///
/// Ownership transfers to the callback; the payload is cheaply cloneable.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    /// Platform timestamp keying this buffer to the request that produced it.
    pub timestamp: i64,
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

impl ImageBuffer {
    pub fn new(timestamp: i64, width: u32, height: u32, data: Bytes) -> Self {
        Self {
            timestamp,
            width,
            height,
            data,
        }
    }
}

/// Metadata yielded by the platform when a still capture completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureMetadata {
    pub request_id: Uuid,
    /// Platform timestamp correlating this capture with its image buffer.
    pub timestamp: i64,
    pub captured_at: DateTime<Utc>,
    pub orientation: Orientation,
}

/// A completed still capture: image buffer plus its metadata.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub buffer: ImageBuffer,
    pub metadata: CaptureMetadata,
}
