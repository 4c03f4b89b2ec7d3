//! Serialization tests for the public value types.
//!
//! The format filter, capabilities, and capture metadata cross the bridge
//! to the owning layer as JSON; the wire names are part of the contract.

use camsession::types::{
    CameraCapabilities, CameraFormat, CaptureMetadata, FpsRange, Orientation, OutputKind,
    QualityPrioritization, Size, StabilizationMode,
};
use camsession::FormatFilter;
use chrono::Utc;
use uuid::Uuid;

#[cfg(test)]
mod serialization_tests {
    use super::*;

    #[test]
    fn test_format_filter_round_trip() {
        let filter = FormatFilter {
            target_size: Some(Size::new(3840, 2160)),
            min_fps: Some(30),
            max_fps: Some(60),
            hdr: Some(true),
            stabilization: Some(StabilizationMode::Cinematic),
        };
        let json = serde_json::to_string(&filter).unwrap();
        let decoded: FormatFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, filter);
    }

    #[test]
    fn test_enums_use_kebab_case_wire_names() {
        assert_eq!(
            serde_json::to_string(&StabilizationMode::CinematicExtended).unwrap(),
            "\"cinematic-extended\""
        );
        assert_eq!(
            serde_json::to_string(&QualityPrioritization::Balanced).unwrap(),
            "\"balanced\""
        );
        assert_eq!(serde_json::to_string(&OutputKind::Preview).unwrap(), "\"preview\"");
        assert_eq!(
            serde_json::to_string(&Orientation::Portrait).unwrap(),
            "\"portrait\""
        );
    }

    #[test]
    fn test_camera_format_round_trip() {
        let format = CameraFormat::new(1920, 1080, 60)
            .with_hdr(true)
            .with_fps_ranges(vec![FpsRange::new(1, 30), FpsRange::new(30, 60)])
            .with_stabilization_modes(vec![
                StabilizationMode::Off,
                StabilizationMode::Standard,
            ]);
        let json = serde_json::to_string(&format).unwrap();
        let decoded: CameraFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, format);
        assert!(decoded.supports_fps(45));
    }

    #[test]
    fn test_capabilities_round_trip() {
        let capabilities = CameraCapabilities {
            formats: vec![CameraFormat::new(1920, 1080, 30)],
            photo_sizes: vec![Size::new(4000, 3000)],
            video_sizes: vec![Size::new(1920, 1080)],
            preview_sizes: vec![Size::new(1280, 720)],
            supported_outputs: vec![OutputKind::Photo, OutputKind::Preview],
            supports_low_light_boost: true,
        };
        let json = serde_json::to_string(&capabilities).unwrap();
        let decoded: CameraCapabilities = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, capabilities);
        assert!(decoded.supports_output(OutputKind::Photo));
        assert!(!decoded.supports_output(OutputKind::Video));
    }

    #[test]
    fn test_capture_metadata_serializes_its_identifiers() {
        let metadata = CaptureMetadata {
            request_id: Uuid::new_v4(),
            timestamp: 12345,
            captured_at: Utc::now(),
            orientation: Orientation::LandscapeLeft,
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains(&metadata.request_id.to_string()));
        assert!(json.contains("12345"));

        let decoded: CaptureMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.request_id, metadata.request_id);
        assert_eq!(decoded.timestamp, metadata.timestamp);
        assert_eq!(decoded.orientation, metadata.orientation);
    }
}
