#[cfg(test)]
mod error_tests {
    use camsession::errors::{
        CameraError, CaptureError, DeviceError, FormatError, ParameterError, SessionError,
    };
    use camsession::types::OutputKind;
    use std::error::Error;

    #[test]
    fn test_device_error_codes_are_stable() {
        assert_eq!(DeviceError::NoDevice.code(), "device/no-device");
        assert_eq!(DeviceError::Invalid.code(), "device/invalid");
        assert_eq!(
            DeviceError::NotAvailableOnSimulator.code(),
            "device/not-available-on-simulator"
        );
        assert_eq!(
            DeviceError::ConfigureFailed("x".to_string()).code(),
            "device/configure-failed"
        );
        assert_eq!(
            DeviceError::LowLightBoostUnsupported.code(),
            "device/low-light-boost-not-supported"
        );
    }

    #[test]
    fn test_format_error_codes_are_stable() {
        assert_eq!(FormatError::InvalidFps(120).code(), "format/invalid-fps");
        assert_eq!(FormatError::InvalidHdr.code(), "format/invalid-hdr");
        assert_eq!(
            FormatError::NoMatchingFormat.code(),
            "format/no-matching-format"
        );
    }

    #[test]
    fn test_remaining_codes_are_stable() {
        assert_eq!(
            ParameterError::UnsupportedOutput(OutputKind::Photo).code(),
            "parameter/unsupported-output"
        );
        assert_eq!(
            ParameterError::UnsupportedInput.code(),
            "parameter/unsupported-input"
        );
        assert_eq!(SessionError::CameraNotReady.code(), "session/camera-not-ready");
        assert_eq!(CaptureError::PhotoNotEnabled.code(), "capture/photo-not-enabled");
        assert_eq!(CaptureError::CaptureAborted.code(), "capture/aborted");
        assert_eq!(
            CameraError::Unknown("boom".to_string()).code(),
            "unknown/unknown"
        );
    }

    #[test]
    fn test_wrapping_preserves_the_inner_code() {
        let wrapped: CameraError = DeviceError::NoDevice.into();
        assert_eq!(wrapped.code(), DeviceError::NoDevice.code());

        let wrapped: CameraError = FormatError::InvalidFps(90).into();
        assert_eq!(wrapped.code(), "format/invalid-fps");

        let wrapped: CameraError = CaptureError::CaptureAborted.into();
        assert_eq!(wrapped.code(), "capture/aborted");
    }

    #[test]
    fn test_display_carries_the_failure_detail() {
        let error = DeviceError::ConfigureFailed("pipeline rejected".to_string());
        assert!(error.to_string().contains("pipeline rejected"));

        let error = FormatError::InvalidFps(75);
        assert!(error.to_string().contains("75"));

        let error = ParameterError::UnsupportedOutput(OutputKind::Video);
        assert!(error.to_string().contains("video"));

        let error = CameraError::unknown("AVFoundation code -11800");
        assert_eq!(
            error.to_string(),
            "unknown camera error: AVFoundation code -11800"
        );
    }

    #[test]
    fn test_wrapped_display_matches_the_inner_error() {
        let inner = SessionError::CameraNotReady;
        let wrapped: CameraError = inner.clone().into();
        assert_eq!(wrapped.to_string(), inner.to_string());
    }

    #[test]
    fn test_errors_are_std_error_sources() {
        let wrapped: CameraError = DeviceError::NoDevice.into();
        let source = wrapped.source();
        assert!(source.is_some());
        assert!(source.unwrap().to_string().contains("no camera device"));
    }

    #[test]
    fn test_error_debug_format() {
        let error = CameraError::Unknown("debug probe".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Unknown"));
        assert!(debug_str.contains("debug probe"));
    }
}
