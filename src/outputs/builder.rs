//! Build concrete outputs from descriptors and device capabilities.
//!
//! Runs only inside the controller's reconcile critical section; the caller
//! closes the previous output set before invoking the builder, so producer
//! allocation never overlaps a superseded set.

use crate::config::SessionConfig;
use crate::errors::{CameraError, ParameterError};
use crate::format::closest_to_or_max;
use crate::outputs::{
    BufferProducer, FrameCallback, OutputDescriptors, OutputSet, OverflowPolicy, PreviewOutput,
};
use crate::types::{CameraCapabilities, OutputKind, Size};

fn resolve_size(
    kind: OutputKind,
    target: Option<Size>,
    capabilities: &CameraCapabilities,
) -> Result<Size, CameraError> {
    if !capabilities.supports_output(kind) {
        return Err(ParameterError::UnsupportedOutput(kind).into());
    }
    closest_to_or_max(target, capabilities.sizes_for(kind))
        .ok_or_else(|| ParameterError::UnsupportedOutput(kind).into())
}

/// Check that every enabled descriptor can be built against the device's
/// capabilities, without allocating anything.
///
/// Runs before any teardown so a rejected descriptor set leaves the
/// previous outputs and session untouched.
pub(crate) fn probe_outputs(
    capabilities: &CameraCapabilities,
    descriptors: &OutputDescriptors,
) -> Result<(), CameraError> {
    if let Some(photo) = descriptors.photo.as_ref().filter(|d| d.enabled) {
        resolve_size(OutputKind::Photo, photo.target_size, capabilities)?;
    }
    if let Some(video) = descriptors.video.as_ref().filter(|d| d.enabled) {
        resolve_size(OutputKind::Video, video.target_size, capabilities)?;
    }
    if descriptors.preview.as_ref().is_some_and(|d| d.enabled) {
        resolve_size(OutputKind::Preview, None, capabilities)?;
    }
    Ok(())
}

/// Turn the descriptor set into live producers and a preview binding.
///
/// `photo_sink` routes still-image buffers to the photo synchronizer; video
/// buffers go straight to the descriptor's own callback.
pub(crate) fn build_outputs(
    capabilities: &CameraCapabilities,
    descriptors: &OutputDescriptors,
    config: &SessionConfig,
    photo_sink: FrameCallback,
) -> Result<OutputSet, CameraError> {
    let mut outputs = OutputSet::default();

    if let Some(photo) = descriptors.photo.as_ref().filter(|d| d.enabled) {
        let size = resolve_size(OutputKind::Photo, photo.target_size, capabilities)?;
        log::info!("photo output: {} (queue depth {})", size, config.photo_queue_depth);
        outputs.photo = Some(BufferProducer::spawn(
            OutputKind::Photo,
            size,
            config.photo_queue_depth,
            OverflowPolicy::Reject,
            photo_sink,
        ));
    }

    if let Some(video) = descriptors.video.as_ref().filter(|d| d.enabled) {
        let size = resolve_size(OutputKind::Video, video.target_size, capabilities)?;
        log::info!("video output: {} (queue depth {})", size, config.video_queue_depth);
        outputs.video = Some(BufferProducer::spawn(
            OutputKind::Video,
            size,
            config.video_queue_depth,
            OverflowPolicy::DropOldest,
            video.callback.clone(),
        ));
    }

    if let Some(preview) = descriptors.preview.as_ref().filter(|d| d.enabled) {
        let size = resolve_size(OutputKind::Preview, None, capabilities)?;
        log::info!("preview output: {} on surface {:?}", size, preview.surface);
        outputs.preview = Some(PreviewOutput {
            surface: preview.surface,
            size,
        });
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::{PhotoOutputDescriptor, PreviewOutputDescriptor, VideoOutputDescriptor};
    use crate::types::{CameraFormat, SurfaceHandle};
    use std::sync::Arc;

    fn capabilities() -> CameraCapabilities {
        CameraCapabilities {
            formats: vec![CameraFormat::new(1920, 1080, 30)],
            photo_sizes: vec![Size::new(4000, 3000), Size::new(1920, 1080)],
            video_sizes: vec![Size::new(1920, 1080), Size::new(1280, 720)],
            preview_sizes: vec![Size::new(1280, 720), Size::new(640, 480)],
            supported_outputs: vec![OutputKind::Photo, OutputKind::Video, OutputKind::Preview],
            supports_low_light_boost: false,
        }
    }

    fn noop_sink() -> FrameCallback {
        Arc::new(|_| {})
    }

    #[test]
    fn test_exact_photo_size_match_preferred() {
        let descriptors = OutputDescriptors {
            photo: Some(PhotoOutputDescriptor {
                enabled: true,
                target_size: Some(Size::new(4000, 3000)),
            }),
            ..Default::default()
        };
        let mut outputs = build_outputs(
            &capabilities(),
            &descriptors,
            &SessionConfig::default(),
            noop_sink(),
        )
        .unwrap();
        assert_eq!(outputs.photo.as_ref().unwrap().size(), Size::new(4000, 3000));
        outputs.close();
    }

    #[test]
    fn test_unsupported_output_probe_fails() {
        let mut caps = capabilities();
        caps.supported_outputs = vec![OutputKind::Preview];
        let descriptors = OutputDescriptors {
            video: Some(VideoOutputDescriptor {
                enabled: true,
                target_size: None,
                callback: noop_sink(),
            }),
            ..Default::default()
        };
        let err = build_outputs(&caps, &descriptors, &SessionConfig::default(), noop_sink())
            .err()
            .unwrap();
        assert_eq!(err.code(), "parameter/unsupported-output");
    }

    #[test]
    fn test_disabled_descriptors_build_nothing() {
        let descriptors = OutputDescriptors {
            photo: Some(PhotoOutputDescriptor {
                enabled: false,
                target_size: None,
            }),
            preview: Some(PreviewOutputDescriptor {
                enabled: true,
                surface: SurfaceHandle(7),
            }),
            ..Default::default()
        };
        let outputs = build_outputs(
            &capabilities(),
            &descriptors,
            &SessionConfig::default(),
            noop_sink(),
        )
        .unwrap();
        assert!(outputs.photo.is_none());
        assert!(outputs.video.is_none());
        let preview = outputs.preview.as_ref().unwrap();
        assert_eq!(preview.size, Size::new(1280, 720));
        assert_eq!(preview.surface, SurfaceHandle(7));
        assert_eq!(outputs.repeating_targets(), vec![OutputKind::Preview]);
    }
}
