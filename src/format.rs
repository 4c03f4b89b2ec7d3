//! Format negotiation: pick the best supported format for a filter.
//!
//! Selection is a documented, deterministic total order. Hard constraints
//! (fps interval coverage, HDR, stabilization) filter the candidate set;
//! survivors are ranked by:
//!
//! 1. higher maximum frame rate first,
//! 2. then an exact target-size match, then resolution closest to the
//!    requested target size by absolute area difference, or largest area
//!    when no target size was requested,
//! 3. then device-default ordering (lowest index in the supported list).
//!
//! An empty survivor set is `FormatError::NoMatchingFormat`; callers keep
//! the previous active format in that case rather than picking a fallback.

use crate::errors::FormatError;
use crate::types::{CameraFormat, Size, StabilizationMode};
use serde::{Deserialize, Serialize};

/// Requested format constraints. `None` means "no preference".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatFilter {
    pub target_size: Option<Size>,
    pub min_fps: Option<u32>,
    pub max_fps: Option<u32>,
    pub hdr: Option<bool>,
    pub stabilization: Option<StabilizationMode>,
}

impl FormatFilter {
    fn satisfied_by(&self, format: &CameraFormat) -> bool {
        // Some supported range must cover the whole requested fps interval.
        if self.min_fps.is_some() || self.max_fps.is_some() {
            let covered = format.fps_ranges.iter().any(|range| {
                self.min_fps.map_or(true, |min| range.contains(min))
                    && self.max_fps.map_or(true, |max| range.contains(max))
            });
            if !covered {
                return false;
            }
        }
        if self.hdr == Some(true) && !format.supports_hdr {
            return false;
        }
        if let Some(mode) = self.stabilization {
            if !format.supports_stabilization(mode) {
                return false;
            }
        }
        true
    }
}

/// Select the best supported format for `filter`, or report no match.
///
/// Deterministic: the same inputs always yield the same format.
pub fn select_format(
    formats: &[CameraFormat],
    filter: &FormatFilter,
) -> Result<CameraFormat, FormatError> {
    let mut candidates: Vec<(usize, &CameraFormat)> = formats
        .iter()
        .enumerate()
        .filter(|(_, f)| filter.satisfied_by(f))
        .collect();

    if candidates.is_empty() {
        return Err(FormatError::NoMatchingFormat);
    }

    candidates.sort_by_key(|(index, format)| {
        let (mismatch, distance) = match filter.target_size {
            // An exact resolution match outranks any equal-area candidate.
            Some(target) => (
                format.size() != target,
                format.size().area().abs_diff(target.area()),
            ),
            // No target: larger area ranks earlier.
            None => (true, u64::MAX - format.size().area()),
        };
        (std::cmp::Reverse(format.max_fps()), mismatch, distance, *index)
    });

    Ok(candidates[0].1.clone())
}

/// Resolve a concrete output size against the device's supported sizes.
///
/// Exact match wins, then smallest absolute area difference, then device
/// order. With no target, the maximum-area size is chosen. Returns `None`
/// only when `sizes` is empty.
pub fn closest_to_or_max(target: Option<Size>, sizes: &[Size]) -> Option<Size> {
    match target {
        Some(target) => sizes
            .iter()
            .enumerate()
            .min_by_key(|(index, size)| {
                (**size != target, size.area().abs_diff(target.area()), *index)
            })
            .map(|(_, size)| *size),
        None => sizes.iter().max_by_key(|size| size.area()).copied(),
    }
}
