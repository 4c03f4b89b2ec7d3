//! Testing utilities for camsession
//!
//! Provides a synthetic camera backend implementing the platform seam
//! traits, enabling reliable offline testing without camera hardware.

pub mod synthetic;

pub use synthetic::{synthetic_capabilities, synthetic_image, SyntheticHub, SyntheticProvider};
