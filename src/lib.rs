//! camsession: capture-session orchestration core for device cameras
//!
//! This crate owns the state machine that turns independently-settable
//! inputs (camera selection, output descriptors, format parameters, the
//! active flag) into an ordered sequence of platform operations: open
//! device, build outputs, build session, start or stop the repeating
//! request. Platform capture primitives live behind trait seams in the
//! [`device`] module; a synthetic backend for offline testing ships in
//! [`testing`].
//!
//! # Usage
//! ```rust,no_run
//! use camsession::session::{CameraSession, SessionCallback};
//! use camsession::testing::{synthetic_capabilities, SyntheticProvider};
//! use camsession::SessionConfig;
//! use std::sync::Arc;
//!
//! struct Owner;
//! impl SessionCallback for Owner {
//!     fn on_initialized(&self) {}
//!     fn on_error(&self, error: &camsession::CameraError) {
//!         eprintln!("[{}] {}", error.code(), error);
//!     }
//! }
//!
//! # async fn run() -> Result<(), camsession::CameraError> {
//! let provider = Arc::new(
//!     SyntheticProvider::new().with_device("back", synthetic_capabilities()),
//! );
//! let session = CameraSession::new(provider, Arc::new(Owner), SessionConfig::default());
//! session.set_input_device("back").await?;
//! session.set_active(true).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod errors;
pub mod format;
pub mod outputs;
pub mod session;
pub mod types;

// Testing utilities - synthetic backend for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::SessionConfig;
pub use errors::{CameraError, CaptureError, DeviceError, FormatError, ParameterError, SessionError};
pub use format::FormatFilter;
pub use session::{CameraSession, SessionCallback, SessionPhase};
pub use types::{
    CameraCapabilities, CameraFormat, CapturedPhoto, FlashMode, FpsRange, ImageBuffer, OutputKind,
    QualityPrioritization, Size, StabilizationMode,
};

/// Initialize logging for the capture core
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "camsession=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
