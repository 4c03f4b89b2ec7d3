//! Runtime configuration for the capture controller.
//!
//! Buffer depths, restart policy, and delivery tuning, loadable from TOML
//! with missing-file-means-defaults behavior.

use crate::errors::{CameraError, DeviceError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Photo producer queue depth: one in-flight capture, one being read,
    /// plus headroom.
    pub photo_queue_depth: usize,
    /// Video producer queue depth; kept shallow for latency.
    pub video_queue_depth: usize,
    /// Maximum automatic session restarts after a runtime device error.
    pub restart_attempts: u32,
    /// Base backoff between restart attempts, doubled per attempt.
    pub restart_backoff_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            photo_queue_depth: 3,
            video_queue_depth: 2,
            restart_attempts: 3,
            restart_backoff_ms: 250,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file; a missing file means defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            DeviceError::ConfigureFailed(format!("failed to read config file: {}", e))
        })?;

        let config: SessionConfig = toml::from_str(&contents).map_err(|e| {
            DeviceError::ConfigureFailed(format!("failed to parse config file: {}", e))
        })?;

        config.validate()?;
        log::info!("loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DeviceError::ConfigureFailed(format!("failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            DeviceError::ConfigureFailed(format!("failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            DeviceError::ConfigureFailed(format!("failed to write config file: {}", e))
        })?;

        log::info!("saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("camsession.toml")
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        if self.photo_queue_depth == 0 || self.video_queue_depth == 0 {
            return Err(
                DeviceError::ConfigureFailed("queue depths must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }
}
