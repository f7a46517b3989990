//! Camera capture and application configuration.
//!
//! Detection constants (threshold, input size, JPEG quality, destination)
//! are fixed in code. Only the capture side and the run options are read
//! from a file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which physical camera to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// User-facing camera.
    Front,
    /// World-facing camera.
    Back,
}

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index or identifier.
    pub device_id: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target frames per second.
    pub fps: u32,
    /// Camera to bind.
    pub facing: Facing,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 30,
            facing: Facing::Front,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        // JPEG limits each side to 16 bits.
        if self.width > u16::MAX as u32 || self.height > u16::MAX as u32 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }

    /// Interval between two frames at the configured rate.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Zero or oversized frame dimensions.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Frame rate outside 1-120.
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Camera settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Detector selection.
    #[serde(default)]
    pub detector: DetectorConfig,
    /// Run and output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Detector selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Directory holding the bundled model artifact.
    pub asset_dir: PathBuf,
    /// Use the stub detector that never reports a gesture.
    pub stub: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            stub: false,
        }
    }
}

/// Run options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Run until interrupted (true) or deliver a fixed number of frames.
    pub continuous: bool,
    /// Number of frames to deliver if not continuous.
    pub frame_count: u32,
    /// Stop once the destination has been opened.
    pub exit_after_launch: bool,
    /// Log the launch instead of opening the destination.
    pub dry_run: bool,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            frame_count: 300,
            exit_after_launch: true,
            dry_run: false,
            metrics_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.capture.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.facing, Facing::Front);
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        let mut config = CaptureConfig::default();
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_frame_rate_bounds() {
        let mut config = CaptureConfig::default();
        config.fps = 121;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFrameRate)
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FileConfig::from_toml(
            r#"
            [capture]
            width = 320
            height = 240
            facing = "back"

            [detector]
            stub = true
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.width, 320);
        assert_eq!(config.capture.fps, 30);
        assert_eq!(config.capture.facing, Facing::Back);
        assert!(config.detector.stub);
        assert_eq!(config.detector.asset_dir, PathBuf::from("assets"));
        assert!(config.output.exit_after_launch);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(matches!(
            FileConfig::from_toml("[capture]\nwidth = 0\n"),
            Err(ConfigError::InvalidDimensions)
        ));
        assert!(matches!(
            FileConfig::from_toml("capture = 3"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
