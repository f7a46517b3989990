//! Camera abstraction for frame capture.
//!
//! The camera is an external collaborator: it hands out frames one at a
//! time and expects each buffer back exactly once. [`MockCamera`] stands
//! in for real hardware and keeps count of buffers it is still owed.

use super::{CaptureConfig, Plane, RawFrame};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No camera with the requested id.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The camera exists but could not be bound.
    #[error("failed to bind preview and analysis: {0}")]
    BindFailed(String),
    /// The camera rejected the configuration.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// A frame could not be read.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// The camera is not open.
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera implementations.
pub trait Camera: Send {
    /// Binds the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame.
    fn capture(&mut self) -> Result<RawFrame, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Shared counters of buffers handed out and returned.
#[derive(Debug, Default)]
pub struct BufferLedger {
    issued: AtomicU64,
    released: AtomicU64,
}

impl BufferLedger {
    /// Buffers handed out so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }

    /// Buffers returned so far.
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Acquire)
    }

    /// Buffers handed out but not yet returned.
    pub fn outstanding(&self) -> u64 {
        self.issued().saturating_sub(self.released())
    }
}

/// Mock camera that generates synthetic YUV frames.
///
/// Exposes device ids `0..devices`; opening any other id fails.
#[derive(Debug)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    devices: u32,
    sequence: u64,
    ledger: Arc<BufferLedger>,
    unavailable: Option<String>,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self {
            config: None,
            devices: 1,
            sequence: 0,
            ledger: Arc::default(),
            unavailable: None,
        }
    }
}

impl MockCamera {
    /// A closed camera with a single device.
    pub fn new() -> Self {
        Self::default()
    }

    /// A closed camera exposing `devices` device ids.
    pub fn with_devices(devices: u32) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    /// A camera whose bind always fails with the given reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Buffer accounting shared with every frame this camera produced.
    pub fn ledger(&self) -> Arc<BufferLedger> {
        Arc::clone(&self.ledger)
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if config.device_id >= self.devices {
            return Err(CameraError::DeviceNotFound(format!(
                "device {} (have {})",
                config.device_id, self.devices
            )));
        }
        if let Some(reason) = &self.unavailable {
            return Err(CameraError::BindFailed(reason.clone()));
        }
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(
            device = config.device_id,
            facing = ?config.facing,
            "MockCamera opened with config: {:?}",
            config
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<RawFrame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        let width = config.width as usize;
        let height = config.height as usize;
        let chroma_w = width.div_ceil(2);
        let chroma_h = height.div_ceil(2);

        // Moving diagonal luminance ramp over neutral chroma
        let shift = self.sequence as usize;
        let luma: Vec<u8> = (0..width * height)
            .map(|i| ((i % width + i / width + shift) % 256) as u8)
            .collect();
        let chroma = vec![128u8; chroma_w * chroma_h];

        self.sequence += 1;
        self.ledger.issued.fetch_add(1, Ordering::AcqRel);

        let ledger = Arc::clone(&self.ledger);
        let frame = RawFrame::new(
            Plane::packed(luma, width),
            Plane::packed(chroma.clone(), chroma_w),
            Plane::packed(chroma, chroma_w),
            config.width,
            config.height,
            self.sequence,
        )
        .with_release(move || {
            ledger.released.fetch_add(1, Ordering::AcqRel);
        });

        Ok(frame)
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!(
            outstanding = self.ledger.outstanding(),
            "MockCamera closed"
        );
    }
}
