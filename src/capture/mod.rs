//! Camera input and frame handling.
//!
//! Frames arrive from a camera one at a time, as planar YUV buffers that
//! must be handed back to the camera once processing is over.

mod camera;
mod config;
mod frame;

pub use camera::{BufferLedger, Camera, CameraError, MockCamera};
pub use config::{CaptureConfig, ConfigError, DetectorConfig, Facing, FileConfig, OutputConfig};
pub use frame::{Plane, RawFrame, ReleaseHook};
