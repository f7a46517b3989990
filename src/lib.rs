//! Gesture Launch Library
//!
//! Watches a camera for a "C" hand gesture and opens a fixed destination
//! when a classifier is confident enough that it is present.
//!
//! # Architecture
//!
//! ```text
//! camera ─► gate ─► worker: encode → classify → threshold ─► UI queue ─► action
//!             │
//!             └─ busy: frame dropped and returned to the camera
//! ```
//!
//! # Design Principles
//!
//! - **One frame in flight**: the gate admits a single frame; everything
//!   arriving meanwhile is dropped, never queued
//! - **Guaranteed release**: frame buffers and the gate are released by
//!   drop guards on every path, including classifier failures
//! - **Per-frame errors stay local**: undecodable frames and failed
//!   inferences count as "no gesture"; startup errors reach the user
//! - **UI affinity**: actions only run where the [`UiExecutor`] lives
//!
//! # Example
//!
//! ```no_run
//! use gesture_launch::{
//!     capture::{Camera, CaptureConfig, MockCamera},
//!     classifier::StubClassifier,
//!     dispatch::{ui_queue, ConsoleNotices, LaunchMode, OpenUrl},
//!     pipeline::DetectionPipeline,
//! };
//!
//! let (ui, mut executor) = ui_queue(
//!     Box::new(OpenUrl::destination(LaunchMode::DryRun)),
//!     Box::new(ConsoleNotices),
//! );
//! let pipeline = DetectionPipeline::start(StubClassifier, ui).unwrap();
//!
//! let mut camera = MockCamera::new();
//! camera.open(&CaptureConfig::default()).unwrap();
//! for _ in 0..10 {
//!     let frame = camera.capture().unwrap();
//!     let _ = pipeline.on_frame(frame);
//!     executor.run_pending();
//! }
//!
//! let stats = pipeline.shutdown();
//! println!("admitted {} of {}", stats.admitted, stats.received);
//! ```
//!
//! [`UiExecutor`]: dispatch::UiExecutor

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod app;
pub mod capture;
pub mod classifier;
pub mod dispatch;
pub mod encoding;
pub mod metrics;
pub mod permission;
pub mod pipeline;

// Re-export commonly used types at crate root
pub use app::{Detector, GestureApp, Session, SessionSummary, StartupError};
pub use capture::{Camera, CaptureConfig, FileConfig, MockCamera, RawFrame};
pub use classifier::{ConfidenceScore, GestureClassifier, ModelSource};
pub use dispatch::{ui_queue, Action, OpenUrl, UiExecutor, UiHandle, DESTINATION_URL};
pub use encoding::{FrameEncoder, Tensor};
pub use pipeline::{Admission, DetectionPipeline, FrameGate, CONFIDENCE_THRESHOLD};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
