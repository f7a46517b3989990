//! Prometheus metrics for the detection pipeline.
//!
//! # Metrics Exposed
//!
//! ## Admission
//! - `gesture_frames_received_total` - Frames offered to the gate
//! - `gesture_frames_admitted_total` - Frames admitted for processing
//! - `gesture_frames_dropped_total` - Frames dropped while busy
//! - `gesture_pipeline_busy` - 1 while a frame is in flight
//!
//! ## Outcomes
//! - `gesture_matches_total` - Scores above the threshold
//! - `gesture_below_threshold_total` - Scores at or below the threshold
//! - `gesture_encode_errors_total` - Undecodable frames
//! - `gesture_classifier_errors_total` - Failed inferences
//!
//! ## Dispatch
//! - `gesture_dispatches_total` - Actions performed
//! - `gesture_dispatch_failures_total` - Actions that failed
//!
//! With the `metrics` feature the same counters are served on loopback,
//! alongside `/stats` (JSON snapshot) and `/health`.
//!
//! # Example
//!
//! ```no_run
//! use gesture_launch::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.update(&MetricsSnapshot::default());
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
