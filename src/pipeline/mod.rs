//! Single-in-flight detection pipeline.
//!
//! At most one frame is processed at any time. Frames that arrive while
//! the slot is taken are dropped, never queued: latency and memory stay
//! bounded at the cost of skipped frames.

mod detection;
mod gate;
mod outcome;
mod threshold;

pub use detection::{DetectionPipeline, PipelineBuilder, PipelineError};
pub use gate::{FrameGate, GatePermit};
pub use outcome::{
    Admission, CycleOutcome, CycleReport, NoMatchReason, PipelineStats, StatsSnapshot,
};
pub use threshold::{DetectionThreshold, CONFIDENCE_THRESHOLD};
