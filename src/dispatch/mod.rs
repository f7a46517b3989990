//! Hand-off from the worker to the UI context.
//!
//! A confirmed gesture becomes a [`GestureConfirmed`] message on the UI
//! queue. The worker returns to its next frame immediately; the action
//! runs whenever the UI context drains the queue.

mod action;
mod notice;
mod queue;

pub use action::{Action, DispatchError, LaunchMode, OpenUrl, DESTINATION_URL};
pub use notice::{ConsoleNotices, Notice, NoticeKind, NoticeSink};
pub use queue::{ui_queue, UiEvent, UiExecutor, UiHandle};

use crate::classifier::ConfidenceScore;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A frame whose score exceeded the detection threshold.
#[derive(Debug, Clone, Serialize)]
pub struct GestureConfirmed {
    /// Sequence number of the frame.
    pub sequence: u64,
    /// Classifier score.
    pub score: ConfidenceScore,
    /// When the worker confirmed the gesture.
    pub detected_at: DateTime<Utc>,
}

impl GestureConfirmed {
    /// Stamps a confirmation with the current time.
    pub fn new(sequence: u64, score: ConfidenceScore) -> Self {
        Self {
            sequence,
            score,
            detected_at: Utc::now(),
        }
    }
}
