//! Per-frame outcomes and running totals.

use crate::classifier::{ClassifierError, ConfidenceScore};
use crate::encoding::EncodingError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Result of offering one frame to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Admission {
    /// The frame took the slot and was handed to the worker.
    Admitted,
    /// The slot was busy; the frame was released untouched.
    Dropped,
}

/// Why an admitted frame did not confirm the gesture.
#[derive(Debug, Clone)]
pub enum NoMatchReason {
    /// Scored at or below the threshold.
    BelowThreshold(ConfidenceScore),
    /// The frame could not be turned into a tensor.
    Encoding(EncodingError),
    /// Inference failed.
    Classifier(ClassifierError),
}

/// Terminal state of one admitted frame.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Score exceeded the threshold; the action was scheduled.
    Match(ConfidenceScore),
    /// No action.
    NoMatch(NoMatchReason),
}

impl CycleOutcome {
    /// True if the gesture was confirmed.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match(_))
    }
}

/// Emitted after an admitted frame's cleanup has run.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Sequence number of the frame.
    pub sequence: u64,
    /// How the cycle ended.
    pub outcome: CycleOutcome,
    /// From capture until the frame was released.
    pub latency: Duration,
}

/// Lock-free pipeline counters.
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    admitted: AtomicU64,
    dropped: AtomicU64,
    matched: AtomicU64,
    below_threshold: AtomicU64,
    encode_errors: AtomicU64,
    classifier_errors: AtomicU64,
}

impl PipelineStats {
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn revoke_admitted(&self) {
        self.admitted.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, outcome: &CycleOutcome) {
        let counter = match outcome {
            CycleOutcome::Match(_) => &self.matched,
            CycleOutcome::NoMatch(NoMatchReason::BelowThreshold(_)) => &self.below_threshold,
            CycleOutcome::NoMatch(NoMatchReason::Encoding(_)) => &self.encode_errors,
            CycleOutcome::NoMatch(NoMatchReason::Classifier(_)) => &self.classifier_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            below_threshold: self.below_threshold.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            classifier_errors: self.classifier_errors.load(Ordering::Relaxed),
        }
    }
}

/// Copy of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Frames offered to the gate.
    pub received: u64,
    /// Frames that took the slot.
    pub admitted: u64,
    /// Frames released without processing.
    pub dropped: u64,
    /// Cycles that confirmed the gesture.
    pub matched: u64,
    /// Cycles scored at or below the threshold.
    pub below_threshold: u64,
    /// Cycles ended by an encoding error.
    pub encode_errors: u64,
    /// Cycles ended by a classifier error.
    pub classifier_errors: u64,
}

impl StatsSnapshot {
    /// Admitted cycles that have finished.
    pub fn completed(&self) -> u64 {
        self.matched + self.below_threshold + self.encode_errors + self.classifier_errors
    }

    /// Cycles without a match, whatever the reason.
    pub fn no_match(&self) -> u64 {
        self.below_threshold + self.encode_errors + self.classifier_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_land_in_their_counter() {
        let stats = PipelineStats::default();
        let score = ConfidenceScore::new(0.5).unwrap();

        stats.record_outcome(&CycleOutcome::Match(score));
        stats.record_outcome(&CycleOutcome::NoMatch(NoMatchReason::BelowThreshold(score)));
        stats.record_outcome(&CycleOutcome::NoMatch(NoMatchReason::Encoding(
            EncodingError::Decode("bad".into()),
        )));
        stats.record_outcome(&CycleOutcome::NoMatch(NoMatchReason::Classifier(
            ClassifierError::EmptyOutput,
        )));

        let snap = stats.snapshot();
        assert_eq!(snap.matched, 1);
        assert_eq!(snap.below_threshold, 1);
        assert_eq!(snap.encode_errors, 1);
        assert_eq!(snap.classifier_errors, 1);
        assert_eq!(snap.completed(), 4);
        assert_eq!(snap.no_match(), 3);
    }
}
