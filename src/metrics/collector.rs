//! Metrics collection and registry.

use crate::pipeline::StatsSnapshot;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registry or encoder failure.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of system state for metrics update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Pipeline counters.
    pub pipeline: StatsSnapshot,
    /// Whether a frame is currently in flight.
    pub busy: bool,
    /// Actions performed on the UI context.
    pub dispatched: u64,
    /// Actions that failed on the UI context.
    pub dispatch_failures: u64,
}

/// Prometheus metrics registry for the detection pipeline.
pub struct MetricsRegistry {
    registry: Registry,

    // Admission
    frames_received: IntCounter,
    frames_admitted: IntCounter,
    frames_dropped: IntCounter,
    busy: IntGauge,

    // Outcomes
    matched: IntCounter,
    below_threshold: IntCounter,
    encode_errors: IntCounter,
    classifier_errors: IntCounter,

    // Dispatch
    dispatched: IntCounter,
    dispatch_failures: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, MetricsError> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

/// Raises a monotonic counter to `target`.
fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl MetricsRegistry {
    /// Creates a new registry with all pipeline metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let busy = IntGauge::new(
            "gesture_pipeline_busy",
            "Whether a frame is being processed (1=busy, 0=free)",
        )?;
        registry.register(Box::new(busy.clone()))?;

        Ok(Self {
            frames_received: counter(
                &registry,
                "gesture_frames_received_total",
                "Frames offered to the admission gate",
            )?,
            frames_admitted: counter(
                &registry,
                "gesture_frames_admitted_total",
                "Frames admitted for processing",
            )?,
            frames_dropped: counter(
                &registry,
                "gesture_frames_dropped_total",
                "Frames dropped because the pipeline was busy",
            )?,
            busy,
            matched: counter(
                &registry,
                "gesture_matches_total",
                "Frames whose score exceeded the threshold",
            )?,
            below_threshold: counter(
                &registry,
                "gesture_below_threshold_total",
                "Frames scored at or below the threshold",
            )?,
            encode_errors: counter(
                &registry,
                "gesture_encode_errors_total",
                "Frames that could not be encoded",
            )?,
            classifier_errors: counter(
                &registry,
                "gesture_classifier_errors_total",
                "Frames on which inference failed",
            )?,
            dispatched: counter(
                &registry,
                "gesture_dispatches_total",
                "Actions performed after a confirmed gesture",
            )?,
            dispatch_failures: counter(
                &registry,
                "gesture_dispatch_failures_total",
                "Actions that failed",
            )?,
            registry,
        })
    }

    /// Updates all metrics from a snapshot of system state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        let stats = &snapshot.pipeline;

        advance(&self.frames_received, stats.received);
        advance(&self.frames_admitted, stats.admitted);
        advance(&self.frames_dropped, stats.dropped);
        self.busy.set(if snapshot.busy { 1 } else { 0 });

        advance(&self.matched, stats.matched);
        advance(&self.below_threshold, stats.below_threshold);
        advance(&self.encode_errors, stats.encode_errors);
        advance(&self.classifier_errors, stats.classifier_errors);

        advance(&self.dispatched, snapshot.dispatched);
        advance(&self.dispatch_failures, snapshot.dispatch_failures);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            pipeline: StatsSnapshot {
                received: 10,
                admitted: 3,
                dropped: 7,
                matched: 1,
                below_threshold: 1,
                encode_errors: 1,
                classifier_errors: 0,
            },
            busy: true,
            dispatched: 1,
            dispatch_failures: 0,
        };

        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("gesture_frames_received_total 10"));
        assert!(output.contains("gesture_frames_dropped_total 7"));
        assert!(output.contains("gesture_pipeline_busy 1"));
        assert!(output.contains("gesture_dispatches_total 1"));
    }

    #[test]
    fn test_counters_never_go_backwards() {
        let registry = MetricsRegistry::new().unwrap();
        let mut snapshot = MetricsSnapshot::default();

        snapshot.pipeline.received = 5;
        registry.update(&snapshot);
        snapshot.pipeline.received = 2;
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("gesture_frames_received_total 5"));
    }
}
