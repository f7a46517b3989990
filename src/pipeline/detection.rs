//! Frame admission, processing and dispatch.
//!
//! ```text
//! frame ──► gate ──busy──► release frame                       (Dropped)
//!            │
//!           free ─► worker: encode ─► classify ─► score > 0.8 ? ─► UI queue
//!                      │ error          │ error          │ no
//!                      └────────────────┴────────────────┴──► NoMatch
//!                                        cleanup: release frame, free gate
//! ```
//!
//! [`DetectionPipeline::on_frame`] runs on the camera's callback context
//! and never blocks. Admitted frames travel to one worker thread together
//! with the gate permit; both are dropped when the cycle ends, so the
//! frame is returned and the gate freed on every path, panics included.

use super::gate::{FrameGate, GatePermit};
use super::outcome::{
    Admission, CycleOutcome, CycleReport, NoMatchReason, PipelineStats, StatsSnapshot,
};
use super::threshold::DetectionThreshold;
use crate::capture::RawFrame;
use crate::classifier::{ClassifierError, GestureClassifier};
use crate::dispatch::{GestureConfirmed, UiHandle};
use crate::encoding::{EncodingError, FrameEncoder};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

/// Errors raised while starting the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// One admitted frame and the slot it holds.
///
/// Field order is drop order: the frame goes back to the camera before
/// the gate opens for the next one.
struct Job {
    frame: RawFrame,
    _permit: GatePermit,
}

/// Builder for [`DetectionPipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    encoder: FrameEncoder,
    threshold: DetectionThreshold,
    reports: Option<Sender<CycleReport>>,
}

impl PipelineBuilder {
    /// Overrides the confirmation threshold.
    pub fn threshold(mut self, threshold: DetectionThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// Receives a [`CycleReport`] after each admitted frame's cleanup.
    pub fn reports(mut self, tx: Sender<CycleReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Starts the worker thread. The classifier moves onto it and is
    /// only ever called from there.
    pub fn start<C>(self, classifier: C, ui: UiHandle) -> Result<DetectionPipeline, PipelineError>
    where
        C: GestureClassifier + 'static,
    {
        let gate = Arc::new(FrameGate::new());
        let stats = Arc::new(PipelineStats::default());
        // The gate admits one frame at a time, so one slot is enough.
        let (tx, rx) = crossbeam_channel::bounded(1);

        let worker = Worker {
            encoder: self.encoder,
            threshold: self.threshold,
            ui,
            stats: Arc::clone(&stats),
            reports: self.reports,
        };

        let name = classifier.name().to_string();
        let handle = std::thread::Builder::new()
            .name("gesture-worker".to_string())
            .spawn(move || worker.run(classifier, rx))?;

        tracing::info!(
            classifier = %name,
            threshold = self.threshold.value(),
            "Detection pipeline started"
        );

        Ok(DetectionPipeline {
            gate,
            jobs: Some(tx),
            worker: Some(handle),
            stats,
        })
    }
}

/// Single-in-flight gesture detection pipeline.
pub struct DetectionPipeline {
    gate: Arc<FrameGate>,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<PipelineStats>,
}

impl DetectionPipeline {
    /// Starts configuring a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Starts a pipeline with the default encoder and threshold.
    pub fn start<C>(classifier: C, ui: UiHandle) -> Result<Self, PipelineError>
    where
        C: GestureClassifier + 'static,
    {
        Self::builder().start(classifier, ui)
    }

    /// Offers a frame. Returns at once: either the frame is handed to the
    /// worker or it is released on the spot.
    pub fn on_frame(&self, frame: RawFrame) -> Admission {
        self.stats.record_received();
        let sequence = frame.sequence();

        let Some(permit) = self.gate.try_permit() else {
            self.stats.record_dropped();
            tracing::trace!(sequence, "Frame dropped: worker busy");
            frame.close();
            return Admission::Dropped;
        };

        let Some(jobs) = &self.jobs else {
            self.stats.record_dropped();
            return Admission::Dropped;
        };

        self.stats.record_admitted();
        match jobs.try_send(Job {
            frame,
            _permit: permit,
        }) {
            Ok(()) => {
                tracing::trace!(sequence, "Frame admitted");
                Admission::Admitted
            }
            Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => {
                // Only reachable if the worker has gone away.
                self.stats.revoke_admitted();
                self.stats.record_dropped();
                tracing::warn!(sequence, "Worker unavailable; frame dropped");
                drop(job);
                Admission::Dropped
            }
        }
    }

    /// True while a frame is being processed.
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Current counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shared counters, for exporters that outlive a borrow.
    pub fn stats_handle(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Stops accepting frames, lets the in-flight cycle finish and joins
    /// the worker.
    pub fn shutdown(mut self) -> StatsSnapshot {
        self.stop_worker();
        self.stats.snapshot()
    }

    fn stop_worker(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Detection worker panicked");
            }
        }
    }
}

impl Drop for DetectionPipeline {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

impl std::fmt::Debug for DetectionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionPipeline")
            .field("busy", &self.gate.is_busy())
            .field("running", &self.jobs.is_some())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

/// State owned by the worker thread.
struct Worker {
    encoder: FrameEncoder,
    threshold: DetectionThreshold,
    ui: UiHandle,
    stats: Arc<PipelineStats>,
    reports: Option<Sender<CycleReport>>,
}

impl Worker {
    fn run<C: GestureClassifier>(self, mut classifier: C, jobs: Receiver<Job>) {
        for job in jobs.iter() {
            let sequence = job.frame.sequence();
            let outcome = self.process(&mut classifier, &job.frame);

            if let CycleOutcome::Match(score) = &outcome {
                if !self.ui.confirm(GestureConfirmed::new(sequence, *score)) {
                    tracing::warn!(sequence, "UI queue closed; confirmation discarded");
                }
            }
            self.stats.record_outcome(&outcome);

            let captured = job.frame.timestamp();
            drop(job);
            let latency = captured.elapsed();
            tracing::debug!(sequence, latency_ms = latency.as_millis() as u64, "Cycle complete");

            if let Some(reports) = &self.reports {
                let _ = reports.send(CycleReport {
                    sequence,
                    outcome,
                    latency,
                });
            }
        }
        tracing::debug!("Detection worker stopped");
    }

    fn process<C: GestureClassifier>(&self, classifier: &mut C, frame: &RawFrame) -> CycleOutcome {
        let sequence = frame.sequence();

        let encoded = contain_panic(|| self.encoder.encode(frame), EncodingError::Panicked);
        let tensor = match encoded {
            Ok(tensor) => tensor,
            Err(e) => {
                tracing::debug!(sequence, reason = %e, "Frame not decodable");
                return CycleOutcome::NoMatch(NoMatchReason::Encoding(e));
            }
        };

        let result = contain_panic(|| classifier.classify(&tensor), ClassifierError::Panicked);

        match result {
            Ok(score) if self.threshold.is_confirmed(score) => {
                tracing::info!(sequence, score = %score, "Gesture confirmed");
                CycleOutcome::Match(score)
            }
            Ok(score) => {
                tracing::trace!(sequence, score = %score, "Below threshold");
                CycleOutcome::NoMatch(NoMatchReason::BelowThreshold(score))
            }
            Err(e) => {
                tracing::warn!(sequence, error = %e, "Classification failed");
                CycleOutcome::NoMatch(NoMatchReason::Classifier(e))
            }
        }
    }
}

/// Runs one stage of the cycle, turning a panic into that stage's error
/// so the worker keeps serving frames.
fn contain_panic<T, E>(
    stage: impl FnOnce() -> Result<T, E>,
    on_panic: fn(String) -> E,
) -> Result<T, E> {
    panic::catch_unwind(AssertUnwindSafe(stage))
        .unwrap_or_else(|payload| Err(on_panic(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
