//! Startup sequence and running session.
//!
//! Model loading happens when the app is built, before any frame exists,
//! so a missing artifact is reported immediately. Starting a session then
//! checks permission, binds the camera and spawns the frame loop. Startup
//! failures are posted to the UI as notices and returned to the caller;
//! a failed start leaves the app inert but ready to retry.

use crate::capture::{Camera, CameraError, CaptureConfig, ConfigError};
use crate::classifier::{
    ConstantClassifier, GestureClassifier, ModelLoadError, ModelSource, StubClassifier,
};
use crate::dispatch::{Notice, UiHandle};
use crate::permission::{ensure_granted, PermissionProvider};
use crate::pipeline::{
    DetectionPipeline, DetectionThreshold, PipelineError, PipelineStats, StatsSnapshot,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors surfaced to the user while starting detection.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Camera permission was refused.
    #[error("camera permission required")]
    PermissionDenied,

    /// The camera could not be bound.
    #[error("unable to start the camera: {0}")]
    CameraBind(#[source] CameraError),

    /// The detector failed to load.
    #[error("gesture model unavailable: {0}")]
    ModelLoad(#[from] ModelLoadError),

    /// The capture configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The worker thread could not start.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A session is already live.
    #[error("detection is already running")]
    AlreadyRunning,
}

impl StartupError {
    /// The user-visible message for this error.
    pub fn notice(&self) -> Notice {
        Notice::error(self.to_string())
    }
}

/// Which detector variant to run.
#[derive(Debug, Clone)]
pub enum Detector {
    /// The bundled model.
    Model(ModelSource),
    /// Never detects anything.
    Stub,
    /// Fixed score, for demos without a model.
    Constant(ConstantClassifier),
}

impl Detector {
    /// Loads the detector eagerly.
    pub fn load(self) -> Result<Box<dyn GestureClassifier>, ModelLoadError> {
        match self {
            Self::Model(source) => load_model(&source),
            Self::Stub => Ok(Box::new(StubClassifier)),
            Self::Constant(classifier) => Ok(Box::new(classifier)),
        }
    }
}

#[cfg(feature = "onnx")]
fn load_model(source: &ModelSource) -> Result<Box<dyn GestureClassifier>, ModelLoadError> {
    Ok(Box::new(crate::classifier::OnnxClassifier::load(source)?))
}

#[cfg(not(feature = "onnx"))]
fn load_model(source: &ModelSource) -> Result<Box<dyn GestureClassifier>, ModelLoadError> {
    // Still report a missing artifact as such.
    source.read()?;
    Err(ModelLoadError::BackendUnavailable)
}

/// Loaded detector waiting for the user to start the camera.
pub struct GestureApp {
    classifier: Option<Box<dyn GestureClassifier>>,
    threshold: DetectionThreshold,
    ui: UiHandle,
}

impl GestureApp {
    /// Loads the detector. A model that fails to load is fatal and is
    /// reported right away.
    pub fn new(detector: Detector, ui: UiHandle) -> Result<Self, StartupError> {
        let classifier = detector.load().map_err(|e| {
            let err = StartupError::ModelLoad(e);
            tracing::error!(error = %err, "Model load failed");
            ui.notify(err.notice());
            err
        })?;

        tracing::info!(detector = classifier.name(), "Detector ready");
        Ok(Self {
            classifier: Some(classifier),
            threshold: DetectionThreshold::default(),
            ui,
        })
    }

    /// Overrides the confirmation threshold.
    pub fn with_threshold(mut self, threshold: DetectionThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// True until a session has been started.
    pub fn is_idle(&self) -> bool {
        self.classifier.is_some()
    }

    /// Checks permission, binds the camera and starts delivering frames.
    ///
    /// `frame_limit` stops the frame loop after that many frames.
    pub fn start<C>(
        &mut self,
        camera: C,
        config: &CaptureConfig,
        permission: &mut dyn PermissionProvider,
        frame_limit: Option<u64>,
    ) -> Result<Session, StartupError>
    where
        C: Camera + 'static,
    {
        self.try_start(camera, config, permission, frame_limit)
            .inspect_err(|err| {
                tracing::warn!(error = %err, "Detection not started");
                self.ui.notify(err.notice());
            })
    }

    fn try_start<C>(
        &mut self,
        mut camera: C,
        config: &CaptureConfig,
        permission: &mut dyn PermissionProvider,
        frame_limit: Option<u64>,
    ) -> Result<Session, StartupError>
    where
        C: Camera + 'static,
    {
        if self.classifier.is_none() {
            return Err(StartupError::AlreadyRunning);
        }
        if !ensure_granted(permission) {
            return Err(StartupError::PermissionDenied);
        }
        config.validate()?;
        camera.open(config).map_err(StartupError::CameraBind)?;

        let Some(classifier) = self.classifier.take() else {
            return Err(StartupError::AlreadyRunning);
        };
        let pipeline = Arc::new(
            DetectionPipeline::builder()
                .threshold(self.threshold)
                .start(classifier, self.ui.clone())?,
        );

        Session::spawn(camera, pipeline, config.frame_interval(), frame_limit)
    }
}

impl std::fmt::Debug for GestureApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureApp")
            .field("detector", &self.classifier.as_ref().map(|c| c.name().to_string()))
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Totals for a finished session.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct SessionSummary {
    /// Frames handed to the pipeline.
    pub delivered: u64,
    /// Failed captures.
    pub capture_errors: u64,
    /// Pipeline counters at shutdown.
    pub stats: StatsSnapshot,
}

#[derive(Debug, Default)]
struct CaptureTotals {
    delivered: u64,
    errors: u64,
}

/// A running camera loop feeding the pipeline.
pub struct Session {
    pipeline: Option<Arc<DetectionPipeline>>,
    stats: Arc<PipelineStats>,
    stop: Arc<AtomicBool>,
    capture: Option<JoinHandle<CaptureTotals>>,
}

impl Session {
    fn spawn<C>(
        camera: C,
        pipeline: Arc<DetectionPipeline>,
        interval: Duration,
        frame_limit: Option<u64>,
    ) -> Result<Self, StartupError>
    where
        C: Camera + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stats = pipeline.stats_handle();

        let loop_pipeline = Arc::clone(&pipeline);
        let loop_stop = Arc::clone(&stop);
        let capture = std::thread::Builder::new()
            .name("camera-frames".to_string())
            .spawn(move || frame_loop(camera, loop_pipeline, loop_stop, interval, frame_limit))
            .map_err(|e| StartupError::Pipeline(PipelineError::Spawn(e)))?;

        tracing::info!(?frame_limit, "Camera session started");
        Ok(Self {
            pipeline: Some(pipeline),
            stats,
            stop,
            capture: Some(capture),
        })
    }

    /// A handle that stops the frame loop when set.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// True once the frame loop has ended.
    pub fn is_finished(&self) -> bool {
        self.capture.as_ref().map_or(true, |h| h.is_finished())
    }

    /// True while a frame is in flight.
    pub fn is_busy(&self) -> bool {
        self.pipeline.as_ref().is_some_and(|p| p.is_busy())
    }

    /// Current pipeline counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shared pipeline counters.
    pub fn stats_handle(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Stops the camera, waits for the in-flight frame and shuts the
    /// worker down.
    pub fn stop(mut self) -> SessionSummary {
        self.stop.store(true, Ordering::Release);

        let totals = match self.capture.take().map(JoinHandle::join) {
            Some(Ok(totals)) => totals,
            Some(Err(_)) => {
                tracing::error!("Camera frame loop panicked");
                CaptureTotals::default()
            }
            None => CaptureTotals::default(),
        };

        // The frame loop held the only other reference.
        let stats = match self.pipeline.take().map(Arc::try_unwrap) {
            Some(Ok(pipeline)) => pipeline.shutdown(),
            Some(Err(shared)) => shared.stats(),
            None => self.stats.snapshot(),
        };

        let summary = SessionSummary {
            delivered: totals.delivered,
            capture_errors: totals.errors,
            stats,
        };
        tracing::info!(?summary, "Camera session stopped");
        summary
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("finished", &self.is_finished())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

/// The camera callback context: one frame at a time, never waiting on
/// the worker.
fn frame_loop<C: Camera>(
    mut camera: C,
    pipeline: Arc<DetectionPipeline>,
    stop: Arc<AtomicBool>,
    interval: Duration,
    frame_limit: Option<u64>,
) -> CaptureTotals {
    let mut totals = CaptureTotals::default();

    while !stop.load(Ordering::Acquire) && frame_limit.map_or(true, |n| totals.delivered < n) {
        let started = Instant::now();

        match camera.capture() {
            Ok(frame) => {
                totals.delivered += 1;
                let _ = pipeline.on_frame(frame);
            }
            Err(e) => {
                totals.errors += 1;
                tracing::warn!(error = %e, "Frame capture failed");
            }
        }

        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    camera.close();
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockCamera;
    use crate::classifier::ConfidenceScore;
    use crate::dispatch::{ui_queue, LaunchMode, Notice, NoticeSink, OpenUrl};
    use crate::permission::{PermissionStatus, StaticPermission};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Collect(Rc<RefCell<Vec<Notice>>>);

    impl NoticeSink for Collect {
        fn show(&mut self, notice: &Notice) {
            self.0.borrow_mut().push(notice.clone());
        }
    }

    fn small() -> CaptureConfig {
        let mut config = CaptureConfig::with_dimensions(32, 24);
        config.fps = 120;
        config
    }

    #[test]
    fn test_permission_denied_is_notified_and_retryable() {
        let notices = Collect::default();
        let (ui, mut executor) = ui_queue(
            Box::new(OpenUrl::destination(LaunchMode::DryRun)),
            Box::new(notices.clone()),
        );
        let mut app = GestureApp::new(Detector::Stub, ui).unwrap();

        let mut denied = StaticPermission::prompt(PermissionStatus::Denied);
        let err = app
            .start(MockCamera::new(), &small(), &mut denied, Some(1))
            .unwrap_err();
        assert!(matches!(err, StartupError::PermissionDenied));
        assert!(app.is_idle());

        executor.run_pending();
        assert_eq!(notices.0.borrow()[0].message, "camera permission required");

        let session = app
            .start(MockCamera::new(), &small(), &mut StaticPermission::granted(), Some(2))
            .unwrap();
        assert!(!app.is_idle());
        let summary = session.stop();
        assert!(summary.delivered <= 2);
    }

    #[test]
    fn test_camera_bind_failure_is_notified() {
        let notices = Collect::default();
        let (ui, mut executor) = ui_queue(
            Box::new(OpenUrl::destination(LaunchMode::DryRun)),
            Box::new(notices.clone()),
        );
        let mut app = GestureApp::new(Detector::Stub, ui).unwrap();

        let err = app
            .start(
                MockCamera::unavailable("busy"),
                &small(),
                &mut StaticPermission::granted(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, StartupError::CameraBind(_)));
        assert!(app.is_idle());

        executor.run_pending();
        assert!(notices.0.borrow()[0].message.starts_with("unable to start the camera"));
    }

    #[test]
    fn test_missing_model_fails_at_construction() {
        let notices = Collect::default();
        let (ui, mut executor) = ui_queue(
            Box::new(OpenUrl::destination(LaunchMode::DryRun)),
            Box::new(notices.clone()),
        );

        let err = GestureApp::new(
            Detector::Model(ModelSource::bundled("/nonexistent/gesture-launch")),
            ui,
        )
        .unwrap_err();
        assert!(matches!(err, StartupError::ModelLoad(ModelLoadError::NotFound(_))));

        executor.run_pending();
        assert_eq!(notices.0.borrow().len(), 1);
    }

    #[test]
    fn test_second_start_rejected() {
        let (ui, _executor) = ui_queue(
            Box::new(OpenUrl::destination(LaunchMode::DryRun)),
            Box::new(Collect::default()),
        );
        let mut app = GestureApp::new(Detector::Stub, ui).unwrap();
        let session = app
            .start(MockCamera::new(), &small(), &mut StaticPermission::granted(), Some(1))
            .unwrap();

        let err = app
            .start(MockCamera::new(), &small(), &mut StaticPermission::granted(), Some(1))
            .unwrap_err();
        assert!(matches!(err, StartupError::AlreadyRunning));
        session.stop();
    }

    #[test]
    fn test_session_returns_every_buffer() {
        let (ui, mut executor) = ui_queue(
            Box::new(OpenUrl::destination(LaunchMode::DryRun)),
            Box::new(Collect::default()),
        );
        let detector =
            Detector::Constant(ConstantClassifier::new(ConfidenceScore::new(0.9).unwrap()));
        let mut app = GestureApp::new(detector, ui).unwrap();

        let camera = MockCamera::new();
        let ledger = camera.ledger();
        let session = app
            .start(camera, &small(), &mut StaticPermission::granted(), Some(10))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !session.is_finished() && Instant::now() < deadline {
            executor.run_for(Duration::from_millis(10));
        }
        let summary = session.stop();
        executor.run_pending();

        assert_eq!(summary.delivered, 10);
        assert_eq!(summary.stats.received, 10);
        assert_eq!(summary.stats.admitted + summary.stats.dropped, 10);
        assert_eq!(summary.stats.matched, summary.stats.admitted);
        assert_eq!(executor.dispatched(), summary.stats.matched);
        assert_eq!(ledger.issued(), 10);
        assert_eq!(ledger.outstanding(), 0);
    }
}
