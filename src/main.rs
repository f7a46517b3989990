//! Gesture Launch CLI
//!
//! Runs the detection pipeline against a camera and opens the destination
//! when the gesture is confirmed.

use clap::Parser;
use gesture_launch::{
    app::{Detector, GestureApp, SessionSummary},
    capture::{FileConfig, MockCamera},
    classifier::{ConfidenceScore, ConstantClassifier, ModelSource},
    dispatch::{ui_queue, ConsoleNotices, LaunchMode, OpenUrl, UiExecutor},
    metrics::{MetricsRegistry, MetricsSnapshot},
    permission::{PermissionStatus, StaticPermission},
    Session,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Open a destination when the "C" hand gesture is seen by the camera.
#[derive(Debug, Parser)]
#[command(name = "gesture-launch", version, about)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the bundled model.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Use the stub detector that never reports the gesture.
    #[arg(long)]
    stub: bool,

    /// Replace the model with a fixed score (for demos without a model).
    #[arg(long, value_name = "SCORE")]
    fixed_score: Option<f32>,

    /// Simulated inference time for --fixed-score, in milliseconds.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Number of frames to deliver (0 runs until interrupted).
    #[arg(short = 'n', long)]
    frames: Option<u32>,

    /// Answer "deny" to the camera permission prompt.
    #[arg(long)]
    deny_camera: bool,

    /// Log the launch instead of opening the destination.
    #[arg(long)]
    dry_run: bool,

    /// Keep running after the destination has been opened.
    #[arg(long)]
    keep_running: bool,

    /// Serve Prometheus metrics on this port (needs the `metrics` feature).
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Print the final Prometheus counters on exit when they are not served.
    #[arg(long)]
    print_metrics: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Gesture Launch v{}", gesture_launch::VERSION);

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => FileConfig::default(),
    };
    apply_overrides(&mut config, &args);

    let detector = match select_detector(&config, &args) {
        Ok(detector) => detector,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::Release)) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    let mode = if config.output.dry_run {
        LaunchMode::DryRun
    } else {
        LaunchMode::System
    };
    let (ui, mut executor) = ui_queue(
        Box::new(OpenUrl::destination(mode)),
        Box::new(ConsoleNotices),
    );

    let mut app = match GestureApp::new(detector, ui) {
        Ok(app) => app,
        Err(_) => {
            executor.run_pending();
            std::process::exit(1);
        }
    };

    let mut permission = if args.deny_camera {
        StaticPermission::prompt(PermissionStatus::Denied)
    } else {
        StaticPermission::granted()
    };
    let frame_limit = (!config.output.continuous).then_some(config.output.frame_count as u64);

    info!(facing = ?config.capture.facing, "Starting camera (mock input)");
    let session = match app.start(
        MockCamera::new(),
        &config.capture,
        &mut permission,
        frame_limit,
    ) {
        Ok(session) => session,
        Err(_) => {
            executor.run_pending();
            std::process::exit(1);
        }
    };

    let metrics = start_metrics(&config, args.print_metrics);

    let summary = run_ui_loop(&mut executor, session, &interrupted, &config, metrics.as_ref());
    report(&summary, &executor);

    if let Some(metrics) = &metrics {
        metrics.update(&MetricsSnapshot {
            pipeline: summary.stats,
            busy: false,
            dispatched: executor.dispatched(),
            dispatch_failures: executor.failed(),
        });
        if let Some(exposition) = metrics.exposition() {
            print!("{}", exposition);
        }
    }
}

fn apply_overrides(config: &mut FileConfig, args: &Args) {
    if let Some(dir) = &args.assets {
        config.detector.asset_dir = dir.clone();
    }
    if args.stub {
        config.detector.stub = true;
    }
    if let Some(frames) = args.frames {
        config.output.continuous = frames == 0;
        config.output.frame_count = frames;
    }
    if args.dry_run {
        config.output.dry_run = true;
    }
    if args.keep_running {
        config.output.exit_after_launch = false;
    }
    if let Some(port) = args.metrics_port {
        config.output.metrics_port = port;
    }
}

fn select_detector(config: &FileConfig, args: &Args) -> Result<Detector, String> {
    if let Some(score) = args.fixed_score {
        let score = ConfidenceScore::new(score).map_err(|e| format!("--fixed-score: {}", e))?;
        let classifier =
            ConstantClassifier::new(score).with_latency(Duration::from_millis(args.latency_ms));
        return Ok(Detector::Constant(classifier));
    }
    if config.detector.stub {
        return Ok(Detector::Stub);
    }
    Ok(Detector::Model(ModelSource::bundled(&config.detector.asset_dir)))
}

/// Pumps UI events on the main thread until the session ends.
fn run_ui_loop(
    executor: &mut UiExecutor,
    session: Session,
    interrupted: &AtomicBool,
    config: &FileConfig,
    metrics: Option<&MetricsSink>,
) -> SessionSummary {
    loop {
        executor.run_for(Duration::from_millis(50));

        if let Some(metrics) = metrics {
            metrics.update(&MetricsSnapshot {
                pipeline: session.stats(),
                busy: session.is_busy(),
                dispatched: executor.dispatched(),
                dispatch_failures: executor.failed(),
            });
        }

        if interrupted.load(Ordering::Acquire) {
            info!("Interrupted, shutting down");
            break;
        }
        if config.output.exit_after_launch && executor.dispatched() > 0 {
            info!("Destination opened, stopping camera");
            break;
        }
        if session.is_finished() {
            break;
        }
    }

    let summary = session.stop();
    executor.run_pending();
    summary
}

fn report(summary: &SessionSummary, executor: &UiExecutor) {
    let stats = &summary.stats;
    info!(
        "Delivered {} frames: {} admitted, {} dropped, {} matched, {} below threshold, {} undecodable, {} inference errors",
        summary.delivered,
        stats.admitted,
        stats.dropped,
        stats.matched,
        stats.below_threshold,
        stats.encode_errors,
        stats.classifier_errors
    );
    info!(
        "Actions: {} performed, {} failed",
        executor.dispatched(),
        executor.failed()
    );
}

/// Destination for periodic metric snapshots.
enum MetricsSink {
    /// Kept in-process and printed on exit.
    Local(MetricsRegistry),
    #[cfg(feature = "metrics")]
    Served {
        state: Arc<tokio::sync::RwLock<gesture_launch::metrics::MetricsState>>,
        _runtime: tokio::runtime::Runtime,
    },
}

impl MetricsSink {
    fn update(&self, snapshot: &MetricsSnapshot) {
        match self {
            Self::Local(registry) => registry.update(snapshot),
            #[cfg(feature = "metrics")]
            Self::Served { state, .. } => state.blocking_write().update(snapshot),
        }
    }

    /// Text exposition of a local registry.
    fn exposition(&self) -> Option<String> {
        match self {
            Self::Local(registry) => registry
                .encode()
                .map_err(|e| warn!("Failed to encode metrics: {}", e))
                .ok(),
            #[cfg(feature = "metrics")]
            Self::Served { .. } => None,
        }
    }
}

fn new_registry() -> Option<MetricsRegistry> {
    match MetricsRegistry::new() {
        Ok(registry) => Some(registry),
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    }
}

fn local_metrics(print_metrics: bool) -> Option<MetricsSink> {
    if !print_metrics {
        return None;
    }
    new_registry().map(MetricsSink::Local)
}

#[cfg(feature = "metrics")]
fn start_metrics(config: &FileConfig, print_metrics: bool) -> Option<MetricsSink> {
    use gesture_launch::metrics::{MetricsServer, MetricsServerConfig};

    if config.output.metrics_port == 0 {
        return local_metrics(print_metrics);
    }
    let registry = new_registry()?;

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            warn!("Metrics server disabled: {}", e);
            return None;
        }
    };
    let server = MetricsServer::new(
        MetricsServerConfig::with_port(config.output.metrics_port),
        registry,
    );
    let state = server.state();
    runtime.spawn(async move {
        if let Err(e) = server.run().await {
            warn!("Metrics server stopped: {}", e);
        }
    });

    Some(MetricsSink::Served {
        state,
        _runtime: runtime,
    })
}

#[cfg(not(feature = "metrics"))]
fn start_metrics(config: &FileConfig, print_metrics: bool) -> Option<MetricsSink> {
    if config.output.metrics_port != 0 {
        warn!("Built without the `metrics` feature; metrics port ignored");
    }
    local_metrics(print_metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_registry_unless_consumed() {
        let config = FileConfig::default();
        assert!(start_metrics(&config, false).is_none());
    }

    #[test]
    fn test_printed_metrics_hold_final_counters() {
        let metrics = start_metrics(&FileConfig::default(), true).unwrap();

        let mut snapshot = MetricsSnapshot::default();
        snapshot.pipeline.received = 12;
        snapshot.dispatched = 1;
        metrics.update(&snapshot);

        let exposition = metrics.exposition().unwrap();
        assert!(exposition.contains("gesture_frames_received_total 12"));
        assert!(exposition.contains("gesture_dispatches_total 1"));
    }
}
