//! Side effects performed on gesture confirmation.

use super::GestureConfirmed;
use std::process::Command;
use thiserror::Error;

/// Destination opened when the gesture is confirmed.
pub const DESTINATION_URL: &str = "https://chatunity.it";

/// Errors raised while performing an action.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The URL is not an absolute http(s) URL.
    #[error("not an http(s) URL: {0}")]
    InvalidUrl(String),

    /// The platform opener failed.
    #[error("failed to open {url}: {source}")]
    Launch {
        /// URL being opened.
        url: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Something the UI context does when a gesture is confirmed.
///
/// Implementations are driven only by [`UiExecutor`](super::UiExecutor)
/// and need not be `Send`.
pub trait Action {
    /// Performs the side effect for one confirmation.
    fn perform(&mut self, event: &GestureConfirmed) -> Result<(), DispatchError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// How [`OpenUrl`] reaches the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Hand the URL to the desktop's default viewer.
    System,
    /// Only log what would have been opened.
    DryRun,
}

/// Opens a fixed URL in the default external viewer.
#[derive(Debug, Clone)]
pub struct OpenUrl {
    url: String,
    mode: LaunchMode,
}

impl OpenUrl {
    /// Validates the destination up front.
    pub fn new(url: impl Into<String>, mode: LaunchMode) -> Result<Self, DispatchError> {
        let url = url.into();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(DispatchError::InvalidUrl(url));
        }
        Ok(Self { url, mode })
    }

    /// Opens [`DESTINATION_URL`].
    pub fn destination(mode: LaunchMode) -> Self {
        Self {
            url: DESTINATION_URL.to_string(),
            mode,
        }
    }

    /// Returns the destination.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn launcher(&self) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(&self.url);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(&self.url);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(&self.url);
            cmd
        }
    }
}

impl Action for OpenUrl {
    fn perform(&mut self, event: &GestureConfirmed) -> Result<(), DispatchError> {
        match self.mode {
            LaunchMode::DryRun => {
                tracing::info!(
                    url = %self.url,
                    sequence = event.sequence,
                    score = %event.score,
                    "Would open destination (dry run)"
                );
            }
            LaunchMode::System => {
                // The viewer outlives us; no need to wait on it.
                self.launcher()
                    .spawn()
                    .map_err(|source| DispatchError::Launch {
                        url: self.url.clone(),
                        source,
                    })?;
                tracing::info!(
                    url = %self.url,
                    sequence = event.sequence,
                    score = %event.score,
                    "Opened destination"
                );
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("open {}", self.url)
    }
}
