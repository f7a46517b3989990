//! User-visible notices.

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Informational.
    Info,
    /// Something went wrong.
    Error,
}

/// A short message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    /// An informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    /// An error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where notices end up.
pub trait NoticeSink {
    /// Displays a notice.
    fn show(&mut self, notice: &Notice);
}

/// Writes notices to stderr and the log.
#[derive(Debug, Default)]
pub struct ConsoleNotices;

impl NoticeSink for ConsoleNotices {
    fn show(&mut self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Info => tracing::info!(notice = %notice, "Notice"),
            NoticeKind::Error => tracing::warn!(notice = %notice, "Notice"),
        }
        eprintln!("{}", notice);
    }
}
