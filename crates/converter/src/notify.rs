//! User-facing notifications.
//!
//! The session reports outcomes (intake rejections, batch summaries,
//! memory warnings) through a [`Notifier`]; how they are shown is up to the
//! embedder.

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
    /// Operation partially succeeded or needs attention
    Warning,
    /// Neutral information
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
        };
        f.write_str(s)
    }
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Severity
    pub level: Level,
    /// Message text
    pub message: String,
}

/// Sink for user-facing messages
pub trait Notifier {
    /// Deliver one message
    fn notify(&self, level: Level, message: &str);

    /// Report a success
    fn success(&self, message: &str) {
        self.notify(Level::Success, message);
    }

    /// Report an error
    fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }

    /// Report a warning
    fn warning(&self, message: &str) {
        self.notify(Level::Warning, message);
    }

    /// Report neutral information
    fn info(&self, message: &str) {
        self.notify(Level::Info, message);
    }
}

/// Forwards notifications to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Success | Level::Info => tracing::info!(%level, "{message}"),
            Level::Warning => tracing::warn!("{message}"),
            Level::Error => tracing::error!("{message}"),
        }
    }
}

/// Records notifications in memory.
///
/// Clones share one log, so a clone kept by the caller sees everything the
/// session reports.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    log: Rc<RefCell<Vec<Notification>>>,
}

impl MemoryNotifier {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn notifications(&self) -> Vec<Notification> {
        self.log.borrow().clone()
    }

    /// Most recent notification
    pub fn last(&self) -> Option<Notification> {
        self.log.borrow().last().cloned()
    }

    /// Drop the recorded log
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, level: Level, message: &str) {
        self.log.borrow_mut().push(Notification {
            level,
            message: message.to_string(),
        });
    }
}
