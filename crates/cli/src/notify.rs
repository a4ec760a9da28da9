//! Converter notifications printed as status lines.

use crate::output::Status;
use snapconvert_converter::notify::{Level, Notifier};

/// Prints every notification with [`Status`]
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusNotifier {
    /// Suppress success and info lines
    pub quiet: bool,
}

impl Notifier for StatusNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Success if !self.quiet => Status::success(message),
            Level::Info if !self.quiet => Status::info(message),
            Level::Warning => Status::warning(message),
            Level::Error => Status::error(message),
            Level::Success | Level::Info => {}
        }
    }
}
