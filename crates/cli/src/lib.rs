//! Terminal helpers for the snapconvert CLI
//!
//! - Status lines and size/duration formatting
//! - Progress bars for batch conversion
//! - A [`notify::StatusNotifier`] printing converter notifications

#![warn(missing_docs)]

pub mod notify;
pub mod output;
pub mod progress;
