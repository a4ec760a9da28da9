//! Batch image conversion for snapconvert
//!
//! A [`ConverterSession`] takes source images, converts them in batches to
//! one output format, lets the user resize or rename the results, and hands
//! them back as single downloads or one zip archive.
//!
//! # Example
//!
//! ```rust
//! use snapconvert_converter::{ConverterSession, MemoryNotifier, SessionConfig, SourceFile};
//!
//! let notifier = MemoryNotifier::new();
//! let mut session = ConverterSession::new(SessionConfig::default()).with_notifier(notifier.clone());
//!
//! let report = session.add_files(vec![SourceFile::from_bytes("notes.txt", b"hello".to_vec())]);
//! assert_eq!(report.rejected.len(), 1);
//! assert!(session.sources().is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod batch;
pub mod blob;
pub mod dialog;
pub mod error;
pub mod naming;
pub mod notify;
pub mod params;
pub mod session;
pub mod source;

pub use archive::{ArchiveReport, SkippedEntry};
pub use batch::{BatchConversion, BatchItem, BatchProgress};
pub use blob::{BlobRef, BlobStore};
pub use dialog::{DialogKey, ResizeDialog};
pub use error::{ConverterError, Result};
pub use notify::{Level, MemoryNotifier, Notification, Notifier, TracingNotifier};
pub use params::ConversionParameters;
pub use session::{
    AddReport, BatchSummary, ConvertedFile, ConverterSession, Download, FileState, SessionConfig, SourceEntry,
};
pub use source::SourceFile;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::dialog::{DialogKey, ResizeDialog};
    pub use crate::error::{ConverterError, Result};
    pub use crate::notify::{Level, Notifier};
    pub use crate::params::ConversionParameters;
    pub use crate::session::{ConverterSession, Download, SessionConfig};
    pub use crate::source::SourceFile;
    pub use snapconvert_image::OutputFormat;
}
