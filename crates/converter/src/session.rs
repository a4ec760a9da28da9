//! Converter session: intake, batch conversion, edits and downloads.
//!
//! A session holds the source list, the converted list and the blob store
//! behind it. Each source moves through
//! `Pending -> Converting -> Converted | Errored`. Per-file failures are
//! recorded on the file and summarized through the [`Notifier`]; no
//! operation leaves the session in a half-updated state.

use crate::archive::{ArchiveReport, build_archive};
use crate::batch::{BatchConversion, BatchItem, BatchProgress};
use crate::blob::{BlobRef, BlobStore};
use crate::error::{ConverterError, Result};
use crate::naming::{DEFAULT_ARCHIVE_BASE, archive_name, download_name, entry_name, with_format_extension};
use crate::notify::{Notifier, TracingNotifier};
use crate::params::ConversionParameters;
use crate::source::SourceFile;
use serde::Serialize;
use snapconvert_core::config::ConfigSchema;
use snapconvert_core::memory::{DEFAULT_MEMORY_BUDGET, PendingImage, estimate_batch};
use snapconvert_core::rate_limit::{RateLimitConfig, SlidingWindowLimiter};
use snapconvert_core::validation::{FileLimits, sanitize_file_name, validate_file};
use snapconvert_core::ErrorCode;
use snapconvert_image::{
    EncodedImage, ImageFormat, OutputFormat, ResizeOptions, detect_format, extract_metadata, resize_image,
};
use snapconvert_telemetry::{Timer, metrics, names};
use std::path::{Path, PathBuf};
use tracing::instrument;
use uuid::Uuid;

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Domain tag appended to download names
    pub domain: String,
    /// Archive base name when none is given
    pub archive_base_name: String,
    /// Intake limits
    pub file_limits: FileLimits,
    /// Conversion rate limit
    pub rate_limit: RateLimitConfig,
    /// Budget for the memory-pressure warning, in bytes
    pub memory_budget: u64,
    /// Initial conversion parameters
    pub parameters: ConversionParameters,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            archive_base_name: DEFAULT_ARCHIVE_BASE.to_string(),
            file_limits: FileLimits::default(),
            rate_limit: RateLimitConfig::default(),
            memory_budget: DEFAULT_MEMORY_BUDGET,
            parameters: ConversionParameters::default(),
        }
    }
}

impl SessionConfig {
    /// Settings from a loaded config file
    pub fn from_schema(schema: &ConfigSchema) -> Result<Self> {
        Ok(Self {
            domain: schema.general.domain.clone(),
            archive_base_name: schema.general.archive_base_name.clone(),
            file_limits: schema.limits.file_limits(),
            rate_limit: schema.limits.rate_limit(),
            memory_budget: schema.limits.memory_budget_bytes(),
            parameters: ConversionParameters::from_config(&schema.conversion)?,
        })
    }
}

/// Conversion state of one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum FileState {
    /// Added, not yet converted
    Pending,
    /// Part of the running batch
    Converting,
    /// Converted at least once
    Converted,
    /// Last conversion failed
    Errored(String),
}

/// A source and its state
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// The source file
    pub file: SourceFile,
    /// Current state
    pub state: FileState,
}

/// A successfully converted file
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedFile {
    /// Session-unique id
    pub id: String,
    /// Source this came from
    pub source_id: String,
    /// Output name, extension matching `converted_format`
    pub name: String,
    /// Reference to the encoded bytes
    #[serde(skip)]
    pub blob: BlobRef,
    /// Detected source format
    pub original_format: Option<ImageFormat>,
    /// Output format
    pub converted_format: OutputFormat,
    /// Source size in bytes
    pub original_size: u64,
    /// Output size in bytes
    pub converted_size: u64,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Quality used
    pub quality: u8,
    /// Compression level used, if enabled
    pub compression_level: Option<u8>,
    /// Renamed by the user
    pub renamed: bool,
}

impl ConvertedFile {
    /// Size change relative to the source, in percent (negative = smaller)
    pub fn size_change_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (self.converted_size as f64 - self.original_size as f64) / self.original_size as f64 * 100.0
    }
}

/// A file ready to be saved
#[derive(Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name
    pub file_name: String,
    /// MIME type of `bytes`
    pub mime: &'static str,
    /// File contents
    pub bytes: Vec<u8>,
}

impl Download {
    /// Write into `dir` under [`Download::file_name`]
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Result of [`ConverterSession::add_files`]
#[derive(Debug, Default)]
pub struct AddReport {
    /// Ids of accepted sources
    pub accepted: Vec<String>,
    /// Rejected files
    pub rejected: Vec<ConverterError>,
}

/// Counts from one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Files in the batch
    pub total: usize,
    /// Files converted
    pub succeeded: usize,
    /// Files that failed
    pub failed: usize,
    /// Target format
    pub format: OutputFormat,
}

impl BatchSummary {
    /// Summary line shown to the user
    pub fn message(&self) -> String {
        if self.total == 0 {
            "No files to convert".to_string()
        } else if self.failed == 0 {
            format!("Converted {} of {} files to {}", self.succeeded, self.total, self.format)
        } else if self.succeeded == 0 {
            format!("Failed to convert {} files", self.failed)
        } else {
            format!(
                "Converted {} of {} files, {} failed",
                self.succeeded, self.total, self.failed
            )
        }
    }

    /// True when every file converted
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// The converter's in-memory state
pub struct ConverterSession {
    config: SessionConfig,
    parameters: ConversionParameters,
    sources: Vec<SourceEntry>,
    converted: Vec<ConvertedFile>,
    blobs: BlobStore,
    limiter: SlidingWindowLimiter,
    notifier: Box<dyn Notifier>,
    progress: u8,
}

impl ConverterSession {
    /// Create a session that reports through tracing
    pub fn new(config: SessionConfig) -> Self {
        Self {
            parameters: config.parameters.clamped(),
            limiter: SlidingWindowLimiter::new(config.rate_limit),
            config,
            sources: Vec::new(),
            converted: Vec::new(),
            blobs: BlobStore::new(),
            notifier: Box::new(TracingNotifier),
            progress: 0,
        }
    }

    /// Replace the notifier
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Replace the (empty) blob store, e.g. to install a release hook
    #[must_use]
    pub fn with_blob_store(mut self, blobs: BlobStore) -> Self {
        self.blobs = blobs;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current conversion parameters
    pub fn parameters(&self) -> ConversionParameters {
        self.parameters
    }

    /// Change the conversion parameters for later batches
    pub fn set_parameters(&mut self, parameters: ConversionParameters) {
        self.parameters = parameters.clamped();
    }

    /// Domain tag used in download names
    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    /// Change the domain tag
    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.config.domain = domain.into();
    }

    /// Sources in intake order
    pub fn sources(&self) -> &[SourceEntry] {
        &self.sources
    }

    /// State of one source
    pub fn state(&self, source_id: &str) -> Option<&FileState> {
        self.sources
            .iter()
            .find(|s| s.file.id() == source_id)
            .map(|s| &s.state)
    }

    /// Converted files in creation order
    pub fn converted(&self) -> &[ConvertedFile] {
        &self.converted
    }

    /// Look up a converted file
    pub fn converted_file(&self, converted_id: &str) -> Option<&ConvertedFile> {
        self.converted.iter().find(|c| c.id == converted_id)
    }

    /// `(source name, reason)` for every errored source
    pub fn errors(&self) -> Vec<(&str, &str)> {
        self.sources
            .iter()
            .filter_map(|s| match &s.state {
                FileState::Errored(reason) => Some((s.file.name.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Completion of the current or last batch, 0-100
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Blob store backing the converted files
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Bytes behind a converted file
    pub fn converted_bytes(&self, converted_id: &str) -> Result<&[u8]> {
        let file = self
            .converted_file(converted_id)
            .ok_or_else(|| ConverterError::UnknownConverted(converted_id.to_string()))?;
        self.blobs.fetch(file.blob)
    }

    // -------------------------------------------------------------------------
    // Intake
    // -------------------------------------------------------------------------

    /// Validate and queue files. Rejected files are reported in one
    /// notification and not added.
    pub fn add_files(&mut self, files: Vec<SourceFile>) -> AddReport {
        let mut report = AddReport::default();

        for mut file in files {
            let check = validate_file(&file.name, &file.mime, file.size(), &self.config.file_limits);

            if !check.is_accepted() {
                let reason = check.reason().unwrap_or("Rejected").to_string();
                tracing::debug!(file = %file.name, %reason, "Rejected file");
                report.rejected.push(ConverterError::Validation {
                    name: file.name,
                    reason,
                    code: check.error_code().unwrap_or(ErrorCode::ValidationError),
                });
                continue;
            }

            for warning in check.result.warnings() {
                tracing::debug!(file = %file.name, code = %warning.code, "{}", warning.message);
            }

            file.name = check.sanitized_name;
            report.accepted.push(file.id().to_string());
            self.sources.push(SourceEntry {
                file,
                state: FileState::Pending,
            });
        }

        if let Some(message) = rejection_message(&report.rejected) {
            self.notifier.error(&message);
        }

        report
    }

    /// Drop a source. Its converted outputs stay.
    pub fn remove_source(&mut self, source_id: &str) -> Result<SourceFile> {
        let index = self.source_index(source_id)?;
        Ok(self.sources.remove(index).file)
    }

    // -------------------------------------------------------------------------
    // Conversion
    // -------------------------------------------------------------------------

    /// Convert pending and converted sources, plus errored ones when
    /// `retry_failed` is set.
    pub fn convert_all(&mut self, retry_failed: bool) -> BatchSummary {
        self.convert_all_with_progress(retry_failed, |_| {})
    }

    /// [`ConverterSession::convert_all`], reporting progress after each file
    #[instrument(skip(self, on_progress), fields(format = %self.parameters.format))]
    pub fn convert_all_with_progress<F>(&mut self, retry_failed: bool, mut on_progress: F) -> BatchSummary
    where
        F: FnMut(BatchProgress),
    {
        let queue: Vec<SourceFile> = self
            .sources
            .iter_mut()
            .filter(|s| match s.state {
                FileState::Errored(_) => retry_failed,
                FileState::Pending | FileState::Converted | FileState::Converting => true,
            })
            .map(|s| {
                s.state = FileState::Converting;
                s.file.clone()
            })
            .collect();

        let format = self.parameters.format;
        if queue.is_empty() {
            let summary = BatchSummary {
                total: 0,
                succeeded: 0,
                failed: 0,
                format,
            };
            self.notifier.info(&summary.message());
            return summary;
        }

        self.warn_on_memory_pressure(&queue);
        self.progress = 0;

        let options = self.parameters.to_convert_options();
        let mut summary = BatchSummary {
            total: queue.len(),
            succeeded: 0,
            failed: 0,
            format,
        };

        for item in BatchConversion::new(queue, options, &mut self.limiter) {
            let progress = BatchProgress::from(&item);
            self.progress = progress.percent;

            if record_item(
                item,
                &self.parameters,
                &mut self.sources,
                &mut self.converted,
                &mut self.blobs,
            )
            .is_ok()
            {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            on_progress(progress);
        }

        metrics().gauge(names::HELD_BYTES, self.blobs.live_bytes());
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch finished"
        );

        let message = summary.message();
        if summary.failed == 0 {
            self.notifier.success(&message);
        } else if summary.succeeded == 0 {
            self.notifier.error(&message);
        } else {
            self.notifier.warning(&message);
        }

        summary
    }

    /// Convert one source again, whatever its state
    #[instrument(skip(self))]
    pub fn retry(&mut self, source_id: &str) -> Result<&ConvertedFile> {
        let index = self.source_index(source_id)?;
        let entry = &mut self.sources[index];
        entry.state = FileState::Converting;
        let file = entry.file.clone();
        let name = file.name.clone();

        let options = self.parameters.to_convert_options();
        let outcome = match BatchConversion::new(vec![file], options, &mut self.limiter).next() {
            Some(item) => record_item(
                item,
                &self.parameters,
                &mut self.sources,
                &mut self.converted,
                &mut self.blobs,
            ),
            None => Err(ConverterError::UnknownSource(source_id.to_string())),
        };

        match outcome {
            Ok(()) => {
                self.notifier
                    .success(&format!("Converted {name} to {}", self.parameters.format));
                self.converted
                    .last()
                    .ok_or_else(|| ConverterError::UnknownSource(source_id.to_string()))
            }
            Err(e) => {
                self.notifier.error(&format!("Failed to convert {name}: {e}"));
                Err(e)
            }
        }
    }

    fn warn_on_memory_pressure(&self, queue: &[SourceFile]) {
        let pending: Vec<PendingImage> = queue
            .iter()
            .map(|file| PendingImage {
                encoded_bytes: file.size(),
                dimensions: extract_metadata(file.bytes()).map(|m| (m.width, m.height)),
            })
            .collect();

        let estimate = estimate_batch(&pending, self.blobs.live_bytes(), self.config.memory_budget);
        tracing::debug!(
            peak_bytes = estimate.peak_bytes,
            budget_bytes = estimate.budget_bytes,
            uncertain = estimate.uncertain,
            "Memory estimate"
        );
        if let Some(warning) = estimate.warning() {
            self.notifier.warning(&warning);
        }
    }

    // -------------------------------------------------------------------------
    // Converted file edits
    // -------------------------------------------------------------------------

    /// Give a converted file a new name.
    ///
    /// The name is sanitized and its extension forced to the converted
    /// format. The bytes move to a fresh blob reference and the old one is
    /// released.
    pub fn rename(&mut self, converted_id: &str, new_name: &str) -> Result<&ConvertedFile> {
        let index = self.converted_index(converted_id)?;
        let name = with_format_extension(
            &sanitize_file_name(new_name),
            self.converted[index].converted_format,
        );

        let old = self.converted[index].blob;
        let bytes = self.blobs.fetch(old)?.to_vec();
        let blob = self.blobs.create(bytes);
        self.blobs.release(old);

        let file = &mut self.converted[index];
        tracing::debug!(from = %file.name, to = %name, "Renamed converted file");
        file.name = name;
        file.blob = blob;
        file.renamed = true;
        Ok(&*file)
    }

    /// Resize a converted file in place.
    ///
    /// Uses the file's converted format and quality. On failure the file is
    /// left exactly as it was.
    #[instrument(skip(self))]
    pub fn resize_converted(&mut self, converted_id: &str, width: u32, height: u32) -> Result<&ConvertedFile> {
        let index = self.converted_index(converted_id)?;
        let file = &self.converted[index];
        let options = ResizeOptions {
            width,
            height,
            format: file.converted_format,
            quality: file.quality,
            compression_level: file.compression_level,
        };

        let resized = {
            let _timer = Timer::start(names::RESIZE_MS);
            resize_image(self.blobs.fetch(file.blob)?, &options)?
        };

        let old = file.blob;
        let converted_size = resized.bytes.len() as u64;
        let blob = self.blobs.create(resized.bytes);
        self.blobs.release(old);

        let file = &mut self.converted[index];
        file.blob = blob;
        file.converted_size = converted_size;
        file.width = resized.width;
        file.height = resized.height;
        tracing::debug!(file = %file.name, width, height, "Resized converted file");
        Ok(&*file)
    }

    /// Remove one converted file and release its bytes
    pub fn remove_converted(&mut self, converted_id: &str) -> Result<ConvertedFile> {
        let index = self.converted_index(converted_id)?;
        let file = self.converted.remove(index);
        self.blobs.release(file.blob);
        Ok(file)
    }

    /// Remove every converted file
    pub fn clear_converted(&mut self) {
        for file in self.converted.drain(..) {
            self.blobs.release(file.blob);
        }
        metrics().gauge(names::HELD_BYTES, self.blobs.live_bytes());
    }

    /// Remove all sources and converted files
    pub fn clear(&mut self) {
        self.clear_converted();
        self.sources.clear();
        self.progress = 0;
    }

    // -------------------------------------------------------------------------
    // Downloads
    // -------------------------------------------------------------------------

    /// One converted file, named `<base>-<domain>.<ext>`
    pub fn download(&self, converted_id: &str) -> Result<Download> {
        let file = self
            .converted_file(converted_id)
            .ok_or_else(|| ConverterError::UnknownConverted(converted_id.to_string()))?;

        Ok(Download {
            file_name: download_name(&file.name, &self.config.domain, file.converted_format),
            mime: file.converted_format.mime_type(),
            bytes: self.blobs.fetch(file.blob)?.to_vec(),
        })
    }

    /// All converted files as one zip.
    ///
    /// `zip_base` falls back to the configured archive base name.
    #[instrument(skip(self))]
    pub fn download_all(&self, zip_base: Option<&str>) -> Result<(Download, ArchiveReport)> {
        if self.converted.is_empty() {
            return Err(ConverterError::archive("No converted files to download"));
        }

        let domain = &self.config.domain;
        let entries = self
            .converted
            .iter()
            .map(|f| (entry_name(&f.name, domain, f.converted_format), f.blob));

        let (bytes, report) = {
            let _timer = Timer::start(names::ARCHIVE_MS);
            build_archive(&self.blobs, entries)?
        };

        if !report.skipped.is_empty() {
            self.notifier.warning(&format!(
                "{} of {} files could not be added to the archive",
                report.skipped.len(),
                self.converted.len()
            ));
        }

        metrics().increment_by(names::ARCHIVE_ENTRIES, report.included.len() as u64);

        let base = zip_base.unwrap_or(&self.config.archive_base_name);
        let download = Download {
            file_name: archive_name(base, domain),
            mime: "application/zip",
            bytes,
        };
        tracing::info!(archive = %download.file_name, entries = report.included.len(), "Archive ready");
        Ok((download, report))
    }

    fn source_index(&self, source_id: &str) -> Result<usize> {
        self.sources
            .iter()
            .position(|s| s.file.id() == source_id)
            .ok_or_else(|| ConverterError::UnknownSource(source_id.to_string()))
    }

    fn converted_index(&self, converted_id: &str) -> Result<usize> {
        self.converted
            .iter()
            .position(|c| c.id == converted_id)
            .ok_or_else(|| ConverterError::UnknownConverted(converted_id.to_string()))
    }
}

impl std::fmt::Debug for ConverterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterSession")
            .field("parameters", &self.parameters)
            .field("sources", &self.sources.len())
            .field("converted", &self.converted.len())
            .field("blobs", &self.blobs)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

/// Apply one batch item to the session state.
fn record_item(
    item: BatchItem,
    parameters: &ConversionParameters,
    sources: &mut [SourceEntry],
    converted: &mut Vec<ConvertedFile>,
    blobs: &mut BlobStore,
) -> Result<()> {
    let BatchItem { source, result, .. } = item;
    let entry = sources.iter_mut().find(|s| s.file.id() == source.id());

    match result {
        Ok(encoded) => {
            let file = converted_from(&source, encoded, parameters, blobs);
            converted.push(file);
            if let Some(entry) = entry {
                entry.state = FileState::Converted;
            }
            metrics().increment(names::CONVERSIONS);
            Ok(())
        }
        Err(e) => {
            if matches!(e, ConverterError::RateLimited) {
                metrics().increment(names::RATE_LIMITED);
            }
            metrics().increment(names::CONVERSION_FAILURES);
            tracing::warn!(file = %source.name, error = %e, "Conversion failed");
            if let Some(entry) = entry {
                entry.state = FileState::Errored(e.to_string());
            }
            Err(e)
        }
    }
}

fn converted_from(
    source: &SourceFile,
    encoded: EncodedImage,
    parameters: &ConversionParameters,
    blobs: &mut BlobStore,
) -> ConvertedFile {
    let converted_size = encoded.bytes.len() as u64;
    ConvertedFile {
        id: Uuid::new_v4().to_string(),
        source_id: source.id().to_string(),
        name: with_format_extension(&source.name, encoded.format),
        original_format: detect_format(source.bytes()).ok(),
        converted_format: encoded.format,
        original_size: source.size(),
        converted_size,
        width: encoded.width,
        height: encoded.height,
        quality: parameters.quality,
        compression_level: parameters.active_compression(),
        renamed: false,
        blob: blobs.create(encoded.bytes),
    }
}

fn rejection_message(rejected: &[ConverterError]) -> Option<String> {
    match rejected {
        [] => None,
        [single] => Some(format!("Could not add {single}")),
        many => Some(format!(
            "{} files could not be added: {}",
            many.len(),
            many.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Level, MemoryNotifier};
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
    use std::cell::Cell;
    use std::io::Cursor;
    use std::rc::Rc;
    use std::time::Duration;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| Rgba([(x * 9) as u8, (y * 5) as u8, 90, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn png(name: &str, width: u32, height: u32) -> SourceFile {
        SourceFile::from_bytes(name, png_bytes(width, height))
    }

    fn corrupt(name: &str) -> SourceFile {
        let mut bytes = png_bytes(8, 8);
        bytes.truncate(40);
        SourceFile::from_bytes(name, bytes)
    }

    fn session() -> (ConverterSession, MemoryNotifier) {
        let notifier = MemoryNotifier::new();
        let config = SessionConfig {
            domain: "acme".to_string(),
            ..SessionConfig::default()
        };
        (ConverterSession::new(config).with_notifier(notifier.clone()), notifier)
    }

    fn counting_session() -> (ConverterSession, Rc<Cell<usize>>) {
        let releases = Rc::new(Cell::new(0));
        let counter = Rc::clone(&releases);
        let store = BlobStore::new().with_release_hook(move |_| counter.set(counter.get() + 1));
        (ConverterSession::new(SessionConfig::default()).with_blob_store(store), releases)
    }

    #[test]
    fn test_add_files_rejects_and_sanitizes() {
        let (mut session, notifier) = session();
        let report = session.add_files(vec![
            png("my holiday.png", 4, 4),
            SourceFile::from_bytes("notes.txt", b"hello".to_vec()),
            SourceFile::new("empty.png", "image/png", Vec::new()),
        ]);

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(session.sources()[0].file.name, "my-holiday.png");
        assert_eq!(session.sources()[0].state, FileState::Pending);

        let notifications = notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, Level::Error);
        assert!(notifications[0].message.starts_with("2 files could not be added"));
    }

    #[test]
    fn test_batch_with_corrupt_file() {
        let (mut session, notifier) = session();
        session.add_files(vec![png("a.png", 10, 6), corrupt("b.png"), png("c.png", 3, 3)]);

        let mut seen = Vec::new();
        let summary = session.convert_all_with_progress(false, |p| seen.push(p.percent));

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(session.converted().len(), 2);
        assert_eq!(session.errors().len(), 1);
        assert_eq!(session.errors()[0].0, "b.png");
        assert_eq!(seen, vec![33, 66, 100]);
        assert_eq!(session.progress(), 100);

        let last = notifier.last().unwrap();
        assert_eq!(last.level, Level::Warning);
        assert_eq!(last.message, "Converted 2 of 3 files, 1 failed");
    }

    #[test]
    fn test_batch_success_message_and_metadata() {
        let (mut session, notifier) = session();
        session.add_files(vec![png("a.png", 10, 6)]);

        let summary = session.convert_all(false);
        assert!(summary.is_complete());
        assert_eq!(notifier.last().unwrap().message, "Converted 1 of 1 files to JPG");

        let file = &session.converted()[0];
        assert_eq!(file.name, "a.jpg");
        assert_eq!((file.width, file.height), (10, 6));
        assert_eq!(file.original_format, Some(ImageFormat::Png));
        assert_eq!(file.converted_format, OutputFormat::Jpeg);
        assert_eq!(file.quality, 85);
        assert_eq!(file.converted_size, session.converted_bytes(&file.id).unwrap().len() as u64);
        assert_eq!(session.sources()[0].state, FileState::Converted);
    }

    #[test]
    fn test_all_failed_and_empty_batches() {
        let (mut session, notifier) = session();
        session.convert_all(false);
        assert_eq!(notifier.last().unwrap().level, Level::Info);

        session.add_files(vec![corrupt("x.png"), corrupt("y.png")]);
        session.convert_all(false);
        let last = notifier.last().unwrap();
        assert_eq!(last.level, Level::Error);
        assert_eq!(last.message, "Failed to convert 2 files");
    }

    #[test]
    fn test_errored_sources_need_retry_flag() {
        let (mut session, _) = session();
        session.add_files(vec![corrupt("x.png")]);
        session.convert_all(false);

        assert_eq!(session.convert_all(false).total, 0);
        assert_eq!(session.convert_all(true).total, 1);
    }

    #[test]
    fn test_rate_limited_file_is_per_file_error() {
        let config = SessionConfig {
            rate_limit: RateLimitConfig::strict(1, Duration::from_secs(60)),
            ..SessionConfig::default()
        };
        let mut session = ConverterSession::new(config).with_notifier(MemoryNotifier::new());
        session.add_files(vec![png("a.png", 2, 2), png("b.png", 2, 2)]);

        let summary = session.convert_all(false);
        assert_eq!((summary.succeeded, summary.failed), (1, 1));
        assert!(matches!(session.sources()[1].state, FileState::Errored(_)));
    }

    #[test]
    fn test_retry_single_source() {
        let (mut session, notifier) = session();
        let report = session.add_files(vec![png("a.png", 5, 5)]);
        let id = report.accepted[0].clone();

        let converted = session.retry(&id).unwrap();
        assert_eq!(converted.source_id, id);
        assert_eq!(notifier.last().unwrap().level, Level::Success);

        assert!(matches!(session.retry("missing"), Err(ConverterError::UnknownSource(_))));
    }

    #[test]
    fn test_rename_releases_old_blob() {
        let (mut session, releases) = counting_session();
        session.add_files(vec![png("a.png", 4, 4)]);
        session.convert_all(false);

        let id = session.converted()[0].id.clone();
        let old_blob = session.converted()[0].blob;
        let before = session.converted_bytes(&id).unwrap().to_vec();

        let renamed = session.rename(&id, "Beach Day.png").unwrap();
        assert_eq!(renamed.name, "Beach-Day.jpg");
        assert!(renamed.renamed);
        assert_ne!(renamed.blob, old_blob);

        assert_eq!(releases.get(), 1);
        assert!(!session.blobs().contains(old_blob));
        assert_eq!(session.converted_bytes(&id).unwrap(), before.as_slice());
        assert_eq!(session.blobs().live_count(), 1);
    }

    #[test]
    fn test_resize_replaces_blob() {
        let (mut session, releases) = counting_session();
        session.add_files(vec![png("a.png", 40, 20)]);
        session.convert_all(false);
        let id = session.converted()[0].id.clone();

        let resized = session.resize_converted(&id, 20, 10).unwrap();
        assert_eq!((resized.width, resized.height), (20, 10));
        assert_eq!(releases.get(), 1);
        assert_eq!(session.blobs().live_count(), 1);

        let decoded = image::load_from_memory(session.converted_bytes(&id).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn test_failed_resize_leaves_state() {
        let (mut session, releases) = counting_session();
        session.add_files(vec![png("a.png", 40, 20)]);
        session.convert_all(false);
        let before = session.converted()[0].clone();

        let err = session.resize_converted(&before.id, 0, 10).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDimensions);

        let after = &session.converted()[0];
        assert_eq!(after.blob, before.blob);
        assert_eq!((after.width, after.height), (40, 20));
        assert_eq!(releases.get(), 0);
    }

    #[test]
    fn test_remove_and_clear_release_every_blob() {
        let (mut session, releases) = counting_session();
        session.add_files(vec![png("a.png", 4, 4), png("b.png", 4, 4), png("c.png", 4, 4)]);
        session.convert_all(false);

        let first = session.converted()[0].id.clone();
        session.remove_converted(&first).unwrap();
        assert_eq!(releases.get(), 1);

        session.clear();
        assert_eq!(releases.get(), 3);
        assert_eq!(session.blobs().live_count(), 0);
        assert!(session.sources().is_empty());
        assert!(session.converted().is_empty());
    }

    #[test]
    fn test_download_names() {
        let (mut session, _) = session();
        session.add_files(vec![png("beach.png", 4, 4), png("beach-acme.png", 4, 4)]);
        session.convert_all(false);

        let id = session.converted()[0].id.clone();
        let download = session.download(&id).unwrap();
        assert_eq!(download.file_name, "beach-acme.jpg");
        assert_eq!(download.mime, "image/jpeg");

        let entries_before = metrics().counter(names::ARCHIVE_ENTRIES);
        let (archive, report) = session.download_all(Some("photos")).unwrap();
        assert_eq!(archive.file_name, "photos_acme.zip");
        assert_eq!(report.included, vec!["beach-acme.jpg", "beach-acme (2).jpg"]);
        assert!(metrics().counter(names::ARCHIVE_ENTRIES) >= entries_before + 2);
    }

    #[test]
    fn test_download_all_without_files() {
        let (session, _) = session();
        let err = session.download_all(None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ArchiveError);
    }

    #[test]
    fn test_reconversion_appends() {
        let (mut session, _) = session();
        session.add_files(vec![png("a.png", 4, 4)]);
        session.convert_all(false);

        session.set_parameters(ConversionParameters::for_format(OutputFormat::Png));
        session.convert_all(false);

        let formats: Vec<_> = session.converted().iter().map(|c| c.converted_format).collect();
        assert_eq!(formats, vec![OutputFormat::Jpeg, OutputFormat::Png]);
    }

    #[test]
    fn test_memory_warning_is_advisory() {
        let notifier = MemoryNotifier::new();
        let config = SessionConfig {
            memory_budget: 1024,
            ..SessionConfig::default()
        };
        let mut session = ConverterSession::new(config).with_notifier(notifier.clone());
        session.add_files(vec![png("a.png", 64, 64)]);

        let summary = session.convert_all(false);
        assert!(summary.is_complete());

        let notifications = notifier.notifications();
        assert_eq!(notifications[0].level, Level::Warning);
        assert!(notifications[0].message.contains("memory"));
    }

    #[test]
    fn test_summary_messages() {
        let summary = |succeeded, failed| BatchSummary {
            total: succeeded + failed,
            succeeded,
            failed,
            format: OutputFormat::WebP,
        };
        assert_eq!(summary(3, 0).message(), "Converted 3 of 3 files to WEBP");
        assert_eq!(summary(2, 1).message(), "Converted 2 of 3 files, 1 failed");
        assert_eq!(summary(0, 2).message(), "Failed to convert 2 files");
    }
}
