//! Sequential batch conversion.
//!
//! [`BatchConversion`] converts its queue one file at a time, in input
//! order, yielding one [`BatchItem`] per file. A failure is reported on its
//! item and the batch moves on.

use crate::error::{ConverterError, Result};
use crate::source::SourceFile;
use snapconvert_core::rate_limit::SlidingWindowLimiter;
use snapconvert_image::{ConvertOptions, EncodedImage, convert};
use snapconvert_telemetry::{Timer, names};

/// Outcome for one file of a batch
#[derive(Debug)]
pub struct BatchItem {
    /// Zero-based position in the batch
    pub index: usize,
    /// Batch size
    pub total: usize,
    /// The file that was converted
    pub source: SourceFile,
    /// Encoded output or the per-file failure
    pub result: Result<EncodedImage>,
}

impl BatchItem {
    /// Batch completion after this item, 0-100
    pub fn percent(&self) -> u8 {
        progress_percent(self.index + 1, self.total)
    }
}

/// Progress snapshot passed to batch callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Files finished so far
    pub completed: usize,
    /// Batch size
    pub total: usize,
    /// Completion, 0-100
    pub percent: u8,
}

impl From<&BatchItem> for BatchProgress {
    fn from(item: &BatchItem) -> Self {
        Self {
            completed: item.index + 1,
            total: item.total,
            percent: item.percent(),
        }
    }
}

/// Iterator converting a queue of sources with fixed options
pub struct BatchConversion<'a> {
    queue: std::vec::IntoIter<SourceFile>,
    total: usize,
    next_index: usize,
    options: ConvertOptions,
    limiter: &'a mut SlidingWindowLimiter,
}

impl<'a> BatchConversion<'a> {
    /// Prepare a batch. Nothing is converted until iteration.
    pub fn new(sources: Vec<SourceFile>, options: ConvertOptions, limiter: &'a mut SlidingWindowLimiter) -> Self {
        Self {
            total: sources.len(),
            queue: sources.into_iter(),
            next_index: 0,
            options,
            limiter,
        }
    }

    /// Number of files in the batch
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for BatchConversion<'_> {
    type Item = BatchItem;

    fn next(&mut self) -> Option<BatchItem> {
        let source = self.queue.next()?;
        let index = self.next_index;
        self.next_index += 1;

        let result = if self.limiter.try_acquire() {
            let _timer = Timer::start(names::CONVERSION_MS);
            convert(source.bytes(), &self.options).map_err(ConverterError::from)
        } else {
            Err(ConverterError::RateLimited)
        };

        match &result {
            Ok(encoded) => tracing::debug!(
                index,
                total = self.total,
                file = %source.name,
                output_bytes = encoded.bytes.len(),
                "Batch item converted"
            ),
            Err(e) => tracing::debug!(index, total = self.total, file = %source.name, error = %e, "Batch item failed"),
        }

        Some(BatchItem {
            index,
            total: self.total,
            source,
            result,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.queue.size_hint()
    }
}

impl ExactSizeIterator for BatchConversion<'_> {}

/// Integer percentage of `done` out of `total`
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(done.min(total) * 100 / total).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use snapconvert_core::rate_limit::RateLimitConfig;
    use snapconvert_image::OutputFormat;
    use std::io::Cursor;
    use std::time::Duration;

    fn png(name: &str) -> SourceFile {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(4, 3))
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        SourceFile::from_bytes(name, buf.into_inner())
    }

    fn jpeg_options() -> ConvertOptions {
        ConvertOptions {
            format: OutputFormat::Jpeg,
            quality: 80,
            compression_level: None,
        }
    }

    #[test]
    fn test_items_in_input_order() {
        let mut limiter = SlidingWindowLimiter::new(RateLimitConfig::unlimited());
        let sources = vec![png("a.png"), SourceFile::from_bytes("bad.png", vec![0x89, b'P', b'N', b'G']), png("c.png")];

        let items: Vec<_> = BatchConversion::new(sources, jpeg_options(), &mut limiter).collect();

        assert_eq!(items.len(), 3);
        assert_eq!(items.iter().map(|i| i.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(items[0].source.name, "a.png");
        assert!(items[0].result.is_ok());
        assert!(matches!(items[1].result, Err(ConverterError::Image(_))));
        assert!(items[2].result.is_ok());
        assert_eq!(items.iter().map(BatchItem::percent).collect::<Vec<_>>(), vec![33, 66, 100]);
    }

    #[test]
    fn test_rate_limit_is_per_file() {
        let mut limiter = SlidingWindowLimiter::new(RateLimitConfig::strict(1, Duration::from_secs(60)));
        let items: Vec<_> = BatchConversion::new(vec![png("a.png"), png("b.png")], jpeg_options(), &mut limiter).collect();

        assert!(items[0].result.is_ok());
        assert!(matches!(items[1].result, Err(ConverterError::RateLimited)));
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 100);
        assert_eq!(progress_percent(1, 4), 25);
        assert_eq!(progress_percent(9, 4), 100);
    }

    #[test]
    fn test_exact_size() {
        let mut limiter = SlidingWindowLimiter::new(RateLimitConfig::unlimited());
        let batch = BatchConversion::new(vec![png("a.png")], jpeg_options(), &mut limiter);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.total(), 1);
    }
}
