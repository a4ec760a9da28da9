//! Coarse memory-pressure heuristic for conversion batches.
//!
//! Batches are converted one file at a time, so peak usage is roughly the
//! largest decoded bitmap (twice, source and re-encode buffer) plus every
//! byte buffer the session is already holding. The estimate only feeds a
//! warning; it never blocks a conversion.

use serde::{Deserialize, Serialize};

/// Default memory budget (1 GiB)
pub const DEFAULT_MEMORY_BUDGET: u64 = 1024 * 1024 * 1024;

/// Bytes per decoded RGBA pixel
const BYTES_PER_PIXEL: u64 = 4;

/// Expansion factor used when a file's dimensions cannot be read
const UNKNOWN_EXPANSION: u64 = 10;

/// Elevated threshold as a percentage of the budget
const ELEVATED_PERCENT: u64 = 75;

/// Pressure level reported for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPressure {
    /// Comfortably inside the budget
    Normal,
    /// Above 75% of the budget
    Elevated,
    /// Over the budget
    Critical,
}

impl MemoryPressure {
    /// True when the user should be warned
    pub fn should_warn(&self) -> bool {
        !matches!(self, MemoryPressure::Normal)
    }
}

/// One file queued for conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingImage {
    /// Encoded size in bytes
    pub encoded_bytes: u64,
    /// Pixel dimensions if the header could be read
    pub dimensions: Option<(u32, u32)>,
}

impl PendingImage {
    /// Estimated size of the decoded bitmap
    pub fn decoded_bytes(&self) -> u64 {
        match self.dimensions {
            Some((w, h)) => u64::from(w) * u64::from(h) * BYTES_PER_PIXEL,
            None => self.encoded_bytes.saturating_mul(UNKNOWN_EXPANSION),
        }
    }
}

/// Memory estimate for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEstimate {
    /// Estimated peak bytes
    pub peak_bytes: u64,
    /// Budget the estimate was compared against
    pub budget_bytes: u64,
    /// Resulting pressure level
    pub pressure: MemoryPressure,
    /// Whether any file's dimensions were guessed
    pub uncertain: bool,
}

impl MemoryEstimate {
    /// Human-readable warning, if one is due
    pub fn warning(&self) -> Option<String> {
        let mb = |b: u64| b / (1024 * 1024);
        match self.pressure {
            MemoryPressure::Normal => None,
            MemoryPressure::Elevated => Some(format!(
                "Large batch: about {} MB of {} MB memory budget in use. Conversion may be slow",
                mb(self.peak_bytes),
                mb(self.budget_bytes)
            )),
            MemoryPressure::Critical => Some(format!(
                "Batch may exceed available memory (about {} MB, budget {} MB). Consider converting fewer files at once",
                mb(self.peak_bytes),
                mb(self.budget_bytes)
            )),
        }
    }
}

/// Estimate peak memory for converting `pending` while `held_bytes` of
/// converted output is already resident.
pub fn estimate_batch(pending: &[PendingImage], held_bytes: u64, budget_bytes: u64) -> MemoryEstimate {
    let largest_decoded = pending.iter().map(PendingImage::decoded_bytes).max().unwrap_or(0);
    let sources: u64 = pending.iter().map(|p| p.encoded_bytes).sum();
    let peak_bytes = largest_decoded
        .saturating_mul(2)
        .saturating_add(sources)
        .saturating_add(held_bytes);

    MemoryEstimate {
        peak_bytes,
        budget_bytes,
        pressure: classify(peak_bytes, budget_bytes),
        uncertain: pending.iter().any(|p| p.dimensions.is_none()),
    }
}

fn classify(peak: u64, budget: u64) -> MemoryPressure {
    if peak > budget {
        MemoryPressure::Critical
    } else if peak.saturating_mul(100) > budget.saturating_mul(ELEVATED_PERCENT) {
        MemoryPressure::Elevated
    } else {
        MemoryPressure::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn image(w: u32, h: u32, bytes: u64) -> PendingImage {
        PendingImage {
            encoded_bytes: bytes,
            dimensions: Some((w, h)),
        }
    }

    #[test]
    fn test_small_batch_is_normal() {
        let estimate = estimate_batch(&[image(800, 600, 200_000)], 0, DEFAULT_MEMORY_BUDGET);
        assert_eq!(estimate.pressure, MemoryPressure::Normal);
        assert!(estimate.warning().is_none());
        assert!(!estimate.uncertain);
    }

    #[test]
    fn test_peak_uses_largest_bitmap_twice() {
        let pending = [image(100, 100, 1000), image(200, 100, 2000)];
        let estimate = estimate_batch(&pending, 500, DEFAULT_MEMORY_BUDGET);
        assert_eq!(estimate.peak_bytes, 200 * 100 * 4 * 2 + 3000 + 500);
    }

    #[test]
    fn test_elevated_and_critical() {
        // 8000x8000 RGBA is 256 million bytes, doubled for the re-encode buffer
        let pending = [image(8000, 8000, 10 * MB)];
        assert_eq!(estimate_batch(&pending, 0, 600 * MB).pressure, MemoryPressure::Elevated);
        assert_eq!(estimate_batch(&pending, 0, 400 * MB).pressure, MemoryPressure::Critical);
        assert!(estimate_batch(&pending, 0, 400 * MB).warning().unwrap().contains("exceed"));
    }

    #[test]
    fn test_unknown_dimensions_are_uncertain() {
        let pending = [PendingImage {
            encoded_bytes: MB,
            dimensions: None,
        }];
        let estimate = estimate_batch(&pending, 0, DEFAULT_MEMORY_BUDGET);
        assert!(estimate.uncertain);
        assert_eq!(estimate.peak_bytes, 10 * MB * 2 + MB);
    }

    #[test]
    fn test_empty_batch() {
        let estimate = estimate_batch(&[], 0, DEFAULT_MEMORY_BUDGET);
        assert_eq!(estimate.peak_bytes, 0);
        assert!(!estimate.pressure.should_warn());
    }
}
