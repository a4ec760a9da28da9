//! Zip packaging of converted files.

use crate::blob::{BlobRef, BlobStore};
use crate::error::{ConverterError, Result};
use crate::naming::dedupe;
use serde::Serialize;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// What went into an archive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
    /// Entry names written, in order
    pub included: Vec<String>,
    /// Entries left out, with the reason
    pub skipped: Vec<SkippedEntry>,
}

/// An entry that could not be added
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Intended entry name
    pub name: String,
    /// Why it was skipped
    pub reason: String,
}

/// Build a zip from `(entry name, blob)` pairs.
///
/// An entry whose blob cannot be fetched is logged and skipped; the rest of
/// the archive is still written. Repeated names get ` (2)`, ` (3)`, ...
/// Fails if nothing could be added.
pub fn build_archive<I>(store: &BlobStore, entries: I) -> Result<(Vec<u8>, ArchiveReport)>
where
    I: IntoIterator<Item = (String, BlobRef)>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut report = ArchiveReport::default();
    let mut taken = HashSet::new();

    for (name, blob) in entries {
        let bytes = match store.fetch(blob) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(entry = %name, %blob, error = %e, "Skipping archive entry");
                report.skipped.push(SkippedEntry {
                    name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let unique = dedupe(&name, &taken);
        writer.start_file(unique.as_str(), options)?;
        writer.write_all(bytes)?;

        tracing::debug!(entry = %unique, bytes = bytes.len(), "Added archive entry");
        taken.insert(unique.clone());
        report.included.push(unique);
    }

    if report.included.is_empty() {
        return Err(ConverterError::archive("No files could be added to the archive"));
    }

    let bytes = writer.finish()?.into_inner();
    Ok((bytes, report))
}
