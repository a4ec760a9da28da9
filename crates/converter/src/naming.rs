//! Download and archive file names.
//!
//! The domain tag is always passed in. A name that already ends in the tag
//! (`photo-acme`, `photo_acme`) never gets it appended a second time.

use snapconvert_core::validation::{ACCEPTED_EXTENSIONS, sanitize_file_name};
use snapconvert_image::OutputFormat;

/// Archive base used when none is given
pub const DEFAULT_ARCHIVE_BASE: &str = "converted-images";

/// Name of the zip archive for a base name and domain tag.
///
/// # Example
/// ```
/// use snapconvert_converter::naming::archive_name;
///
/// assert_eq!(archive_name("photos", "acme"), "photos_acme.zip");
/// assert_eq!(archive_name("photos-acme", "acme"), "photos-acme.zip");
/// assert_eq!(archive_name("photos", ""), "photos.zip");
/// ```
pub fn archive_name(base: &str, domain: &str) -> String {
    let base = base.trim();
    let base = strip_suffix_ignore_case(base, ".zip").unwrap_or(base);
    let base = if base.trim().is_empty() {
        DEFAULT_ARCHIVE_BASE.to_string()
    } else {
        sanitize_file_name(base)
    };
    let domain = clean_domain(domain);

    if domain.is_empty() || domain_suffix_len(&base, &domain).is_some() {
        format!("{base}.zip")
    } else {
        format!("{base}_{domain}.zip")
    }
}

/// Name of one converted file inside the archive: `<base>-<domain>.<ext>`.
pub fn entry_name(name: &str, domain: &str, format: OutputFormat) -> String {
    let stem = image_stem(name);
    let domain = clean_domain(domain);

    let stem = match domain_suffix_len(stem, &domain) {
        Some(len) => &stem[..stem.len() - len],
        None => stem,
    };
    let stem = if stem.is_empty() { "image" } else { stem };

    if domain.is_empty() {
        format!("{stem}.{}", format.extension())
    } else {
        format!("{stem}-{domain}.{}", format.extension())
    }
}

/// Name used for a single-file download.
pub fn download_name(name: &str, domain: &str, format: OutputFormat) -> String {
    entry_name(name, domain, format)
}

/// Replace a known image extension (or append one) so the name matches `format`.
pub fn with_format_extension(name: &str, format: OutputFormat) -> String {
    let stem = image_stem(name);
    let stem = if stem.is_empty() { "image" } else { stem };
    format!("{stem}.{}", format.extension())
}

/// Make `name` unique within `taken` by adding ` (2)`, ` (3)`, ... before the extension.
pub fn dedupe(name: &str, taken: &std::collections::HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{ext}")),
        _ => (name, String::new()),
    };
    (2..)
        .map(|n| format!("{stem} ({n}){ext}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

fn image_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (ACCEPTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
                    || OutputFormat::ALL.iter().any(|f| f.extension().eq_ignore_ascii_case(ext))) =>
        {
            stem
        }
        _ => name,
    }
}

fn clean_domain(domain: &str) -> String {
    domain
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect::<String>()
        .trim_matches(['-', '_', '.'])
        .to_string()
}

/// Length of a trailing `-domain` or `_domain`, if present.
fn domain_suffix_len(stem: &str, domain: &str) -> Option<usize> {
    if domain.is_empty() {
        return None;
    }
    ['-', '_'].iter().find_map(|sep| {
        let suffix = format!("{sep}{domain}");
        strip_suffix_ignore_case(stem, &suffix).map(|_| suffix.len())
    })
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    let (head, tail) = (s.get(..split)?, s.get(split..)?);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
