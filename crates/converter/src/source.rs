//! User-supplied source images.

use snapconvert_core::validation::{extension_of, mime_for_extension};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// MIME type used when the extension says nothing
const UNKNOWN_MIME: &str = "application/octet-stream";

/// An image handed to the converter.
///
/// Ids are unique per process; names need not be.
#[derive(Clone)]
pub struct SourceFile {
    id: String,
    /// Display name (sanitized once accepted)
    pub name: String,
    /// Declared MIME type
    pub mime: String,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Wrap in-memory bytes with their declared name and MIME type.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Wrap bytes, declaring the MIME type implied by the name's extension.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let mime = declared_mime(&name);
        Self::new(name, mime, bytes)
    }

    /// Read a file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::from_bytes(name, bytes))
    }

    /// Session-unique id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw file contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

fn declared_mime(name: &str) -> &'static str {
    extension_of(name)
        .and_then(|ext| mime_for_extension(&ext))
        .unwrap_or(UNKNOWN_MIME)
}
