//! In-memory store for encoded output.
//!
//! Every converted file points at a [`BlobRef`] in the session's store.
//! A reference is released exactly once: when its file is removed, when
//! resize or rename supersedes it, or when the batch is cleared.

use crate::error::{ConverterError, Result};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Handle to bytes held by a [`BlobStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobRef(Uuid);

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

type ReleaseHook = Box<dyn FnMut(BlobRef)>;

/// Owner of all encoded output bytes
#[derive(Default)]
pub struct BlobStore {
    blobs: HashMap<BlobRef, Vec<u8>>,
    released: u64,
    on_release: Option<ReleaseHook>,
}

impl BlobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `hook` after each successful release
    #[must_use]
    pub fn with_release_hook(mut self, hook: impl FnMut(BlobRef) + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Take ownership of `bytes` and hand back a reference to them
    pub fn create(&mut self, bytes: Vec<u8>) -> BlobRef {
        let blob = BlobRef(Uuid::new_v4());
        self.blobs.insert(blob, bytes);
        blob
    }

    /// Borrow the bytes behind a live reference
    pub fn fetch(&self, blob: BlobRef) -> Result<&[u8]> {
        self.blobs
            .get(&blob)
            .map(Vec::as_slice)
            .ok_or(ConverterError::BlobReleased)
    }

    /// Free a reference. Returns `false` if it was already released.
    pub fn release(&mut self, blob: BlobRef) -> bool {
        if self.blobs.remove(&blob).is_none() {
            return false;
        }
        self.released += 1;
        if let Some(hook) = self.on_release.as_mut() {
            hook(blob);
        }
        true
    }

    /// Whether a reference is still live
    pub fn contains(&self, blob: BlobRef) -> bool {
        self.blobs.contains_key(&blob)
    }

    /// Number of live references
    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }

    /// Total bytes held by live references
    pub fn live_bytes(&self) -> u64 {
        self.blobs.values().map(|b| b.len() as u64).sum()
    }

    /// Number of releases performed so far
    pub fn released_count(&self) -> u64 {
        self.released
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("live", &self.blobs.len())
            .field("live_bytes", &self.live_bytes())
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
