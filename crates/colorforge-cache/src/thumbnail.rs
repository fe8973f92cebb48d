//! Thumbnail cache for the browser grid.
//!
//! Keyed by source file path. Thumbnails are cheap to regenerate, so this
//! cache is synchronous and keeps no ledger; evictions are only traced.

use crate::bounded::{BoundedKeyedCache, CacheStats};
use colorforge_core::{bytes_to_mb, SharedPixelBuffer};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ThumbnailCache {
    cache: BoundedKeyedCache<PathBuf, SharedPixelBuffer>,
}

impl ThumbnailCache {
    /// Create a cache holding at most `budget_bytes` of thumbnails.
    pub fn new(budget_bytes: usize) -> Self {
        let cache = BoundedKeyedCache::new(budget_bytes).with_eviction_listener(
            |path: &PathBuf, _thumb: &SharedPixelBuffer, cost: usize| {
                debug!(path = %path.display(), size_mb = bytes_to_mb(cost), "Evicting thumbnail");
            },
        );
        Self { cache }
    }

    /// Cached thumbnail for `path`, if any.
    pub fn thumbnail(&self, path: &Path) -> Option<SharedPixelBuffer> {
        self.cache.value(path)
    }

    pub fn insert(&self, path: impl Into<PathBuf>, thumbnail: SharedPixelBuffer) {
        let cost = thumbnail.memory_size();
        self.cache.set_value(thumbnail, path.into(), cost);
    }

    pub fn remove(&self, path: &Path) -> Option<SharedPixelBuffer> {
        self.cache.remove_value(path).0
    }

    pub fn clear(&self) {
        self.cache.remove_all();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
