//! Decode-ahead of the first images in a folder.
//!
//! When a folder is opened the first few images are decoded in parallel and
//! stored in the standard tier, so the browser and editor have something to
//! show before the user clicks. Images already cached are skipped, both up
//! front and again just before decoding, since another worker or view may
//! have filled the entry in the meantime.

use colorforge_cache::PixelBufferCache;
use colorforge_core::memory_budget::WARMUP_LIMIT;
use colorforge_core::{PixelBuffer, SharedPixelBuffer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An image in the open folder.
#[derive(Debug, Clone)]
pub struct ImageItem {
    pub id: Uuid,
    pub path: PathBuf,
    /// Preview width in pixels.
    pub width: u32,
    /// Preview height in pixels.
    pub height: u32,
}

impl ImageItem {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            width,
            height,
        }
    }
}

/// Produces a preview buffer for an image.
///
/// Implementations block; they are driven from the blocking pool.
pub trait PreviewDecoder: Send + Sync {
    fn decode(&self, item: &ImageItem) -> Option<SharedPixelBuffer>;
}

/// Decoder that renders a ramp at the item's preview size.
pub struct SyntheticDecoder;

impl PreviewDecoder for SyntheticDecoder {
    fn decode(&self, item: &ImageItem) -> Option<SharedPixelBuffer> {
        if item.width == 0 || item.height == 0 {
            return None;
        }
        Some(Arc::new(PixelBuffer::test_pattern(item.width, item.height)))
    }
}

/// Outcome of a warm-up run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmupSummary {
    /// Buffers decoded and stored.
    pub decoded: usize,
    /// Items that were already cached.
    pub skipped: usize,
    /// Items the decoder could not handle.
    pub failed: usize,
    /// Entries evicted from the cache during the run.
    pub evictions: u64,
}

impl WarmupSummary {
    fn merge(&mut self, other: WarmupSummary) {
        self.decoded += other.decoded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Decode the first [`WARMUP_LIMIT`] items into `cache` using `workers`
/// parallel tasks.
pub async fn warm_initial_buffers(
    cache: Arc<PixelBufferCache>,
    decoder: Arc<dyn PreviewDecoder>,
    items: &[ImageItem],
    workers: usize,
) -> WarmupSummary {
    let evictions_before = cache.stats().evictions;
    let mut summary = WarmupSummary::default();

    let candidates: Vec<ImageItem> = items.iter().take(WARMUP_LIMIT).cloned().collect();
    let pending: Vec<ImageItem> = candidates
        .iter()
        .filter(|item| !cache.contains(item.id))
        .cloned()
        .collect();
    summary.skipped = candidates.len() - pending.len();

    if pending.is_empty() {
        info!(skipped = summary.skipped, "All items already cached, skipping warm-up");
        return summary;
    }
    info!(
        pending = pending.len(),
        skipped = summary.skipped,
        "Warming preview cache"
    );

    let workers = workers.clamp(1, pending.len());
    let mut groups: Vec<Vec<ImageItem>> = vec![Vec::new(); workers];
    for (index, item) in pending.into_iter().enumerate() {
        groups[index % workers].push(item);
    }

    let mut tasks = Vec::with_capacity(workers);
    for (worker, group) in groups.into_iter().enumerate() {
        let cache = Arc::clone(&cache);
        let decoder = Arc::clone(&decoder);
        tasks.push(tokio::spawn(async move {
            warm_group(worker, cache, decoder, group).await
        }));
    }

    for task in tasks {
        match task.await {
            Ok(partial) => summary.merge(partial),
            Err(e) => warn!(error = %e, "Warm-up worker failed"),
        }
    }

    summary.evictions = cache.stats().evictions - evictions_before;
    info!(
        decoded = summary.decoded,
        skipped = summary.skipped,
        failed = summary.failed,
        evictions = summary.evictions,
        "Warm-up complete"
    );
    summary
}

async fn warm_group(
    worker: usize,
    cache: Arc<PixelBufferCache>,
    decoder: Arc<dyn PreviewDecoder>,
    group: Vec<ImageItem>,
) -> WarmupSummary {
    let mut summary = WarmupSummary::default();

    for item in group {
        if cache.contains(item.id) {
            summary.skipped += 1;
            continue;
        }

        let decoder = Arc::clone(&decoder);
        let id = item.id;
        let path = item.path.clone();
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&item)).await;

        match decoded {
            Ok(Some(buffer)) => {
                cache.set_id(buffer, id).await;
                summary.decoded += 1;
                debug!(worker, path = %path.display(), "Preview cached");
            }
            Ok(None) => {
                summary.failed += 1;
                warn!(path = %path.display(), "Decoder produced no preview");
            }
            Err(e) => {
                summary.failed += 1;
                warn!(path = %path.display(), error = %e, "Decode task panicked");
            }
        }
    }
    summary
}
