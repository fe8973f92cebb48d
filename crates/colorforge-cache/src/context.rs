//! Cache instances shared across the application.

use crate::config::CacheConfig;
use crate::pixel_cache::PixelBufferCache;
use crate::size_policy::CacheTier;
use crate::thumbnail::ThumbnailCache;
use colorforge_core::{bytes_to_mb, Result, GIB};
use std::sync::Arc;
use tracing::info;

/// Every cache the application uses, built once at startup.
///
/// Cloning is cheap and hands out the same instances, so producers and
/// consumers can each hold a `CacheContext` without coordinating.
#[derive(Clone)]
pub struct CacheContext {
    standard: Arc<PixelBufferCache>,
    high_res: Arc<PixelBufferCache>,
    thumbnails: Arc<ThumbnailCache>,
    physical_memory: u64,
}

impl CacheContext {
    /// Build all caches from configuration. Physical memory is queried here,
    /// once, unless the config overrides it.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        let physical_memory = config.physical_memory();

        let standard = PixelBufferCache::from_config(CacheTier::Standard, config, physical_memory);
        let high_res =
            PixelBufferCache::from_config(CacheTier::HighResolution, config, physical_memory);

        info!(
            physical_gb = physical_memory as f64 / GIB as f64,
            standard_mb = bytes_to_mb(standard.total_cost_limit_bytes()),
            high_res_mb = bytes_to_mb(high_res.total_cost_limit_bytes()),
            thumbnail_mb = bytes_to_mb(config.thumbnail_budget_bytes),
            "Caches initialized"
        );

        Ok(Self {
            standard: Arc::new(standard),
            high_res: Arc::new(high_res),
            thumbnails: Arc::new(ThumbnailCache::new(config.thumbnail_budget_bytes)),
            physical_memory,
        })
    }

    /// Standard-resolution buffers.
    pub fn standard(&self) -> &Arc<PixelBufferCache> {
        &self.standard
    }

    /// Full-resolution buffers.
    pub fn high_res(&self) -> &Arc<PixelBufferCache> {
        &self.high_res
    }

    pub fn tier(&self, tier: CacheTier) -> &Arc<PixelBufferCache> {
        match tier {
            CacheTier::Standard => &self.standard,
            CacheTier::HighResolution => &self.high_res,
        }
    }

    pub fn thumbnails(&self) -> &Arc<ThumbnailCache> {
        &self.thumbnails
    }

    pub fn physical_memory(&self) -> u64 {
        self.physical_memory
    }

    /// Drop every cached buffer in both tiers and all thumbnails.
    pub async fn clear_all(&self) {
        self.standard.remove_all().await;
        self.high_res.remove_all().await;
        self.thumbnails.clear();
    }
}
