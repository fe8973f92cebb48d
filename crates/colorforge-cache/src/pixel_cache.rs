//! Pixel buffer cache, one instance per tier.
//!
//! Producers (decode and processing stages) store buffers with `set`;
//! consumers (renderer, thumbnail strip) call `get` before deciding whether
//! to recompute. Entries can be evicted at any time by unrelated insertions,
//! so a miss always means "recompute or reload", never an error.
//!
//! ```ignore
//! cache.set_id(buffer, item.id).await;
//!
//! if let Some(image) = cache.get_image(item.id) {
//!     // hand to the renderer
//! }
//!
//! cache.remove_id(item.id).await;
//! ```

use crate::bounded::{BoundedKeyedCache, CacheStats, EvictionListener};
use crate::config::CacheConfig;
use crate::cost_ledger::CostLedger;
use crate::size_policy::{CacheSizePolicy, CacheTier};
use colorforge_core::{bytes_to_mb, RenderImage, SharedPixelBuffer, GIB, MIB};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Cache key for an image id: the upper-case hyphenated form, e.g.
/// `67E55044-10B1-426F-9247-BB680E5FE0C8`.
pub fn key_for_id(id: Uuid) -> String {
    id.as_hyphenated().to_string().to_uppercase()
}

/// Logs evicted buffers while enabled.
struct EvictionLogger {
    tier: CacheTier,
    enabled: Arc<AtomicBool>,
}

impl EvictionListener<String, SharedPixelBuffer> for EvictionLogger {
    fn on_evict(&self, key: &String, _buffer: &SharedPixelBuffer, cost: usize) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let size_mb = bytes_to_mb(cost);
        info!(
            tier = %self.tier,
            key = %key,
            size_mb,
            "Evicting Buffer with key: {key} (size: {size_mb:.2} MB)"
        );
    }
}

/// Cost-bounded LRU cache of decoded pixel buffers.
///
/// Reads are synchronous. Mutations are async because they serialize on the
/// cost ledger; the ledger lock is held across the whole update so the
/// ledger and the store always agree once a mutation completes.
pub struct PixelBufferCache {
    tier: CacheTier,
    cache: BoundedKeyedCache<String, SharedPixelBuffer>,
    ledger: CostLedger,
    policy: CacheSizePolicy,
    log_evictions: Arc<AtomicBool>,
}

impl PixelBufferCache {
    /// Create a cache sized by `policy`, with eviction logging on.
    pub fn new(tier: CacheTier, policy: CacheSizePolicy) -> Self {
        let log_evictions = Arc::new(AtomicBool::new(true));
        let cache = BoundedKeyedCache::new(policy.budget()).with_eviction_listener(EvictionLogger {
            tier,
            enabled: Arc::clone(&log_evictions),
        });

        debug!(
            tier = %tier,
            limit_mb = bytes_to_mb(policy.budget()),
            "Pixel buffer cache created"
        );

        Self {
            tier,
            cache,
            ledger: CostLedger::new(),
            policy,
            log_evictions,
        }
    }

    /// Create a cache with an exact byte limit.
    pub fn with_limit(tier: CacheTier, limit_bytes: usize) -> Self {
        Self::new(tier, CacheSizePolicy::fixed(limit_bytes))
    }

    /// Create a tier from configuration, sized against `physical_memory`.
    pub fn from_config(tier: CacheTier, config: &CacheConfig, physical_memory: u64) -> Self {
        let cache = Self::new(
            tier,
            CacheSizePolicy::new(physical_memory, config.fraction_for(tier)),
        );
        cache.set_log_evictions(config.log_evictions);
        cache
    }

    pub fn tier(&self) -> CacheTier {
        self.tier
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Look up a buffer. A hit marks it most recently used.
    pub fn get(&self, key: &str) -> Option<SharedPixelBuffer> {
        self.cache.value(key)
    }

    pub fn get_id(&self, id: Uuid) -> Option<SharedPixelBuffer> {
        self.get(&key_for_id(id))
    }

    /// Whether a buffer is cached for `id`.
    ///
    /// This is a full `get` and refreshes recency. Use
    /// [`peek_id`](Self::peek_id) to check without promoting.
    pub fn contains(&self, id: Uuid) -> bool {
        self.get_id(id).is_some()
    }

    /// Look up without touching recency.
    pub fn peek_id(&self, id: Uuid) -> Option<SharedPixelBuffer> {
        self.cache.peek(key_for_id(id).as_str())
    }

    /// Fetch as a renderer image.
    pub fn get_image(&self, id: Uuid) -> Option<RenderImage> {
        self.get_id(id).map(RenderImage::from_buffer)
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Store `buffer` under `key`, replacing any previous buffer.
    ///
    /// The entry is charged `buffer.memory_size()` bytes. Entries evicted to
    /// make room are logged (when enabled) and dropped from the ledger.
    pub async fn set(&self, buffer: SharedPixelBuffer, key: impl Into<String>) {
        let key = key.into();
        let cost = buffer.memory_size();

        let mut ledger = self.ledger.lock().await;
        let evicted = self.cache.set_value(buffer, key.clone(), cost);
        ledger.set_cost(key, cost);
        for entry in &evicted {
            ledger.remove_cost(&entry.key);
        }

        if !evicted.is_empty() {
            debug!(
                tier = %self.tier,
                evicted = evicted.len(),
                total_mb = bytes_to_mb(self.cache.total_cost()),
                "Cache trimmed to limit"
            );
        }
    }

    pub async fn set_id(&self, buffer: SharedPixelBuffer, id: Uuid) {
        self.set(buffer, key_for_id(id)).await;
    }

    /// Drop the buffer for `key`. Absent keys are ignored, but a lowered
    /// limit is still enforced.
    pub async fn remove(&self, key: &str) {
        let mut ledger = self.ledger.lock().await;
        let (_, evicted) = self.cache.remove_value(key);
        ledger.remove_cost(key);
        for entry in &evicted {
            ledger.remove_cost(&entry.key);
        }

        if !evicted.is_empty() {
            debug!(
                tier = %self.tier,
                evicted = evicted.len(),
                total_mb = bytes_to_mb(self.cache.total_cost()),
                "Cache trimmed to limit"
            );
        }
    }

    pub async fn remove_id(&self, id: Uuid) {
        self.remove(&key_for_id(id)).await;
    }

    /// Drop every buffer.
    pub async fn remove_all(&self) {
        let mut ledger = self.ledger.lock().await;
        self.cache.remove_all();
        ledger.remove_all_costs();
        debug!(tier = %self.tier, "Cache cleared");
    }

    // ── Limits ─────────────────────────────────────────────────────

    pub fn total_cost_limit_bytes(&self) -> usize {
        self.cache.total_cost_limit()
    }

    /// Change the byte limit. Enforced on the next `set` or `remove`.
    pub fn set_total_cost_limit_bytes(&self, limit: usize) {
        self.cache.set_total_cost_limit(limit);
    }

    /// Resize to `percentage` (0-100) of physical memory. Enforced on the
    /// next `set` or `remove`.
    pub fn set_cache_limit_as_percentage_of_ram(&self, percentage: f64) {
        let limit = self.policy.budget_for_percentage(percentage);
        self.cache.set_total_cost_limit(limit);
        info!(
            tier = %self.tier,
            percentage,
            limit_mb = bytes_to_mb(limit),
            "Cache limit updated"
        );
    }

    pub fn log_evictions(&self) -> bool {
        self.log_evictions.load(Ordering::Relaxed)
    }

    pub fn set_log_evictions(&self, enabled: bool) {
        self.log_evictions.store(enabled, Ordering::Relaxed);
    }

    // ── Telemetry ──────────────────────────────────────────────────

    /// Ledger cost for `key`, or 0 if it is not cached.
    pub async fn cost_of(&self, key: &str) -> usize {
        self.ledger.cost(key).await
    }

    /// Sum of ledger costs.
    pub async fn ledger_total(&self) -> usize {
        self.ledger.total().await
    }

    /// Sum of the costs of resident buffers.
    pub fn total_cost(&self) -> usize {
        self.cache.total_cost()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Keys currently held, least recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.cache.keys().collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn total_ram_bytes(&self) -> u64 {
        self.policy.physical_memory()
    }

    pub fn total_ram_mb(&self) -> f64 {
        self.policy.physical_memory() as f64 / MIB as f64
    }

    pub fn total_ram_gb(&self) -> f64 {
        self.policy.physical_memory() as f64 / GIB as f64
    }
}
