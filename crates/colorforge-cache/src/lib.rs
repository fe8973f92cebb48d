//! ColorForge Cache - cost-bounded caches for decoded pixel buffers
//!
//! Two pixel buffer tiers (standard and high resolution) are each sized to a
//! fixed share of physical memory, so the cache subsystem as a whole never
//! claims more than a known fraction of RAM regardless of how many images
//! are open.

pub mod bounded;
pub mod config;
pub mod context;
pub mod cost_ledger;
pub mod pixel_cache;
pub mod size_policy;
pub mod thumbnail;

pub use bounded::{BoundedKeyedCache, CacheStats, EvictionListener, Evicted};
pub use config::CacheConfig;
pub use context::CacheContext;
pub use cost_ledger::{CostLedger, LedgerGuard};
pub use pixel_cache::{key_for_id, PixelBufferCache};
pub use size_policy::{budget_for, CacheSizePolicy, CacheTier};
pub use thumbnail::ThumbnailCache;
