//! Cache configuration.
//!
//! Loaded from `cache.json` in the user config directory when present:
//!
//! ```text
//! {
//!   "standard_fraction": 0.6,
//!   "high_res_fraction": 0.2,
//!   "log_evictions": true,
//!   "thumbnail_budget_bytes": 268435456
//! }
//! ```
//!
//! Missing fields take their defaults.

use crate::size_policy::CacheTier;
use colorforge_core::memory_budget::{HIGH_RES_FRACTION, STANDARD_FRACTION, THUMBNAIL_BUDGET};
use colorforge_core::{physical_memory_or_fallback, ColorForgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for all caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Share of physical memory for the standard-resolution tier.
    pub standard_fraction: f64,
    /// Share of physical memory for the high-resolution tier.
    pub high_res_fraction: f64,
    /// Log one line per evicted buffer.
    pub log_evictions: bool,
    /// Byte budget for the thumbnail cache.
    pub thumbnail_budget_bytes: usize,
    /// Use this instead of querying the host (constrained hosts, tests).
    pub physical_memory_override: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            standard_fraction: STANDARD_FRACTION,
            high_res_fraction: HIGH_RES_FRACTION,
            log_evictions: true,
            thumbnail_budget_bytes: THUMBNAIL_BUDGET,
            physical_memory_override: None,
        }
    }
}

impl CacheConfig {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("colorforge").join("cache.json"))
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            ColorForgeError::Serialization(format!("Failed to parse cache config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ColorForgeError::Serialization(format!("Failed to serialize cache config: {e}"))
        })
    }

    /// Reject fractions outside (0, 1] or tiers that together claim more
    /// than all of physical memory.
    pub fn validate(&self) -> Result<()> {
        for (name, fraction) in [
            ("standard_fraction", self.standard_fraction),
            ("high_res_fraction", self.high_res_fraction),
        ] {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ColorForgeError::Config(format!(
                    "{name} must be in (0, 1], got {fraction}"
                )));
            }
        }

        let combined = self.standard_fraction + self.high_res_fraction;
        if combined > 1.0 {
            return Err(ColorForgeError::Config(format!(
                "tier fractions sum to {combined}, which exceeds physical memory"
            )));
        }

        if self.physical_memory_override == Some(0) {
            return Err(ColorForgeError::InvalidParameter(
                "physical_memory_override must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Fraction configured for a tier.
    pub fn fraction_for(&self, tier: CacheTier) -> f64 {
        match tier {
            CacheTier::Standard => self.standard_fraction,
            CacheTier::HighResolution => self.high_res_fraction,
        }
    }

    /// Physical memory to size against: the override if set, otherwise the
    /// host value.
    pub fn physical_memory(&self) -> u64 {
        self.physical_memory_override
            .unwrap_or_else(physical_memory_or_fallback)
    }
}
