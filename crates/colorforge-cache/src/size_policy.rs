//! Byte budgets derived from physical memory.

use colorforge_core::memory_budget::{HIGH_RES_FRACTION, STANDARD_FRACTION};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pixel buffer cache an entry lives in.
///
/// The tiers are budgeted separately so working previews and full-size
/// buffers never compete for the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTier {
    /// Screen-sized working buffers.
    Standard,
    /// Full-resolution buffers for export and 1:1 preview.
    HighResolution,
}

impl CacheTier {
    pub const ALL: [CacheTier; 2] = [CacheTier::Standard, CacheTier::HighResolution];

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::HighResolution => "high-res",
        }
    }

    /// Share of physical memory the tier gets by default.
    pub fn default_fraction(&self) -> f64 {
        match self {
            Self::Standard => STANDARD_FRACTION,
            Self::HighResolution => HIGH_RES_FRACTION,
        }
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `physical_bytes × fraction`, truncated. Negative or NaN fractions give 0.
pub fn budget_for(physical_bytes: u64, fraction: f64) -> usize {
    // Float-to-int `as` saturates, which is the behaviour we want at both ends.
    (physical_bytes as f64 * fraction) as usize
}

/// Budget calculator for one cache.
///
/// Physical memory is captured once when the policy is built and never
/// re-queried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheSizePolicy {
    physical_memory: u64,
    fraction: f64,
}

impl CacheSizePolicy {
    pub fn new(physical_memory: u64, fraction: f64) -> Self {
        Self {
            physical_memory,
            fraction,
        }
    }

    /// Policy using the tier's default fraction.
    pub fn for_tier(tier: CacheTier, physical_memory: u64) -> Self {
        Self::new(physical_memory, tier.default_fraction())
    }

    /// Policy whose budget is exactly `limit_bytes`.
    ///
    /// The limit stands in for physical memory, so percentages passed to
    /// [`budget_for_percentage`](Self::budget_for_percentage) are taken of it.
    pub fn fixed(limit_bytes: usize) -> Self {
        Self::new(limit_bytes as u64, 1.0)
    }

    /// Budget in bytes.
    pub fn budget(&self) -> usize {
        budget_for(self.physical_memory, self.fraction)
    }

    /// Budget for an explicit percentage of physical memory (0-100).
    pub fn budget_for_percentage(&self, percentage: f64) -> usize {
        budget_for(self.physical_memory, percentage.clamp(0.0, 100.0) / 100.0)
    }

    pub fn physical_memory(&self) -> u64 {
        self.physical_memory
    }
}
