//! ColorForge Core - Foundation types for photo editing
//!
//! This crate provides the fundamental types shared by the pipeline and
//! the caches:
//! - Pixel buffers and pixel formats
//! - The image handle the renderer consumes
//! - Host memory queries used to size caches

pub mod error;
pub mod frame;
pub mod image;
pub mod memory;

pub use error::{ColorForgeError, Result};
pub use frame::{PixelBuffer, PixelBufferBuilder, PixelFormat, PixelPlane, SharedPixelBuffer};
pub use image::{Extent, RenderImage};
pub use memory::{bytes_to_mb, physical_memory_bytes, physical_memory_or_fallback, GIB, MIB};

/// Memory budget fractions for the cache tiers.
pub mod memory_budget {
    /// Share of physical memory reserved for the standard-resolution tier
    /// before the working-set factor is applied.
    pub const STANDARD_RESERVE: f64 = 0.8;

    /// Working-set factor applied to the standard reserve.
    pub const STANDARD_WORKING_SET: f64 = 0.75;

    /// Standard-resolution tier budget (60% of physical memory).
    pub const STANDARD_FRACTION: f64 = STANDARD_RESERVE * STANDARD_WORKING_SET;

    /// High-resolution tier budget (20% of physical memory).
    pub const HIGH_RES_FRACTION: f64 = 0.2;

    /// Thumbnail cache budget.
    pub const THUMBNAIL_BUDGET: usize = 256 * 1024 * 1024; // 256 MB

    /// Number of images decoded ahead when a folder is opened.
    pub const WARMUP_LIMIT: usize = 30;
}
