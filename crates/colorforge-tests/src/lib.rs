//! Integration test crate for ColorForge.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the core and cache crates to verify they work together.

#[cfg(test)]
mod pixel_cache;

#[cfg(test)]
mod tiers;
