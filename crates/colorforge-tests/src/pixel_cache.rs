//! Integration tests for the pixel buffer cache.
//!
//! Buffers are real `PixelBuffer`s so costs come from `memory_size()`
//! exactly as they do in the pipeline.

use colorforge_cache::{CacheTier, PixelBufferCache};
use colorforge_core::{PixelBuffer, PixelFormat, SharedPixelBuffer, MIB};
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

/// A single-channel buffer of exactly `mb` MiB.
fn buffer_mb(mb: u32) -> SharedPixelBuffer {
    Arc::new(PixelBuffer::new(1024, 1024 * mb, PixelFormat::Gray8))
}

/// A buffer of exactly `kb` KiB.
fn buffer_kb(kb: u32) -> SharedPixelBuffer {
    Arc::new(PixelBuffer::new(1024, kb, PixelFormat::Gray8))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

// ── Scenarios ──────────────────────────────────────────────────

#[tokio::test]
async fn three_images_over_budget_evict_the_oldest() {
    let cache = PixelBufferCache::with_limit(CacheTier::Standard, 250 * MIB);

    cache.set(buffer_mb(100), "img1").await;
    cache.set(buffer_mb(100), "img2").await;
    cache.set(buffer_mb(100), "img3").await;

    assert!(cache.get("img1").is_none(), "LRU image should be evicted");
    assert!(cache.get("img2").is_some());
    assert!(cache.get("img3").is_some());
    assert_eq!(cache.cost_of("img1").await, 0);
    assert_eq!(cache.total_cost(), 200 * MIB);
}

#[tokio::test]
async fn recently_read_image_survives_eviction() {
    let cache = PixelBufferCache::with_limit(CacheTier::Standard, 2 * MIB);
    let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    cache.set_id(buffer_mb(1), a).await;
    cache.set_id(buffer_mb(1), b).await;
    cache.set_id(buffer_mb(1), c).await; // evicts a
    assert!(cache.peek_id(a).is_none());

    assert!(cache.get_id(b).is_some());
    cache.set_id(buffer_mb(1), d).await; // evicts c, not b

    assert!(cache.peek_id(b).is_some());
    assert!(cache.peek_id(c).is_none());
    assert!(cache.peek_id(d).is_some());
}

#[tokio::test]
async fn oversized_buffer_is_still_cached() {
    let cache = PixelBufferCache::with_limit(CacheTier::HighResolution, 4 * MIB);
    cache.set(buffer_mb(1), "thumb").await;
    cache.set(buffer_mb(10), "full").await;

    assert!(cache.get("full").is_some());
    assert!(cache.get("thumb").is_none());
    assert_eq!(cache.total_cost(), 10 * MIB);
    assert_eq!(cache.cost_of("full").await, 10 * MIB);

    // The next insertion pushes the oversized entry out.
    cache.set(buffer_mb(1), "next").await;
    assert!(cache.get("full").is_none());
    assert_eq!(cache.keys(), vec!["next".to_string()]);
}

#[tokio::test]
async fn replacing_a_key_charges_the_new_size_only() {
    let cache = PixelBufferCache::with_limit(CacheTier::Standard, 10 * MIB);
    cache.set(buffer_mb(4), "edit").await;
    cache.set(buffer_mb(2), "other").await;

    let replacement = buffer_mb(1);
    cache.set(Arc::clone(&replacement), "edit").await;

    assert!(Arc::ptr_eq(&cache.get("edit").unwrap(), &replacement));
    assert_eq!(cache.cost_of("edit").await, MIB);
    assert_eq!(cache.cost_of("other").await, 2 * MIB);
    assert_eq!(cache.total_cost(), 3 * MIB);
    assert_eq!(cache.stats().evictions, 0);
}

#[tokio::test]
async fn removal_of_missing_key_changes_nothing() {
    let cache = PixelBufferCache::with_limit(CacheTier::Standard, 10 * MIB);
    cache.set(buffer_mb(1), "a").await;
    let before = (cache.keys(), cache.total_cost(), cache.ledger_total().await);

    cache.remove("b").await;
    cache.remove_id(Uuid::new_v4()).await;

    let after = (cache.keys(), cache.total_cost(), cache.ledger_total().await);
    assert_eq!(before, after);
}

#[tokio::test]
async fn remove_all_forgets_every_key() {
    let cache = PixelBufferCache::with_limit(CacheTier::Standard, 10 * MIB);
    let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
    for id in &ids {
        cache.set_id(buffer_kb(64), *id).await;
    }

    cache.remove_all().await;

    for id in &ids {
        assert!(!cache.contains(*id));
    }
    assert_eq!(cache.total_cost(), 0);
    assert_eq!(cache.ledger_total().await, 0);
}

#[tokio::test]
async fn image_view_wraps_the_cached_buffer() {
    let cache = PixelBufferCache::with_limit(CacheTier::Standard, 10 * MIB);
    let id = Uuid::new_v4();
    let buffer = Arc::new(PixelBuffer::new(300, 200, PixelFormat::Rgba16F));
    cache.set_id(Arc::clone(&buffer), id).await;

    let image = cache.get_image(id).unwrap();
    assert!(Arc::ptr_eq(image.buffer(), &buffer));
    assert_eq!(image.extent().width, 300);
    assert_eq!(image.extent().height, 200);
    assert!(cache.get_image(Uuid::new_v4()).is_none());
}

// ── Properties ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Set { key: u8, kb: u32 },
    Get { key: u8 },
    Remove { key: u8 },
    Limit { kb: u32 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..12, 1u32..96).prop_map(|(key, kb)| Op::Set { key, kb }),
        2 => (0u8..12).prop_map(|key| Op::Get { key }),
        1 => (0u8..12).prop_map(|key| Op::Remove { key }),
        1 => (32u32..512).prop_map(|kb| Op::Limit { kb }),
    ]
}

/// Reference model: a recency queue (front = LRU) with per-key costs. The
/// limit is enforced lazily, on the next set or remove.
struct Model {
    order: VecDeque<(String, usize)>,
    limit: usize,
}

impl Model {
    fn total(&self) -> usize {
        self.order.iter().map(|(_, cost)| cost).sum()
    }

    fn touch(&mut self, key: &str) -> bool {
        match self.order.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                let entry = self.order.remove(pos).unwrap();
                self.order.push_back(entry);
                true
            }
            None => false,
        }
    }

    fn trim(&mut self) {
        while self.total() > self.limit && self.order.len() > 1 {
            self.order.pop_front();
        }
    }

    fn set(&mut self, key: &str, cost: usize) {
        self.order.retain(|(k, _)| k != key);
        self.order.push_back((key.to_string(), cost));
        self.trim();
    }

    fn remove(&mut self, key: &str) {
        self.order.retain(|(k, _)| k != key);
        self.trim();
    }
}

proptest! {
    #[test]
    fn cache_matches_lru_model(ops in proptest::collection::vec(op(), 1..120)) {
        let limit = 256 * 1024;
        let rt = runtime();
        let cache = PixelBufferCache::with_limit(CacheTier::Standard, limit);
        let mut model = Model { order: VecDeque::new(), limit };

        for op in ops {
            match op {
                Op::Set { key, kb } => {
                    let key = key.to_string();
                    rt.block_on(cache.set(buffer_kb(kb), key.clone()));
                    model.set(&key, kb as usize * 1024);
                    prop_assert_eq!(rt.block_on(cache.cost_of(&key)), kb as usize * 1024);
                    prop_assert!(cache.total_cost() <= model.limit || cache.len() == 1);
                }
                Op::Get { key } => {
                    let key = key.to_string();
                    prop_assert_eq!(cache.get(&key).is_some(), model.touch(&key));
                }
                Op::Remove { key } => {
                    let key = key.to_string();
                    rt.block_on(cache.remove(&key));
                    model.remove(&key);
                    prop_assert!(cache.total_cost() <= model.limit || cache.len() <= 1);
                }
                Op::Limit { kb } => {
                    model.limit = kb as usize * 1024;
                    cache.set_total_cost_limit_bytes(model.limit);
                }
            }

            let expected: Vec<String> = model.order.iter().map(|(k, _)| k.clone()).collect();
            prop_assert_eq!(cache.keys(), expected);
            prop_assert_eq!(cache.total_cost(), model.total());
            prop_assert_eq!(rt.block_on(cache.ledger_total()), cache.total_cost());
        }
    }
}
