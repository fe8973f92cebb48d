//! Integration tests for tier sizing and the shared cache context.

use colorforge_cache::{budget_for, CacheConfig, CacheContext, CacheSizePolicy, CacheTier};
use colorforge_core::{PixelBuffer, GIB, MIB};
use std::sync::Arc;
use uuid::Uuid;

fn context(physical: u64) -> CacheContext {
    let config = CacheConfig {
        physical_memory_override: Some(physical),
        log_evictions: false,
        ..Default::default()
    };
    CacheContext::new(&config).unwrap()
}

#[test]
fn tier_budgets_follow_physical_memory() {
    for physical in [8 * GIB as u64, 16 * GIB as u64, 64 * GIB as u64, 3_000_000_007] {
        let standard = CacheSizePolicy::for_tier(CacheTier::Standard, physical).budget();
        let high_res = CacheSizePolicy::for_tier(CacheTier::HighResolution, physical).budget();

        assert!((standard as f64 - physical as f64 * 0.6).abs() <= 1.0);
        assert!((high_res as f64 - physical as f64 * 0.2).abs() <= 1.0);
        assert!(standard + high_res <= budget_for(physical, 0.8) + 1);
    }
}

#[test]
fn context_tiers_are_independent() {
    let ctx = context(8 * GIB as u64);
    assert_ne!(
        ctx.standard().total_cost_limit_bytes(),
        ctx.high_res().total_cost_limit_bytes()
    );

    ctx.high_res().set_total_cost_limit_bytes(MIB);
    assert_eq!(ctx.tier(CacheTier::HighResolution).total_cost_limit_bytes(), MIB);
    assert!(ctx.standard().total_cost_limit_bytes() > MIB);
}

#[tokio::test]
async fn filling_one_tier_does_not_evict_the_other() {
    let ctx = context(8 * GIB as u64);
    ctx.high_res().set_total_cost_limit_bytes(MIB);

    let preview = Uuid::new_v4();
    ctx.standard()
        .set_id(Arc::new(PixelBuffer::test_pattern(256, 256)), preview)
        .await;

    for _ in 0..8 {
        ctx.high_res()
            .set_id(Arc::new(PixelBuffer::test_pattern(512, 512)), Uuid::new_v4())
            .await;
    }

    assert!(ctx.standard().contains(preview));
    assert_eq!(ctx.high_res().len(), 1);
    assert_eq!(ctx.high_res().stats().evictions, 7);
}

#[tokio::test]
async fn percentage_resize_applies_on_next_insert() {
    let ctx = context(100 * MIB as u64);
    let standard = ctx.standard();

    for _ in 0..10 {
        standard
            .set_id(Arc::new(PixelBuffer::test_pattern(512, 512)), Uuid::new_v4())
            .await;
    }
    assert_eq!(standard.len(), 10);

    standard.set_cache_limit_as_percentage_of_ram(5.0);
    assert_eq!(standard.total_cost_limit_bytes(), 5 * MIB);
    assert_eq!(standard.len(), 10);

    standard
        .set_id(Arc::new(PixelBuffer::test_pattern(512, 512)), Uuid::new_v4())
        .await;
    assert_eq!(standard.len(), 5);
    assert_eq!(standard.total_cost(), 5 * MIB);
}
