//! Benchmarks for colorforge-cache hot paths.
//!
//! Run with: cargo bench -p colorforge-cache

use colorforge_cache::{BoundedKeyedCache, CacheTier, PixelBufferCache};
use colorforge_core::{PixelBuffer, PixelFormat, MIB};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

fn bench_bounded_hit(c: &mut Criterion) {
    let cache = BoundedKeyedCache::<String, u64>::new(usize::MAX);
    for i in 0..1024u64 {
        cache.set_value(i, format!("key-{i}"), 1);
    }

    c.bench_function("bounded_value_hit", |bencher| {
        bencher.iter(|| cache.value(black_box("key-512")));
    });

    c.bench_function("bounded_value_miss", |bencher| {
        bencher.iter(|| cache.value(black_box("absent")));
    });
}

fn bench_bounded_churn(c: &mut Criterion) {
    // Room for 256 entries, so every insert past that evicts one.
    let cache = BoundedKeyedCache::<u64, u64>::new(256);
    let mut next = 0u64;

    c.bench_function("bounded_set_with_eviction", |bencher| {
        bencher.iter(|| {
            next += 1;
            black_box(cache.set_value(next, next, 1));
        });
    });
}

fn bench_facade(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let cache = PixelBufferCache::with_limit(CacheTier::Standard, 64 * MIB);
    cache.set_log_evictions(false);
    let buffer = Arc::new(PixelBuffer::new(512, 512, PixelFormat::Bgra8)); // 1 MiB

    c.bench_function("facade_set_replace", |bencher| {
        bencher.iter(|| runtime.block_on(cache.set(Arc::clone(&buffer), "preview")));
    });

    c.bench_function("facade_get", |bencher| {
        bencher.iter(|| cache.get(black_box("preview")));
    });
}

criterion_group!(benches, bench_bounded_hit, bench_bounded_churn, bench_facade);
criterion_main!(benches);
