//! Throughput of the concurrent LRU cache under insert/load/eviction pressure.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use longlp_server::Cache;

fn benchmark_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_insert");

    for &entries in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("fresh_keys", entries), &entries, |b, &entries| {
            b.iter(|| {
                let cache = Cache::new(entries * 64);
                for i in 0..entries {
                    cache.try_insert(&format!("key-{i}"), vec![0u8; 32]);
                }
                black_box(cache.occupancy())
            })
        });
    }

    group.finish();
}

fn benchmark_load(c: &mut Criterion) {
    let cache = Cache::new(1 << 20);
    for i in 0..1_000 {
        cache.try_insert(&format!("key-{i}"), vec![0u8; 64]);
    }

    c.bench_function("cache_load_hit", |b| {
        let mut out = Vec::new();
        b.iter(|| {
            out.clear();
            black_box(cache.try_load("key-500", &mut out));
        })
    });
}

fn benchmark_eviction_churn(c: &mut Criterion) {
    // Capacity only fits ~16 entries; every insert past that point evicts.
    let cache = Cache::new(16 * 64);

    c.bench_function("cache_eviction_churn", |b| {
        let mut i = 0usize;
        b.iter(|| {
            cache.try_insert(&format!("churn-{i}"), vec![0u8; 64]);
            i += 1;
        })
    });
}

criterion_group!(benches, benchmark_insert, benchmark_load, benchmark_eviction_churn);
criterion_main!(benches);
