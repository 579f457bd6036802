//! Throughput of `Buffer`'s push/delimiter-search hot path, which runs once
//! per `recv()` on every connection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use longlp_server::buffer::Buffer;

fn benchmark_push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_push_back");
    let chunk = vec![b'x'; 2048];

    for &pushes in &[1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::new("chunks", pushes), &pushes, |b, &pushes| {
            b.iter(|| {
                let mut buf = Buffer::new();
                for _ in 0..pushes {
                    buf.push_back(black_box(&chunk));
                }
                black_box(buf.size())
            })
        });
    }

    group.finish();
}

fn benchmark_find_and_pop_till(c: &mut Criterion) {
    c.bench_function("find_and_pop_till_request", |b| {
        b.iter(|| {
            let mut buf = Buffer::new();
            buf.push_back_str("GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n");
            black_box(buf.find_and_pop_till(b"\r\n\r\n"))
        })
    });
}

fn benchmark_find_and_pop_till_miss(c: &mut Criterion) {
    // Worst case: the delimiter is never found, so the whole buffer is scanned.
    let filler = "x".repeat(4096);

    c.bench_function("find_and_pop_till_miss", |b| {
        b.iter(|| {
            let mut buf = Buffer::new();
            buf.push_back_str(black_box(&filler));
            black_box(buf.find_and_pop_till(b"\r\n\r\n"))
        })
    });
}

criterion_group!(
    benches,
    benchmark_push_back,
    benchmark_find_and_pop_till,
    benchmark_find_and_pop_till_miss
);
criterion_main!(benches);
