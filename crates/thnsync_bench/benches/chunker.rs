//! Chunker benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use thnsync_bench::random_data;
use thnsync_chunker::{chunk_id, compute_stats, Chunker, ChunkerConfig};

/// Benchmark chunking in-memory buffers of various sizes.
fn bench_chunk_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_bytes");
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();

    for size in [64 * 1024, 1024 * 1024, 8 * 1024 * 1024] {
        let data = random_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let chunks = chunker.chunk_bytes(black_box(data));
                black_box(chunks);
            });
        });
    }

    group.finish();
}

/// Benchmark streaming from a reader against the buffered path.
fn bench_chunk_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_reader");
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let data = random_data(4 * 1024 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("cursor_4mib", |b| {
        b.iter(|| {
            let chunks = chunker.chunk_reader(Cursor::new(black_box(&data))).unwrap();
            black_box(chunks);
        });
    });

    group.finish();
}

/// Benchmark chunk sizing against configured bounds.
fn bench_bounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounds");
    let data = random_data(1024 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for (min, avg, max) in [(512, 2048, 8192), (2048, 8192, 65536), (16384, 65536, 262144)] {
        let chunker = Chunker::new(ChunkerConfig::new(min, avg, max)).unwrap();
        group.bench_with_input(BenchmarkId::new("max", max), &data, |b, data| {
            b.iter(|| black_box(chunker.chunk_bytes(data)));
        });
    }

    group.finish();
}

/// Benchmark hashing and stats.
fn bench_ids_and_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("ids");
    let block = random_data(64 * 1024);
    group.throughput(Throughput::Bytes(block.len() as u64));
    group.bench_function("chunk_id_64kib", |b| {
        b.iter(|| black_box(chunk_id(black_box(&block))));
    });
    group.finish();

    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let mut data = random_data(2 * 1024 * 1024);
    data.extend_from_within(..1024 * 1024);
    let chunks = chunker.chunk_bytes(&data);
    c.bench_function("compute_stats", |b| {
        b.iter(|| black_box(compute_stats(black_box(&chunks))));
    });
}

criterion_group!(
    benches,
    bench_chunk_bytes,
    bench_chunk_reader,
    bench_bounds,
    bench_ids_and_stats,
);
criterion_main!(benches);
