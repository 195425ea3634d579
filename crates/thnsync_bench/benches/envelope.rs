//! Envelope build and validation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::tempdir;
use thnsync_bench::source_tree;
use thnsync_chunker::{Chunker, ChunkerConfig};
use thnsync_manifest::{
    build_cdc_envelope, build_raw_envelope, summarize_manifest, validate, Envelope, Manifest,
};

/// Benchmark building envelopes from a source tree.
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(20);
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();

    for files in [10, 100] {
        let tree = source_tree(files, 32 * 1024);
        group.bench_with_input(BenchmarkId::new("raw", files), &tree, |b, tree| {
            b.iter(|| black_box(build_raw_envelope(tree.path(), Some("web")).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("cdc", files), &tree, |b, tree| {
            b.iter(|| {
                black_box(build_cdc_envelope(tree.path(), Some("web"), &chunker, None).unwrap())
            });
        });
    }

    group.finish();
}

/// Benchmark an incremental build where nothing changed.
fn bench_incremental(c: &mut Criterion) {
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let tree = source_tree(100, 32 * 1024);
    let first = build_cdc_envelope(tree.path(), Some("web"), &chunker, None).unwrap();
    let index = match &first.manifest {
        Manifest::CdcDelta(m) => m.snapshot_index(),
        Manifest::RawZip(_) => unreachable!(),
    };

    c.bench_function("build/cdc_unchanged_100", |b| {
        b.iter(|| {
            black_box(
                build_cdc_envelope(tree.path(), Some("web"), &chunker, Some(&index)).unwrap(),
            )
        });
    });
}

/// Benchmark writing, reading and checking envelopes.
fn bench_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    group.sample_size(20);
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let tree = source_tree(50, 64 * 1024);
    let envelope = build_cdc_envelope(tree.path(), Some("web"), &chunker, None).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.tar");
    envelope.write_to(&path).unwrap();

    group.bench_function("write", |b| {
        b.iter(|| envelope.write_to(black_box(&path)).unwrap());
    });
    group.bench_function("read", |b| {
        b.iter(|| black_box(Envelope::read_from(black_box(&path)).unwrap()));
    });
    group.bench_function("verify_payload", |b| {
        b.iter(|| envelope.verify_payload().unwrap());
    });

    let value = envelope.manifest.to_value();
    group.bench_function("validate", |b| {
        b.iter(|| validate(black_box(&value)).unwrap());
    });
    group.bench_function("summarize", |b| {
        b.iter(|| black_box(summarize_manifest(black_box(&value))));
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_incremental, bench_roundtrip);
criterion_main!(benches);
