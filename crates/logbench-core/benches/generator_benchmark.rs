//! Benchmarks for content generation and COPY payload size.
//!
//! Run with: cargo bench -p logbench-core

#![allow(clippy::pedantic)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use logbench_core::generator::ContentGenerator;
use logbench_core::model::ContentSize;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One document per size class.
fn bench_generate(c: &mut Criterion) {
    let generator = ContentGenerator::new();
    let mut group = c.benchmark_group("generate_content");

    for size in ContentSize::ALL {
        group.bench_with_input(BenchmarkId::new("size", size), &size, |b, &size| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| black_box(generator.generate(&mut rng, size)))
        });
    }
    group.finish();
}

/// Generation plus JSON encoding, as done for each COPY row.
fn bench_encode(c: &mut Criterion) {
    let generator = ContentGenerator::new();
    let mut group = c.benchmark_group("encode_content");

    for size in ContentSize::ALL {
        let mut rng = StdRng::seed_from_u64(7);
        let sample = generator.generate(&mut rng, size);
        let bytes = sample.to_json().map(|s| s.len()).unwrap_or(0);
        group.throughput(Throughput::Bytes(bytes as u64));

        group.bench_with_input(BenchmarkId::new("size", size), &sample, |b, content| {
            b.iter(|| black_box(content.to_json()))
        });
    }
    group.finish();
}

/// jsonb-style text rendering used by in-memory matching.
fn bench_to_text(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(9);
    let large = ContentGenerator::new().generate(&mut rng, ContentSize::Large);

    c.bench_function("to_text_large", |b| b.iter(|| black_box(large.to_text())));
}

criterion_group!(benches, bench_generate, bench_encode, bench_to_text);
criterion_main!(benches);
