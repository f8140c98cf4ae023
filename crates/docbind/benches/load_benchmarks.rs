//! Loader throughput benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use docbind::prelude::*;
use std::hint::black_box;
use std::path::PathBuf;
use tempfile::TempDir;

const MIB: usize = 1024 * 1024;

/// Write a file of roughly `size` bytes in `encoding`
fn setup_file(dir: &TempDir, size: usize, encoding: &'static encoding_rs::Encoding) -> PathBuf {
    let line = "The quick brown fox — 素早い茶色の狐 — быстрая лиса\n";
    let text = line.repeat(size / line.len() + 1);
    let (bytes, _, _) = encoding.encode(&text);
    let path = dir.path().join(format!("{}-{}.txt", encoding.name(), size));
    std::fs::write(&path, &bytes).expect("Failed to write bench file");
    path
}

fn bench_load_by_chunk_size(c: &mut Criterion) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = setup_file(&dir, 8 * MIB, encoding_rs::UTF_8);

    let mut group = c.benchmark_group("load_utf8_8mib");
    group.throughput(Throughput::Bytes(8 * MIB as u64));
    group.sample_size(20);

    for chunk in [64 * 1024, MIB, 4 * MIB] {
        let config = DocumentConfig::builder()
            .chunk_size(chunk)
            .build()
            .expect("valid config");
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &config, |b, config| {
            b.iter(|| {
                let mut buffer = MemoryBuffer::new();
                load_file(&mut buffer, black_box(&path), config).expect("load failed")
            })
        });
    }
    group.finish();
}

fn bench_load_legacy_encoding(c: &mut Criterion) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = setup_file(&dir, 4 * MIB, encoding_rs::GB18030);
    let config = DocumentConfig::default();

    let mut group = c.benchmark_group("load_gb18030_4mib");
    group.throughput(Throughput::Bytes(4 * MIB as u64));
    group.sample_size(20);
    group.bench_function("default_config", |b| {
        b.iter(|| {
            let mut buffer = MemoryBuffer::new();
            load_file(&mut buffer, black_box(&path), &config).expect("load failed")
        })
    });
    group.finish();
}

fn bench_detect(c: &mut Criterion) {
    let text = "日本語の文章です。".repeat(4096);
    let (sample, _, _) = encoding_rs::SHIFT_JIS.encode(&text);
    let config = DetectionConfig::default();

    c.bench_function("detect_shift_jis_sample", |b| {
        b.iter(|| detect(black_box(&sample), &config))
    });
}

criterion_group!(
    benches,
    bench_load_by_chunk_size,
    bench_load_legacy_encoding,
    bench_detect
);
criterion_main!(benches);
