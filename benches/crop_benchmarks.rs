//! Crop and JPEG encode benchmarks
//!
//! Run with: cargo bench --bench crop_benchmarks

use crabsnap::testing::synthetic_frame;
use crabsnap::{crop_and_encode, default_aspect_ratios, CropRect};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_crop_rect(c: &mut Criterion) {
    let ratios = default_aspect_ratios();
    c.bench_function("crop_rect_all_ratios", |b| {
        b.iter(|| {
            for ratio in &ratios {
                black_box(CropRect::centered(black_box(1920), black_box(1080), ratio).unwrap());
            }
        })
    });
}

fn bench_crop_and_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop_and_encode");
    group.sample_size(20);

    for (width, height) in [(640u32, 480u32), (1280, 720), (1920, 1080)] {
        let frame = synthetic_frame(0, width, height, "bench");
        for ratio in default_aspect_ratios() {
            group.bench_with_input(
                BenchmarkId::new(format!("{}x{}", width, height), &ratio.label),
                &ratio,
                |b, ratio| b.iter(|| crop_and_encode(black_box(&frame), ratio, 92)),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_crop_rect, bench_crop_and_encode);
criterion_main!(benches);
