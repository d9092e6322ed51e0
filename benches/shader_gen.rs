//! Benchmarks for shader generation and CPU-side state packing.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use texflow::layout::FieldLayout;
use texflow::prelude::*;
use texflow::shaders;

fn bench_shader_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("shader_gen");

    group.bench_function("compute_flow_field", |b| {
        b.iter(|| black_box(shaders::compute_shader(FLOW_FIELD_UPDATE)))
    });

    group.bench_function("compute_identity", |b| {
        b.iter(|| black_box(shaders::compute_shader(IDENTITY_UPDATE)))
    });

    group.bench_function("render", |b| b.iter(|| black_box(shaders::render_shader())));

    group.finish();
}

fn bench_state_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_points");

    for count in [1_000u32, 40_000, 250_000] {
        let points = PointSet::fibonacci_sphere(count, 3.0);
        let layout = FieldLayout::for_point_count(count).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(layout.pack_points(points.positions())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_shader_generation, bench_state_packing);
criterion_main!(benches);
