//! Benchmark for heightmap mesh building at each LOD stride.
//!
//! Run with: cargo bench --package tessera_procedural --bench mesh_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tessera_procedural::mesh::{self, samples_per_line};
use tessera_procedural::noise::{self, NoiseParameters};
use tessera_procedural::HeightCurve;
use tessera_shared::MAP_CHUNK_SIZE;

fn benchmark_lod_strides(c: &mut Criterion) {
    let field = noise::generate(MAP_CHUNK_SIZE, MAP_CHUNK_SIZE, &NoiseParameters::default());
    let curve = HeightCurve::default();

    let mut group = c.benchmark_group("mesh_build");
    for stride in [1usize, 2, 4, 8] {
        let per_line = samples_per_line(MAP_CHUNK_SIZE, stride) as u64;
        group.throughput(Throughput::Elements(per_line * per_line));
        group.bench_with_input(BenchmarkId::from_parameter(stride), &stride, |b, &stride| {
            b.iter(|| black_box(mesh::build(black_box(&field), 30.0, &curve, stride)));
        });
    }
    group.finish();
}

fn benchmark_interleave(c: &mut Criterion) {
    let field = noise::generate(MAP_CHUNK_SIZE, MAP_CHUNK_SIZE, &NoiseParameters::default());
    let payload = mesh::build(&field, 30.0, &HeightCurve::default(), 1);

    c.bench_function("interleave_full_chunk", |b| {
        b.iter(|| black_box(payload.interleaved()));
    });
}

criterion_group!(benches, benchmark_lod_strides, benchmark_interleave);
criterion_main!(benches);
