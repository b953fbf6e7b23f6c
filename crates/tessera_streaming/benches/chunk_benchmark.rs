//! Benchmark for chunk streaming throughput.
//!
//! TARGET: a 5x5 neighbourhood of 241-sample chunks fully meshed in under
//! one second on a 4-core machine
//!
//! Run with: cargo bench --package tessera_streaming --bench chunk_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tessera_procedural::{GenerationSettings, TerrainGenerator, TerrainPipeline};
use tessera_shared::Vec2;
use tessera_streaming::{ChunkManager, InlineExecutor, StreamingConfig, WorkerPool};

fn generator(resolution: usize) -> Arc<dyn TerrainPipeline> {
    let settings = GenerationSettings {
        chunk_resolution: resolution,
        ..GenerationSettings::default()
    };
    match TerrainGenerator::new(settings) {
        Ok(generator) => Arc::new(generator),
        Err(e) => panic!("benchmark settings rejected: {e}"),
    }
}

fn benchmark_neighbourhood_pool(c: &mut Criterion) {
    let pipeline = generator(241);
    let pool = match WorkerPool::new(4) {
        Ok(pool) => Arc::new(pool),
        Err(e) => panic!("worker pool failed: {e}"),
    };

    let mut group = c.benchmark_group("neighbourhood");
    group.throughput(Throughput::Elements(25));
    group.sample_size(10);

    group.bench_function("5x5_chunks_worker_pool", |b| {
        b.iter(|| {
            let mut manager = match ChunkManager::new(StreamingConfig::production(), pipeline.clone(), pool.clone()) {
                Ok(manager) => manager,
                Err(e) => panic!("{e}"),
            };
            manager.update(Vec2::ZERO);
            manager.flush_generation_queue();
            black_box(manager.loaded_chunk_count())
        });
    });

    group.finish();
}

fn benchmark_walk_inline(c: &mut Criterion) {
    let pipeline = generator(17);

    let mut group = c.benchmark_group("walk");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("1000_steps_small_chunks_inline", |b| {
        b.iter(|| {
            let mut manager = match ChunkManager::new(StreamingConfig::test(), pipeline.clone(), Arc::new(InlineExecutor)) {
                Ok(manager) => manager,
                Err(e) => panic!("{e}"),
            };
            for step in 0..1000 {
                manager.tick(&Vec2::new(step as f32, (step / 3) as f32));
            }
            manager.flush_generation_queue();
            black_box(manager.stats().chunks_created)
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_neighbourhood_pool, benchmark_walk_inline);
criterion_main!(benches);
