//! # Infinite Walk Integration Test
//!
//! Proves the viewer can walk forever with terrain always underfoot and the
//! cache never growing past its eviction bound.

use std::sync::Arc;
use std::time::Instant;

use tessera_procedural::{GenerationSettings, TerrainGenerator};
use tessera_shared::Vec2;
use tessera_streaming::{ChunkCoord, ChunkManager, EvictionPolicy, StreamingConfig, WorldConfig};

fn walking_manager(config: StreamingConfig) -> ChunkManager {
    let settings = GenerationSettings {
        chunk_resolution: 17,
        ..GenerationSettings::default()
    };
    let generator = Arc::new(TerrainGenerator::new(settings).unwrap());
    ChunkManager::with_worker_pool(config, generator).unwrap()
}

fn assert_ground(manager: &ChunkManager, position: Vec2) {
    let coord = ChunkCoord::from_world_pos(position.x, position.y, manager.chunk_world_size());
    let record = manager
        .chunk(coord)
        .unwrap_or_else(|| panic!("VOID DETECTED: no chunk under {position:?}"));
    assert!(
        record.installed_mesh().is_some(),
        "VOID DETECTED: chunk {coord:?} under {position:?} has no mesh"
    );
}

/// Test: walk 10,000 units east without ever standing on a missing chunk.
#[test]
fn test_infinite_walk_10000_units() {
    let config = StreamingConfig::test();
    let bound = (2 * (config.radius + 1) + 1).pow(2) as usize;
    let mut manager = walking_manager(config);

    let start = Instant::now();
    let mut position = Vec2::ZERO;
    manager.update(position);
    manager.flush_generation_queue();

    for step in 0..10_000 {
        position.x += 1.0;
        manager.tick(&position);

        // Process chunks once per chunk width
        if step % 16 == 0 {
            manager.flush_generation_queue();
            assert_ground(&manager, position);
        }
        assert!(manager.loaded_chunk_count() <= bound, "cache grew to {}", manager.loaded_chunk_count());
    }

    manager.flush_generation_queue();

    println!("Walked 10,000 units in {:?}", start.elapsed());
    println!("Loaded chunks: {}", manager.loaded_chunk_count());
    println!("Created total: {}", manager.stats().chunks_created);
    println!("Evicted total: {}", manager.stats().chunks_evicted);

    assert_ground(&manager, position);
    assert!(manager.stats().chunks_evicted > 0);
}

/// Test: spiral outward, checking ground at every turn.
#[test]
fn test_spiral_walk_coverage() {
    let mut manager = walking_manager(StreamingConfig::test());

    let mut position = Vec2::ZERO;
    let mut direction = 0; // 0=E, 1=S, 2=W, 3=N
    let mut leg_length = 1;
    let mut steps_in_leg = 0;
    let mut legs_completed = 0;

    for step in 0..3000 {
        match direction {
            0 => position.x += 1.0,
            1 => position.y += 1.0,
            2 => position.x -= 1.0,
            _ => position.y -= 1.0,
        }

        steps_in_leg += 1;
        if steps_in_leg >= leg_length {
            steps_in_leg = 0;
            direction = (direction + 1) % 4;
            legs_completed += 1;
            if legs_completed % 2 == 0 {
                leg_length += 1;
            }
        }

        manager.update(position);
        if step % 32 == 0 {
            manager.flush_generation_queue();
            assert_ground(&manager, position);
        }
    }

    manager.flush_generation_queue();
    println!("Final position: {position:?}");
    println!("Chunks loaded: {}", manager.loaded_chunk_count());
    assert_ground(&manager, position);
}

/// Test: teleport across the map and verify chunks generate correctly.
#[test]
fn test_teleport_stress() {
    let mut manager = walking_manager(StreamingConfig::test());

    let teleport_points = [
        (0.0, 0.0),
        (1000.0, 0.0),
        (-1000.0, 500.0),
        (500.0, -1000.0),
        (2000.0, 2000.0),
        (-2000.0, -2000.0),
        (0.0, 0.0),
    ];

    for (x, z) in teleport_points {
        let position = Vec2::new(x, z);
        manager.update(position);
        manager.flush_generation_queue();
        assert_ground(&manager, position);
        assert_eq!(manager.loaded_chunk_count(), 9, "teleport to ({x}, {z}) left stale chunks");
    }
}

/// Test: without eviction the cache keeps everything it ever created.
#[test]
fn test_never_policy_retains_history() {
    let config = StreamingConfig {
        eviction: EvictionPolicy::Never,
        ..StreamingConfig::test()
    };
    let mut manager = walking_manager(config);

    for i in 0..10 {
        manager.update(Vec2::new(i as f32 * 16.0, 0.0));
    }
    manager.flush_generation_queue();

    // 3 rows x (10 + 2) columns
    assert_eq!(manager.loaded_chunk_count(), 36);
    assert_eq!(manager.stats().chunks_evicted, 0);
}

/// Test: the shipped world file drives a full-size manager.
#[test]
fn test_shipped_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/terrain.toml");
    let config = WorldConfig::load(path).unwrap();
    assert_eq!(config.generation.chunk_resolution, 241);

    let mut manager = ChunkManager::from_world_config(config).unwrap();
    manager.update(Vec2::ZERO);
    manager.flush_generation_queue();
    assert_ground(&manager, Vec2::ZERO);
    assert_eq!(manager.loaded_chunk_count(), 25);
}
