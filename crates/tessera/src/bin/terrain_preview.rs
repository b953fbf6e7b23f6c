//! # Terrain Preview
//!
//! Walks a viewer through a streaming world and writes what was generated
//! as PNG files.
//!
//! ## Usage
//!
//! ```bash
//! terrain_preview --config config/terrain.toml --out preview --steps 8
//! ```

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use tessera::export;
use tessera::prelude::*;

fn fail(context: &str, error: &dyn std::fmt::Display) -> ! {
    eprintln!("error: {context}: {error}");
    process::exit(1);
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         TESSERA TERRAIN PREVIEW                                  ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("config/terrain.toml");
    let mut out_dir = PathBuf::from("preview");
    let mut steps = 8usize;
    let mut step_size: Option<f32> = None;
    let mut write_tiles = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--out" | "-o" => {
                if i + 1 < args.len() {
                    out_dir = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--steps" | "-s" => {
                if i + 1 < args.len() {
                    steps = args[i + 1].parse().unwrap_or(8);
                    i += 1;
                }
            }
            "--step-size" => {
                if i + 1 < args.len() {
                    step_size = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--tiles" => write_tiles = true,
            "--help" | "-h" => {
                println!("Usage: terrain_preview [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>        World file (default: config/terrain.toml)");
                println!("  -o, --out <DIR>            Output directory (default: preview)");
                println!("  -s, --steps <NUM>          Viewer steps east (default: 8)");
                println!("      --step-size <UNITS>    Distance per step (default: one chunk)");
                println!("      --tiles                Also write one PNG per chunk texture");
                println!("  -h, --help                 Show this help");
                return;
            }
            other => eprintln!("ignoring unknown argument {other}"),
        }
        i += 1;
    }

    let config = match WorldConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => fail(&format!("loading {}", config_path.display()), &e),
    };
    let resolution = config.generation.chunk_resolution;

    let mut manager = match ChunkManager::from_world_config(config) {
        Ok(manager) => manager,
        Err(e) => fail("starting chunk manager", &e),
    };
    let step = step_size.unwrap_or_else(|| manager.chunk_world_size());

    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        fail(&format!("creating {}", out_dir.display()), &e);
    }

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ World File:         {}", config_path.display());
    println!("│ Output:             {}", out_dir.display());
    println!("│ Chunk Resolution:   {resolution}");
    println!("│ Chunk Size:         {} units", manager.chunk_world_size());
    println!("│ Radius:             {}", manager.config().radius);
    println!("│ LOD Levels:         {}", manager.config().lod_levels.len());
    println!("│ Steps:              {steps} x {step} units");
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let start = Instant::now();
    let mut position = Vec2::ZERO;
    let mut tiles_written = 0usize;
    let mut meshes_installed = 0usize;
    let mut unloaded = 0usize;

    for n in 0..=steps {
        if n > 0 {
            position.x += step;
        }
        manager.update(position);
        manager.flush_generation_queue();

        for event in manager.drain_events() {
            match event {
                ChunkEvent::TextureReady { coord, texture } => {
                    if write_tiles {
                        let path = out_dir.join(format!("chunk_{}_{}.png", coord.x, coord.z));
                        if let Err(e) = export::save_texture(&texture, &path) {
                            fail(&format!("writing {}", path.display()), &e);
                        }
                        tiles_written += 1;
                    }
                }
                ChunkEvent::MeshInstalled { .. } => meshes_installed += 1,
                ChunkEvent::Unloaded { .. } => unloaded += 1,
            }
        }

        println!(
            "step {n:>3}: viewer ({:.0}, {:.0}) in chunk {:?}, {} chunks loaded",
            position.x,
            position.y,
            manager.viewer_chunk(),
            manager.loaded_chunk_count()
        );
    }

    write_finals(&manager, &out_dir);

    let stats = manager.stats();
    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    PREVIEW COMPLETE                              ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Elapsed:            {:>10.2?}", start.elapsed());
    println!("║ Chunks Created:     {:>10}", stats.chunks_created);
    println!("║ Chunks Evicted:     {:>10}", stats.chunks_evicted);
    println!("║ Map Jobs:           {:>10}", stats.map_requests);
    println!("║ Mesh Jobs:          {:>10}", stats.mesh_requests);
    println!("║ Meshes Installed:   {meshes_installed:>10}");
    println!("║ LOD Switches:       {:>10}", stats.lod_switches);
    println!("║ Stale Results:      {:>10}", stats.stale_results);
    println!("║ Failed Jobs:        {:>10}", stats.failed_jobs);
    println!("║ Unload Events:      {unloaded:>10}");
    println!("║ Tiles Written:      {tiles_written:>10}");
    println!("╚══════════════════════════════════════════════════════════════════╝");
}

/// World mosaic plus the height field under the viewer.
fn write_finals(manager: &ChunkManager, out_dir: &Path) {
    let mosaic_path = out_dir.join("world.png");
    match export::save_world_mosaic(manager, &mosaic_path) {
        Ok(true) => println!("wrote {}", mosaic_path.display()),
        Ok(false) => println!("no textures generated, skipped {}", mosaic_path.display()),
        Err(e) => fail(&format!("writing {}", mosaic_path.display()), &e),
    }

    let Some(map) = manager.viewer_chunk().and_then(|coord| manager.chunk(coord)).and_then(|r| r.map()) else {
        return;
    };
    let height_path = out_dir.join("heightmap.png");
    if let Err(e) = export::save_heightmap(&map.heights, &height_path) {
        fail(&format!("writing {}", height_path.display()), &e);
    }
    println!("wrote {}", height_path.display());
}
