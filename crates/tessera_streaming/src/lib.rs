//! # Tessera Streaming
//!
//! Keeps a square of terrain chunks generated around a moving viewer.
//!
//! ## Design Principles
//!
//! 1. **Single writer**: only the control thread mutates the chunk cache
//! 2. **Exactly once**: each map and each (chunk, LOD) mesh is generated once
//! 3. **Freshest wins**: a late result for a LOD the viewer left is cached,
//!    never installed over the current one
//! 4. **Injected**: the generator and the executor are passed in, never global
//!
//! ## Core Components
//!
//! - `ChunkManager`: cache, lifecycle, LOD selection, eviction
//! - `LodTable`: distance thresholds -> mesh stride
//! - `WorkerPool` / `InlineExecutor` / `DeferredExecutor`: where jobs run
//! - `WorldConfig`: TOML world file (generation + streaming)
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_shared::Vec2;
//! use tessera_streaming::{ChunkManager, WorldConfig};
//!
//! let mut manager = ChunkManager::from_world_config(WorldConfig::default())?;
//!
//! // Viewer at world position (100, 200)
//! manager.update(Vec2::new(100.0, 200.0));
//! manager.flush_generation_queue();
//!
//! assert_eq!(manager.loaded_chunk_count(), 25);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod lod;
pub mod manager;
pub mod viewer;

pub use chunk::{ChunkCoord, ChunkRecord, ChunkState, MapSlot, MeshSlot};
pub use config::{EvictionPolicy, StreamingConfig, WorldConfig};
pub use error::{StreamingError, StreamingResult};
pub use events::ChunkEvent;
pub use executor::{DeferredExecutor, Executor, InlineExecutor, Job, JobKind, WorkerPool};
pub use lod::{LodLevel, LodTable};
pub use manager::{ChunkManager, InstallOutcome, RequestOutcome, StreamingStats};
pub use viewer::ViewerFeed;
