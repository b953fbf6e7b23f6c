//! # Chunk Manager
//!
//! Owns the coordinate -> [`ChunkRecord`] cache and drives every chunk
//! through its lifecycle around a moving viewer.
//!
//! ## Threading
//!
//! ```text
//!   control thread                          executor
//!   --------------                          --------
//!   update(viewer) --request_map--------->  generate_map + texture
//!                                               |
//!   poll_completions() <----- channel ----------+
//!     on_map_ready --request_mesh(lod)--->  generate_mesh
//!                                               |
//!   poll_completions() <----- channel ----------+
//!     on_mesh_ready -> install if still selected
//! ```
//!
//! Only the control thread touches the cache. Jobs own clones of their
//! inputs and report back over a channel; nothing is cancelled, superseded
//! results are dropped when they are applied.
//!
//! ## Epochs
//!
//! Every record is stamped when it is created. A result carries the stamp of
//! the record that asked for it, so a chunk that is evicted and recreated
//! never receives its predecessor's results.
//!
//! ## Failures
//!
//! A pipeline call that panics is caught inside its job and reported as a
//! failed completion. The slot goes back to empty, so the mesh is requested
//! again on the next LOD refresh and the map on the next viewer refresh.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tessera_procedural::{chunk_center, Image, MapData, MeshPayload, TerrainGenerator, TerrainPipeline};
use tessera_shared::Vec2;

use crate::chunk::{ChunkCoord, ChunkRecord, MapSlot, MeshSlot};
use crate::config::{EvictionPolicy, StreamingConfig, WorldConfig};
use crate::error::StreamingResult;
use crate::events::ChunkEvent;
use crate::executor::{panic_message, Executor, Job, JobKind, WorkerPool};
use crate::viewer::ViewerFeed;

/// Result of asking for map or mesh generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A job was scheduled.
    Issued,
    /// Already in flight; nothing scheduled.
    AlreadyPending,
    /// Already generated; nothing scheduled.
    AlreadyReady,
    /// Mesh requested before the chunk's map exists.
    MapNotReady,
    /// No record for that coordinate.
    UnknownChunk,
}

/// Result of delivering a finished map or mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Stored and made active.
    Installed,
    /// Stored in the LOD cache but not made active: that LOD is no longer
    /// selected.
    Stale,
    /// The slot was already filled; the result was dropped.
    Duplicate,
    /// The LOD index is not in the table; the result was dropped.
    UnknownLod,
    /// The chunk is gone; the result was dropped.
    Evicted,
}

/// Running counters since the manager was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Records created.
    pub chunks_created: u64,
    /// Records evicted.
    pub chunks_evicted: u64,
    /// Map jobs scheduled.
    pub map_requests: u64,
    /// Mesh jobs scheduled.
    pub mesh_requests: u64,
    /// Requests ignored because the work was pending or done.
    pub duplicate_requests: u64,
    /// Meshes made active.
    pub meshes_installed: u64,
    /// Meshes cached without being installed.
    pub stale_results: u64,
    /// Results dropped because their chunk was gone.
    pub discarded_results: u64,
    /// Times a chunk's selected LOD changed.
    pub lod_switches: u64,
    /// Jobs whose pipeline call panicked.
    pub failed_jobs: u64,
}

enum Completion {
    Map {
        coord: ChunkCoord,
        epoch: u64,
        map: MapData,
        texture: Option<Image>,
    },
    Mesh {
        coord: ChunkCoord,
        epoch: u64,
        lod: usize,
        mesh: MeshPayload,
    },
    Failed {
        epoch: u64,
        kind: JobKind,
        reason: String,
    },
}

/// What a LOD refresh decided for one chunk.
enum LodAction {
    Nothing,
    Install(usize, Arc<MeshPayload>),
    Request(usize),
}

/// Streaming chunk cache.
///
/// ## Usage
///
/// ```rust,ignore
/// let mut manager = ChunkManager::from_world_config(WorldConfig::load("config/terrain.toml")?)?;
///
/// // Every frame:
/// manager.tick(&|| player_position());
/// for event in manager.drain_events() {
///     // Upload textures, swap meshes, free unloaded chunks...
/// }
/// ```
pub struct ChunkManager {
    config: StreamingConfig,
    chunk_resolution: usize,
    chunk_world_size: f32,
    pipeline: Arc<dyn TerrainPipeline>,
    executor: Arc<dyn Executor>,
    chunks: HashMap<ChunkCoord, ChunkRecord>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    in_flight: usize,
    next_epoch: u64,
    viewer_position: Vec2,
    last_refresh_position: Option<Vec2>,
    viewer_chunk: Option<ChunkCoord>,
    events: Vec<ChunkEvent>,
    stats: StreamingStats,
}

impl ChunkManager {
    /// Creates a manager around an injected pipeline and executor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StreamingError::InvalidParameter`] if `config` does
    /// not fit the pipeline's chunk resolution.
    pub fn new(
        config: StreamingConfig,
        pipeline: Arc<dyn TerrainPipeline>,
        executor: Arc<dyn Executor>,
    ) -> StreamingResult<Self> {
        let chunk_resolution = pipeline.chunk_resolution();
        config.validate(chunk_resolution)?;
        let chunk_world_size = config.chunk_world_size(chunk_resolution);
        let (completion_tx, completion_rx) = unbounded();

        tracing::info!(
            radius = config.radius,
            chunk_resolution,
            chunk_world_size,
            lod_levels = config.lod_levels.len(),
            "chunk manager created"
        );

        Ok(Self {
            config,
            chunk_resolution,
            chunk_world_size,
            pipeline,
            executor,
            chunks: HashMap::new(),
            completion_tx,
            completion_rx,
            in_flight: 0,
            next_epoch: 0,
            viewer_position: Vec2::ZERO,
            last_refresh_position: None,
            viewer_chunk: None,
            events: Vec::new(),
            stats: StreamingStats::default(),
        })
    }

    /// Creates a manager with a [`WorkerPool`] of `config.worker_threads`.
    ///
    /// # Errors
    ///
    /// As [`ChunkManager::new`], plus [`crate::StreamingError::Io`] if a
    /// worker cannot be spawned.
    pub fn with_worker_pool(config: StreamingConfig, pipeline: Arc<dyn TerrainPipeline>) -> StreamingResult<Self> {
        let pool = WorkerPool::new(config.worker_threads)?;
        Self::new(config, pipeline, Arc::new(pool))
    }

    /// Builds the default generator and a worker pool from a world config.
    ///
    /// # Errors
    ///
    /// Any validation or thread-spawn failure.
    pub fn from_world_config(config: WorldConfig) -> StreamingResult<Self> {
        let generator = TerrainGenerator::new(config.generation)?;
        Self::with_worker_pool(config.streaming, Arc::new(generator))
    }

    // =========================================================================
    // Desired set
    // =========================================================================

    /// The `(2 * radius + 1)^2` square of coordinates centred on `center`.
    ///
    /// A negative radius yields just `center`.
    #[must_use]
    pub fn desired_coordinates(center: ChunkCoord, radius: i32) -> HashSet<ChunkCoord> {
        let radius = radius.max(0);
        (-radius..=radius)
            .flat_map(|dz| (-radius..=radius).map(move |dx| ChunkCoord::new(center.x + dx, center.z + dz)))
            .collect()
    }

    /// Creates records for new coordinates in `desired`, requests their maps
    /// (nearest first), then applies the eviction policy.
    pub fn reconcile(&mut self, desired: &HashSet<ChunkCoord>) {
        let anchor = self.viewer_chunk.unwrap_or_default();
        let mut fresh: Vec<ChunkCoord> = desired.iter().copied().filter(|c| !self.chunks.contains_key(c)).collect();
        fresh.sort_by_key(|c| (c.chebyshev_distance(anchor), c.z, c.x));

        let lod_count = self.config.lod_levels.len();
        for coord in fresh {
            let epoch = self.next_epoch;
            self.next_epoch += 1;
            self.chunks.insert(coord, ChunkRecord::new(coord, epoch, lod_count));
            self.stats.chunks_created += 1;
            tracing::debug!(x = coord.x, z = coord.z, epoch, "chunk created");
            // Fresh record: always issues
            let _ = self.request_map(coord);
        }

        if let EvictionPolicy::OutsideRadius { margin } = self.config.eviction {
            let doomed: Vec<ChunkCoord> = self
                .chunks
                .keys()
                .copied()
                .filter(|c| desired.iter().all(|d| d.chebyshev_distance(*c) > margin))
                .collect();
            for coord in doomed {
                self.evict(coord);
            }
        }
    }

    /// Removes a record. Undrained events for it are dropped, so a host
    /// never sees a texture or mesh for a chunk that is already gone.
    fn evict(&mut self, coord: ChunkCoord) {
        if self.chunks.remove(&coord).is_some() {
            self.stats.chunks_evicted += 1;
            self.events.retain(|event| event.coord() != coord);
            self.events.push(ChunkEvent::Unloaded { coord });
            tracing::debug!(x = coord.x, z = coord.z, "chunk evicted");
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Schedules map generation for `coord`, at most once per record.
    pub fn request_map(&mut self, coord: ChunkCoord) -> RequestOutcome {
        let Some(record) = self.chunks.get_mut(&coord) else {
            return RequestOutcome::UnknownChunk;
        };
        match record.map {
            MapSlot::Requested => {
                self.stats.duplicate_requests += 1;
                tracing::debug!(x = coord.x, z = coord.z, "map already requested");
                return RequestOutcome::AlreadyPending;
            }
            MapSlot::Ready { .. } => {
                self.stats.duplicate_requests += 1;
                tracing::debug!(x = coord.x, z = coord.z, "map already generated");
                return RequestOutcome::AlreadyReady;
            }
            MapSlot::Empty => record.map = MapSlot::Requested,
        }

        let epoch = record.epoch();
        let center = chunk_center(coord.x, coord.z, self.chunk_resolution);
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.completion_tx.clone();

        self.stats.map_requests += 1;
        self.in_flight += 1;
        let kind = JobKind::Map(coord);
        self.executor.execute(Job::new(kind, move || {
            let generated = panic::catch_unwind(AssertUnwindSafe(|| {
                let map = pipeline.generate_map(center);
                let texture = match pipeline.synthesize_texture(&map) {
                    Ok(texture) => Some(texture),
                    Err(e) => {
                        tracing::warn!(x = coord.x, z = coord.z, error = %e, "texture synthesis failed");
                        None
                    }
                };
                (map, texture)
            }));
            let completion = match generated {
                Ok((map, texture)) => Completion::Map { coord, epoch, map, texture },
                Err(payload) => Completion::Failed {
                    epoch,
                    kind,
                    reason: panic_message(payload.as_ref()),
                },
            };
            if tx.send(completion).is_err() {
                tracing::trace!("chunk manager dropped before map completion");
            }
        }));
        RequestOutcome::Issued
    }

    /// Schedules mesh generation for one LOD of `coord`, at most once per
    /// record and LOD. Indices past the coarsest level are clamped to it.
    pub fn request_mesh(&mut self, coord: ChunkCoord, lod: usize) -> RequestOutcome {
        let lod = lod.min(self.config.lod_levels.len() - 1);
        let Some(record) = self.chunks.get_mut(&coord) else {
            return RequestOutcome::UnknownChunk;
        };
        let Some(map) = record.map().cloned() else {
            return RequestOutcome::MapNotReady;
        };
        match record.meshes[lod] {
            MeshSlot::Requested => {
                self.stats.duplicate_requests += 1;
                tracing::debug!(x = coord.x, z = coord.z, lod, "mesh already requested");
                return RequestOutcome::AlreadyPending;
            }
            MeshSlot::Ready(_) => {
                self.stats.duplicate_requests += 1;
                tracing::debug!(x = coord.x, z = coord.z, lod, "mesh already built");
                return RequestOutcome::AlreadyReady;
            }
            MeshSlot::Empty => record.meshes[lod] = MeshSlot::Requested,
        }

        let epoch = record.epoch();
        let stride = self.config.lod_levels.stride(lod);
        let pipeline = Arc::clone(&self.pipeline);
        let tx = self.completion_tx.clone();

        self.stats.mesh_requests += 1;
        self.in_flight += 1;
        let kind = JobKind::Mesh { coord, lod };
        self.executor.execute(Job::new(kind, move || {
            let generated = panic::catch_unwind(AssertUnwindSafe(|| pipeline.generate_mesh(&map.heights, stride)));
            let completion = match generated {
                Ok(mesh) => Completion::Mesh { coord, epoch, lod, mesh },
                Err(payload) => Completion::Failed {
                    epoch,
                    kind,
                    reason: panic_message(payload.as_ref()),
                },
            };
            if tx.send(completion).is_err() {
                tracing::trace!("chunk manager dropped before mesh completion");
            }
        }));
        RequestOutcome::Issued
    }

    // =========================================================================
    // Completions
    // =========================================================================

    /// Stores a finished map, publishes its texture, then selects a LOD and
    /// installs or requests the matching mesh.
    pub fn on_map_ready(&mut self, coord: ChunkCoord, map: MapData, texture: Option<Image>) -> InstallOutcome {
        let Some(record) = self.chunks.get_mut(&coord) else {
            self.note_orphan(coord, "map");
            return InstallOutcome::Evicted;
        };
        if matches!(record.map, MapSlot::Ready { .. }) {
            return InstallOutcome::Duplicate;
        }

        let texture = texture.map(Arc::new);
        record.map = MapSlot::Ready {
            map: Arc::new(map),
            texture: texture.clone(),
        };
        if let Some(texture) = texture {
            self.events.push(ChunkEvent::TextureReady { coord, texture });
        }
        tracing::trace!(x = coord.x, z = coord.z, "map ready");

        self.refresh_lod(coord);
        InstallOutcome::Installed
    }

    /// LOD the policy picks for `coord` with the viewer at `viewer`.
    ///
    /// Distance is measured from the viewer to the chunk's square, so the
    /// chunk under the viewer is always LOD 0.
    #[must_use]
    pub fn select_lod(&self, coord: ChunkCoord, viewer: Vec2) -> usize {
        let distance = coord.distance_to_bounds(viewer, self.chunk_world_size);
        self.config.lod_levels.select(distance)
    }

    /// Caches a finished mesh and installs it only if `lod` is still the
    /// chunk's selected LOD.
    pub fn on_mesh_ready(&mut self, coord: ChunkCoord, lod: usize, mesh: MeshPayload) -> InstallOutcome {
        let Some(record) = self.chunks.get_mut(&coord) else {
            self.note_orphan(coord, "mesh");
            return InstallOutcome::Evicted;
        };
        let Some(slot) = record.meshes.get_mut(lod) else {
            tracing::warn!(x = coord.x, z = coord.z, lod, "mesh for unknown LOD dropped");
            return InstallOutcome::UnknownLod;
        };
        if matches!(slot, MeshSlot::Ready(_)) {
            return InstallOutcome::Duplicate;
        }

        let mesh = Arc::new(mesh);
        *slot = MeshSlot::Ready(Arc::clone(&mesh));

        if record.selected_lod == Some(lod) {
            record.installed_lod = Some(lod);
            self.stats.meshes_installed += 1;
            self.events.push(ChunkEvent::MeshInstalled { coord, lod, mesh });
            tracing::trace!(x = coord.x, z = coord.z, lod, "mesh installed");
            InstallOutcome::Installed
        } else {
            self.stats.stale_results += 1;
            tracing::trace!(
                x = coord.x,
                z = coord.z,
                lod,
                selected = ?record.selected_lod,
                "stale mesh cached, not installed"
            );
            InstallOutcome::Stale
        }
    }

    fn note_orphan(&mut self, coord: ChunkCoord, what: &'static str) {
        self.stats.discarded_results += 1;
        if self.config.eviction == EvictionPolicy::Never {
            tracing::warn!(x = coord.x, z = coord.z, what, "result for unknown chunk");
        } else {
            tracing::trace!(x = coord.x, z = coord.z, what, "result for evicted chunk discarded");
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Map { coord, epoch, map, texture } => {
                if self.is_current(coord, epoch) {
                    let _ = self.on_map_ready(coord, map, texture);
                } else {
                    self.note_orphan(coord, "map");
                }
            }
            Completion::Mesh { coord, epoch, lod, mesh } => {
                if self.is_current(coord, epoch) {
                    let _ = self.on_mesh_ready(coord, lod, mesh);
                } else {
                    self.note_orphan(coord, "mesh");
                }
            }
            Completion::Failed { epoch, kind, reason } => self.on_job_failed(epoch, kind, &reason),
        }
    }

    /// Frees the slot a failed job held so the work can be requested again.
    fn on_job_failed(&mut self, epoch: u64, kind: JobKind, reason: &str) {
        self.stats.failed_jobs += 1;
        let (coord, lod) = match kind {
            JobKind::Map(coord) => (coord, None),
            JobKind::Mesh { coord, lod } => (coord, Some(lod)),
        };
        tracing::error!(x = coord.x, z = coord.z, ?kind, reason, "generation job panicked");

        let Some(record) = self.chunks.get_mut(&coord).filter(|r| r.epoch() == epoch) else {
            return;
        };
        match lod {
            None => record.map = MapSlot::Empty,
            Some(lod) => {
                if let Some(slot) = record.meshes.get_mut(lod) {
                    *slot = MeshSlot::Empty;
                }
            }
        }
    }

    fn is_current(&self, coord: ChunkCoord, epoch: u64) -> bool {
        self.chunks.get(&coord).is_some_and(|r| r.epoch() == epoch)
    }

    /// Applies every completion that has arrived. Returns how many.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Blocks until every scheduled job, including jobs scheduled while
    /// waiting, has completed and been applied. Jobs that panicked count as
    /// completed.
    ///
    /// With a [`crate::DeferredExecutor`] the caller must release the jobs
    /// first or this never returns.
    pub fn flush_generation_queue(&mut self) {
        while self.in_flight > 0 {
            match self.completion_rx.recv() {
                Ok(completion) => self.apply(completion),
                Err(_) => break,
            }
        }
    }

    // =========================================================================
    // Viewer
    // =========================================================================

    /// Records the viewer position. If it moved more than the configured
    /// threshold since the last refresh (or this is the first call),
    /// reconciles the desired set and reselects every chunk's LOD.
    ///
    /// Returns true if a refresh happened.
    pub fn update(&mut self, viewer: Vec2) -> bool {
        self.viewer_position = viewer;
        let threshold = self.config.update_move_threshold;
        let moved = self
            .last_refresh_position
            .map_or(true, |last| last.distance_squared(viewer) > threshold * threshold);
        if !moved {
            return false;
        }
        self.last_refresh_position = Some(viewer);

        let center = ChunkCoord::from_world_pos(viewer.x, viewer.y, self.chunk_world_size);
        if self.viewer_chunk != Some(center) {
            tracing::debug!(x = center.x, z = center.z, "viewer entered chunk");
        }
        self.viewer_chunk = Some(center);

        let desired = Self::desired_coordinates(center, self.config.radius);
        self.reconcile(&desired);

        // Only maps whose job failed are still empty here
        let retry: Vec<ChunkCoord> = self
            .chunks
            .values()
            .filter(|r| matches!(r.map_slot(), MapSlot::Empty))
            .map(ChunkRecord::coord)
            .collect();
        for coord in retry {
            let _ = self.request_map(coord);
        }

        let ready: Vec<ChunkCoord> = self
            .chunks
            .values()
            .filter(|r| r.map().is_some())
            .map(ChunkRecord::coord)
            .collect();
        for coord in ready {
            self.refresh_lod(coord);
        }
        true
    }

    /// Samples `feed`, updates, then applies arrived completions.
    /// Returns how many completions were applied.
    pub fn tick(&mut self, feed: &dyn ViewerFeed) -> usize {
        self.update(feed.viewer_position());
        self.poll_completions()
    }

    fn refresh_lod(&mut self, coord: ChunkCoord) {
        let lod = self.select_lod(coord, self.viewer_position);
        let Some(record) = self.chunks.get_mut(&coord) else {
            return;
        };
        if record.map().is_none() {
            return;
        }

        if record.selected_lod != Some(lod) {
            if let Some(previous) = record.selected_lod {
                self.stats.lod_switches += 1;
                tracing::debug!(x = coord.x, z = coord.z, from = previous, to = lod, "LOD switch");
            }
            record.selected_lod = Some(lod);
        }

        let action = match &record.meshes[lod] {
            MeshSlot::Ready(mesh) if record.installed_lod != Some(lod) => LodAction::Install(lod, Arc::clone(mesh)),
            MeshSlot::Empty => LodAction::Request(lod),
            _ => LodAction::Nothing,
        };

        match action {
            LodAction::Nothing => {}
            LodAction::Install(lod, mesh) => {
                record.installed_lod = Some(lod);
                self.stats.meshes_installed += 1;
                self.events.push(ChunkEvent::MeshInstalled { coord, lod, mesh });
                tracing::trace!(x = coord.x, z = coord.z, lod, "cached mesh installed");
            }
            LodAction::Request(lod) => {
                let _ = self.request_mesh(coord, lod);
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Takes every event produced since the last call.
    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Counters since creation.
    #[must_use]
    pub fn stats(&self) -> &StreamingStats {
        &self.stats
    }

    /// The record for `coord`.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&ChunkRecord> {
        self.chunks.get(&coord)
    }

    /// All records, in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.chunks.values()
    }

    /// Number of records in the cache.
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Jobs scheduled but not yet applied.
    #[must_use]
    pub const fn pending_jobs(&self) -> usize {
        self.in_flight
    }

    /// Chunk under the viewer at the last refresh.
    #[must_use]
    pub const fn viewer_chunk(&self) -> Option<ChunkCoord> {
        self.viewer_chunk
    }

    /// Last position passed to [`ChunkManager::update`].
    #[must_use]
    pub const fn viewer_position(&self) -> Vec2 {
        self.viewer_position
    }

    /// World units spanned by one chunk.
    #[must_use]
    pub const fn chunk_world_size(&self) -> f32 {
        self.chunk_world_size
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }
}

impl std::fmt::Debug for ChunkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkManager")
            .field("chunks", &self.chunks.len())
            .field("in_flight", &self.in_flight)
            .field("viewer_chunk", &self.viewer_chunk)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
