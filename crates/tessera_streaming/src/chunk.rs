//! # Chunk Records
//!
//! Per-coordinate lifecycle state owned by the [`crate::ChunkManager`].
//!
//! ## Lifecycle
//!
//! ```text
//! Created -> MapRequested -> MapReady -> MeshRequested(lod) -> MeshReady(lod)
//!                                  ^                                 |
//!                                  +----- another lod selected ------+
//! ```
//!
//! Each LOD slot moves `Empty -> Requested -> Ready` exactly once. A ready
//! mesh stays cached until the chunk is evicted.

use std::sync::Arc;

use tessera_procedural::{Image, MapData, MeshPayload};
use tessera_shared::Vec2;

/// Integer chunk coordinate on the XZ plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not world units).
    pub x: i32,
    /// Z coordinate (in chunks, not world units).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk whose centre is nearest to world position `(x, z)`.
    ///
    /// Chunks are centred on `coord * chunk_world_size`, so this rounds
    /// rather than floors. Halves round away from zero.
    #[inline]
    #[must_use]
    pub fn from_world_pos(x: f32, z: f32, chunk_world_size: f32) -> Self {
        Self {
            x: (x / chunk_world_size).round() as i32,
            z: (z / chunk_world_size).round() as i32,
        }
    }

    /// World-space centre of this chunk.
    #[inline]
    #[must_use]
    pub fn world_center(self, chunk_world_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_world_size, self.z as f32 * chunk_world_size)
    }

    /// Number of chunk steps to `other` along the worse axis.
    #[inline]
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Distance from `point` to the nearest edge of this chunk's square.
    ///
    /// Zero when `point` is inside the chunk.
    #[must_use]
    pub fn distance_to_bounds(self, point: Vec2, chunk_world_size: f32) -> f32 {
        let center = self.world_center(chunk_world_size);
        let half = chunk_world_size * 0.5;
        let dx = ((point.x - center.x).abs() - half).max(0.0);
        let dz = ((point.y - center.y).abs() - half).max(0.0);
        (dx * dx + dz * dz).sqrt()
    }
}

/// Where a chunk is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Record exists, nothing requested yet.
    Created,
    /// Map generation is in flight.
    MapRequested,
    /// Heights, colours and texture are available; no LOD chosen yet.
    MapReady,
    /// The selected LOD's mesh is in flight.
    MeshRequested(usize),
    /// The selected LOD's mesh is built.
    MeshReady(usize),
}

/// Progress of the map for one chunk.
#[derive(Clone, Debug, Default)]
pub enum MapSlot {
    /// Not requested.
    #[default]
    Empty,
    /// Generation in flight.
    Requested,
    /// Generation finished.
    Ready {
        /// Heights and colours.
        map: Arc<MapData>,
        /// Colour-map texture, absent if synthesis failed.
        texture: Option<Arc<Image>>,
    },
}

/// Progress of one LOD mesh for one chunk.
#[derive(Clone, Debug, Default)]
pub enum MeshSlot {
    /// Not requested.
    #[default]
    Empty,
    /// Build in flight.
    Requested,
    /// Built and cached.
    Ready(Arc<MeshPayload>),
}

/// One entry of the chunk cache.
#[derive(Debug)]
pub struct ChunkRecord {
    coord: ChunkCoord,
    epoch: u64,
    pub(crate) map: MapSlot,
    pub(crate) meshes: Vec<MeshSlot>,
    pub(crate) selected_lod: Option<usize>,
    pub(crate) installed_lod: Option<usize>,
}

impl ChunkRecord {
    pub(crate) fn new(coord: ChunkCoord, epoch: u64, lod_count: usize) -> Self {
        Self {
            coord,
            epoch,
            map: MapSlot::Empty,
            meshes: vec![MeshSlot::Empty; lod_count],
            selected_lod: None,
            installed_lod: None,
        }
    }

    /// The chunk's coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Creation stamp; a recreated chunk gets a new one.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ChunkState {
        match (&self.map, self.selected_lod) {
            (MapSlot::Empty, _) => ChunkState::Created,
            (MapSlot::Requested, _) => ChunkState::MapRequested,
            (MapSlot::Ready { .. }, None) => ChunkState::MapReady,
            (MapSlot::Ready { .. }, Some(lod)) => match self.meshes.get(lod) {
                Some(MeshSlot::Ready(_)) => ChunkState::MeshReady(lod),
                Some(MeshSlot::Requested) => ChunkState::MeshRequested(lod),
                _ => ChunkState::MapReady,
            },
        }
    }

    /// Map progress.
    #[must_use]
    pub fn map_slot(&self) -> &MapSlot {
        &self.map
    }

    /// Heights and colours, once generated.
    #[must_use]
    pub fn map(&self) -> Option<&Arc<MapData>> {
        match &self.map {
            MapSlot::Ready { map, .. } => Some(map),
            _ => None,
        }
    }

    /// Colour-map texture, once generated.
    #[must_use]
    pub fn texture(&self) -> Option<&Arc<Image>> {
        match &self.map {
            MapSlot::Ready { texture, .. } => texture.as_ref(),
            _ => None,
        }
    }

    /// Progress of LOD `lod`, or `None` if the index is out of range.
    #[must_use]
    pub fn mesh_slot(&self, lod: usize) -> Option<&MeshSlot> {
        self.meshes.get(lod)
    }

    /// Cached mesh for LOD `lod`.
    #[must_use]
    pub fn mesh(&self, lod: usize) -> Option<&Arc<MeshPayload>> {
        match self.meshes.get(lod) {
            Some(MeshSlot::Ready(mesh)) => Some(mesh),
            _ => None,
        }
    }

    /// LOD the policy currently wants.
    #[must_use]
    pub const fn selected_lod(&self) -> Option<usize> {
        self.selected_lod
    }

    /// LOD whose mesh is the chunk's active geometry.
    #[must_use]
    pub const fn installed_lod(&self) -> Option<usize> {
        self.installed_lod
    }

    /// The active geometry handed to the host.
    #[must_use]
    pub fn installed_mesh(&self) -> Option<&Arc<MeshPayload>> {
        self.installed_lod.and_then(|lod| self.mesh(lod))
    }

    /// Number of LOD meshes built so far.
    #[must_use]
    pub fn cached_mesh_count(&self) -> usize {
        self.meshes.iter().filter(|s| matches!(s, MeshSlot::Ready(_))).count()
    }
}
