//! # Chunk Events
//!
//! Everything the rendering/collision host needs to mirror the cache.
//! Payloads are shared and immutable; the host may keep them as long as it
//! likes.

use std::sync::Arc;

use tessera_procedural::{Image, MeshPayload};

use crate::chunk::ChunkCoord;

/// A change the host should apply.
#[derive(Clone, Debug)]
pub enum ChunkEvent {
    /// A chunk's colour-map texture is ready for upload.
    TextureReady {
        /// Chunk the texture belongs to.
        coord: ChunkCoord,
        /// The texture.
        texture: Arc<Image>,
    },
    /// A chunk's active geometry changed.
    MeshInstalled {
        /// Chunk the mesh belongs to.
        coord: ChunkCoord,
        /// LOD index of the mesh.
        lod: usize,
        /// The mesh; replaces any previous one for this chunk.
        mesh: Arc<MeshPayload>,
    },
    /// A chunk was evicted; release its resources.
    Unloaded {
        /// The evicted chunk.
        coord: ChunkCoord,
    },
}

impl ChunkEvent {
    /// Chunk the event concerns.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        match self {
            Self::TextureReady { coord, .. } | Self::MeshInstalled { coord, .. } | Self::Unloaded { coord } => *coord,
        }
    }
}
