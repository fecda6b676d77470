//! # Chunk Module
//!
//! This module provides the `Chunk` struct: one 16x16x16 cube of voxel data at an
//! integer chunk coordinate, its two meshes, and its links to the six adjacent
//! chunks.
//!
//! ## Threading
//!
//! A chunk is shared between the main thread and the loader thread through an
//! `Arc`. Nothing in it needs `&mut`:
//! - every cell is an `AtomicU8`, loaded with `Acquire` and stored with `Release`
//! - lifecycle flags are `AtomicBool`s and act as the hand-off points between
//!   pipeline stages
//! - neighbor links sit behind an `RwLock` and are only written by
//!   [`World`](crate::engine_state::voxels::world::World)
//! - mesh data sits behind a `Mutex`
//!
//! ## Lifecycle
//!
//! `data_generated` then `mesh_generated` then `mesh_loaded` each flip to `true`
//! once and stay there. `is_loaded` marks the chunk as owned by the main thread
//! again; it is cleared while the chunk sits in a loader batch.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use cgmath::{Point3, Vector3};
use log::warn;

use super::block::block_side::BlockSide;
use super::block::block_type::BlockType;
use super::block::BlockRegistry;
use super::terrain::TerrainSource;
use crate::core;
use crate::engine_state::camera_state::frustum::Aabb;
use crate::engine_state::rendering::meshing::{self, mesh::ChunkMeshes, mesh::MeshKind};
use crate::engine_state::rendering::upload::{GpuMesh, MeshUploader};

pub mod chunk_coords;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 16;
/// The number of blocks in a single 2D plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of blocks in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;

/// Weak links to the six adjacent chunks, indexed by [`BlockSide`].
pub type NeighborLinks = [Option<Weak<Chunk>>; 6];

/// Represents a 16x16x16 collection of voxel blocks in the world.
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: Point3<i32>,

    /// Cell data indexed `x + 16 * y + 256 * z`, each holding a `BlockType`.
    cells: Box<[AtomicU8]>,

    neighbors: RwLock<NeighborLinks>,
    meshes: Mutex<ChunkMeshes>,
    gpu_meshes: Mutex<[GpuMesh; 2]>,

    data_generated: AtomicBool,
    mesh_generated: AtomicBool,
    mesh_loaded: AtomicBool,
    is_loaded: AtomicBool,
}

impl Chunk {
    /// Creates a chunk full of air with no data generated yet.
    pub fn new(position: Point3<i32>) -> Self {
        let cells = (0..CHUNK_SIZE)
            .map(|_| AtomicU8::new(BlockType::AIR.as_int()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            position,
            cells,
            neighbors: RwLock::new(Default::default()),
            meshes: Mutex::new(ChunkMeshes::new()),
            gpu_meshes: Mutex::new([GpuMesh::default(); 2]),
            data_generated: AtomicBool::new(false),
            mesh_generated: AtomicBool::new(false),
            mesh_loaded: AtomicBool::new(false),
            is_loaded: AtomicBool::new(false),
        }
    }

    fn index(x: i32, y: i32, z: i32) -> Option<usize> {
        let range = 0..CHUNK_DIMENSION;
        if range.contains(&x) && range.contains(&y) && range.contains(&z) {
            Some((x + CHUNK_DIMENSION * y + CHUNK_PLANE_SIZE * z) as usize)
        } else {
            None
        }
    }

    /// Block at chunk-local coordinates, `AIR` when out of bounds.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        match Self::index(x, y, z) {
            Some(index) => BlockType::from_int(self.cells[index].load(Ordering::Acquire)),
            None => BlockType::AIR,
        }
    }

    /// Stores a block at chunk-local coordinates. Out-of-bounds writes are ignored.
    ///
    /// Does not touch meshes or flags; callers decide what to remesh.
    pub fn set_block(&self, x: i32, y: i32, z: i32, block: BlockType) {
        if let Some(index) = Self::index(x, y, z) {
            self.cells[index].store(block.as_int(), Ordering::Release);
        }
    }

    /// Fills every cell from the terrain source and publishes `data_generated`.
    ///
    /// Calling this on a chunk that already has data logs a warning and leaves
    /// the data untouched.
    pub fn generate_data(&self, terrain: &mut dyn TerrainSource) {
        if self.is_data_generated() {
            warn!("Chunk {:?} already has data, skipping generation", self.position);
            return;
        }

        let origin = chunk_coords::chunk_origin(self.position);
        for z in 0..CHUNK_DIMENSION {
            for y in 0..CHUNK_DIMENSION {
                for x in 0..CHUNK_DIMENSION {
                    let block = terrain.generate(origin.x + x, origin.y + y, origin.z + z);
                    self.set_block(x, y, z, block);
                }
            }
        }

        self.data_generated.store(true, Ordering::Release);
    }

    /// Strong reference to the neighbor on `side`, if it is still alive.
    pub fn neighbor(&self, side: BlockSide) -> Option<Arc<Chunk>> {
        core::read(&self.neighbors)[side.index()]
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Strong references to all six neighbors at once.
    pub fn neighbors(&self) -> [Option<Arc<Chunk>>; 6] {
        let links = core::read(&self.neighbors);
        std::array::from_fn(|side| links[side].as_ref().and_then(Weak::upgrade))
    }

    /// Replaces one neighbor link. Only the registry may call this, so both
    /// directions of a link always change together.
    pub(crate) fn set_neighbor(&self, side: BlockSide, neighbor: Option<&Arc<Chunk>>) {
        core::write(&self.neighbors)[side.index()] = neighbor.map(Arc::downgrade);
    }

    /// `true` iff all six neighbors exist and have generated their data.
    pub fn has_all_neighbors(&self) -> bool {
        self.neighbors()
            .iter()
            .all(|neighbor| matches!(neighbor, Some(chunk) if chunk.is_data_generated()))
    }

    /// Rebuilds both meshes from the current cell data and publishes
    /// `mesh_generated`.
    ///
    /// Neighbors should have data (see [`has_all_neighbors`](Self::has_all_neighbors));
    /// a missing neighbor is treated as air.
    pub fn generate_mesh(&self, registry: &BlockRegistry) {
        let meshes = meshing::build_chunk_mesh(self, registry);
        *core::lock(&self.meshes) = meshes;
        self.mesh_generated.store(true, Ordering::Release);
    }

    /// Runs `f` against the CPU-side meshes.
    pub fn with_meshes<R>(&self, f: impl FnOnce(&ChunkMeshes) -> R) -> R {
        f(&core::lock(&self.meshes))
    }

    /// Uploads both meshes, replacing anything uploaded before, and publishes
    /// `mesh_loaded`. Main thread only.
    pub fn load_mesh(&self, uploader: &mut dyn MeshUploader) {
        self.release_gpu(uploader);

        let meshes = core::lock(&self.meshes);
        let mut gpu_meshes = core::lock(&self.gpu_meshes);
        for kind in MeshKind::ALL {
            let buffers = meshes.get(kind);
            gpu_meshes[kind.index()] = GpuMesh {
                vertex_count: buffers.vertices.len() as u32,
                index_count: buffers.indices.len() as u32,
                handle: uploader.upload(self.position, kind, buffers),
            };
        }

        self.mesh_loaded.store(true, Ordering::Release);
    }

    /// Releases any uploaded GPU meshes and zeroes the recorded counts.
    pub fn release_gpu(&self, uploader: &mut dyn MeshUploader) {
        let mut gpu_meshes = core::lock(&self.gpu_meshes);
        for gpu_mesh in gpu_meshes.iter_mut() {
            if let Some(handle) = gpu_mesh.handle.take() {
                uploader.release(handle);
            }
            *gpu_mesh = GpuMesh::default();
        }
    }

    /// Opaque and translucent GPU meshes as last uploaded.
    pub fn gpu_meshes(&self) -> [GpuMesh; 2] {
        *core::lock(&self.gpu_meshes)
    }

    /// Whether either uploaded mesh has at least one face.
    pub fn has_geometry(&self) -> bool {
        self.gpu_meshes().iter().any(GpuMesh::has_geometry)
    }

    /// World-space bounds of the chunk.
    pub fn aabb(&self) -> Aabb {
        let origin = chunk_coords::chunk_origin(self.position);
        let min = Point3::new(origin.x as f32, origin.y as f32, origin.z as f32);
        Aabb::new(min, min + Vector3::new(1.0, 1.0, 1.0) * CHUNK_DIMENSION as f32)
    }

    /// Whether cell data is final.
    pub fn is_data_generated(&self) -> bool {
        self.data_generated.load(Ordering::Acquire)
    }

    /// Whether CPU-side meshes are ready.
    pub fn is_mesh_generated(&self) -> bool {
        self.mesh_generated.load(Ordering::Acquire)
    }

    /// Whether meshes are resident on the GPU.
    pub fn is_mesh_loaded(&self) -> bool {
        self.mesh_loaded.load(Ordering::Acquire)
    }

    /// Whether the main thread owns the chunk (no loader batch holds it).
    pub fn is_loaded(&self) -> bool {
        self.is_loaded.load(Ordering::Acquire)
    }

    pub(crate) fn mark_loaded(&self) {
        self.is_loaded.store(true, Ordering::Release);
    }

    pub(crate) fn mark_unloaded(&self) {
        self.is_loaded.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("position", &self.position)
            .field("data_generated", &self.is_data_generated())
            .field("mesh_generated", &self.is_mesh_generated())
            .field("mesh_loaded", &self.is_mesh_loaded())
            .field("is_loaded", &self.is_loaded())
            .finish()
    }
}
