#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Chunk Streamer
//!
//! The chunk streaming and meshing core of a voxel engine.
//!
//! An effectively infinite block grid is split into 16³ chunks. Chunks are
//! created around a moving camera, filled by a terrain source and meshed on a
//! background thread, uploaded on the main thread, frustum culled into a
//! per-frame render list, and evicted once the camera has moved away.
//!
//! ## Key Modules
//!
//! * `config` - Streaming and terrain settings loaded from JSON
//! * `core` - Poison-tolerant lock helpers shared by both threads
//! * `engine_state` - Chunks, meshing, streaming, the loader and the camera
//! * `error` - The error type of fallible setup paths
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use chunk_streamer::{
//!     BlockRegistry, Camera, ChunkManager, EngineConfig, HeadlessUploader, Projection,
//!     TerrainGenerator,
//! };
//!
//! let config = EngineConfig::default();
//! let mut manager = ChunkManager::with_inline_loader(
//!     config.streaming.clone(),
//!     Arc::new(BlockRegistry::standard()),
//!     Box::new(TerrainGenerator::new(config.terrain.clone())),
//!     HeadlessUploader::new(),
//! );
//! let camera = Camera::new((0.0, 40.0, 0.0), cgmath::Deg(0.0), cgmath::Deg(-20.0), Projection::default(), 2);
//!
//! let stats = manager.update(&camera);
//! assert!(stats.created > 0);
//! ```
//!
//! ## Threading
//!
//! The main thread owns the chunk registry, mesh uploads, deletions and edits.
//! The loader thread only touches chunks it was handed, and hands them back by
//! marking them loaded.

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

pub use config::{EngineConfig, StreamingConfig, TerrainConfig};
pub use engine_state::camera_state::{Aabb, Camera, Frustum, Plane, Projection};
pub use engine_state::rendering::meshing::build_chunk_mesh;
pub use engine_state::rendering::meshing::mesh::{ChunkMeshes, MeshBuffers, MeshKind};
pub use engine_state::rendering::render_list::{RenderEntry, RenderList};
pub use engine_state::rendering::upload::{GpuMesh, GpuMeshHandle, HeadlessUploader, MeshUploader};
pub use engine_state::rendering::wgpu_uploader::WgpuMeshUploader;
pub use engine_state::rendering::Vertex;
pub use engine_state::selection::{raycast, Selection};
pub use engine_state::streaming::{ChunkManager, FrameStats};
pub use engine_state::task_management::ChunkLoader;
pub use engine_state::voxels::block::block_side::BlockSide;
pub use engine_state::voxels::block::block_type::BlockType;
pub use engine_state::voxels::block::{BlockDescriptor, BlockRegistry};
pub use engine_state::voxels::chunk::{Chunk, CHUNK_DIMENSION, CHUNK_SIZE};
pub use engine_state::voxels::terrain::{TerrainFn, TerrainGenerator, TerrainSource};
pub use engine_state::voxels::world::World;
pub use engine_state::EngineState;
pub use error::{EngineError, Result};

use log::info;

/// Initializes `env_logger` writing to stdout, filtered by `RUST_LOG`.
///
/// Calling it more than once is harmless; later calls leave the first logger in
/// place.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let initialized = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init()
        .is_ok();

    if initialized {
        info!("Logger initialized");
    }
}
