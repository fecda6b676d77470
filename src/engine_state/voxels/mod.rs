//! # Voxel Data
//!
//! This module contains the data side of the world: what blocks exist, how
//! they are grouped into chunks, how chunks are generated, and the registry
//! that owns every live chunk.
//!
//! ## Architecture
//!
//! * **Block**: block types, faces and the block registry
//! * **Chunk**: one 16³ cube of atomically accessed cells plus its meshes
//! * **Terrain**: per-coordinate block decisions with a bounded cache
//! * **World**: the chunk registry and the only writer of neighbor links

pub mod block;
pub mod chunk;
pub mod terrain;
pub mod world;
