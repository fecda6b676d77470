//! # Chunk Meshing
//!
//! Turns a chunk's cell data into its opaque and translucent meshes by emitting
//! one quad per visible block face.
//!
//! ## Face Rules
//! - A solid, non-water block shows a face when the block next to it is
//!   transparent. These faces go into the opaque mesh.
//! - A water block shows a face when the block next to it is not water and is
//!   either transparent or sits above it. These go into the translucent mesh.
//!   When the block above the water is not water, every face of that cell is
//!   lowered to [`WATER_SURFACE_HEIGHT`].
//!
//! Faces on the chunk boundary look into the adjacent chunk. The neighbor list
//! is captured once per mesh build; a neighbor that is missing reads as air.

use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::BlockRegistry;
use crate::engine_state::voxels::chunk::{chunk_coords, Chunk, CHUNK_DIMENSION};
use mesh::{ChunkMeshes, MeshKind};

pub mod mesh;

/// Height of an exposed water surface, as a fraction of a block.
pub const WATER_SURFACE_HEIGHT: f32 = 0.8;

/// Read-only view of a chunk and its neighbors during one mesh build.
struct MeshingContext<'a> {
    chunk: &'a Chunk,
    neighbors: [Option<std::sync::Arc<Chunk>>; 6],
}

impl MeshingContext<'_> {
    /// Block next to `(x, y, z)` on `side`, looking across the chunk boundary
    /// when needed.
    fn adjacent(&self, x: i32, y: i32, z: i32, side: BlockSide) -> BlockType {
        let offset = side.offset();
        let (nx, ny, nz) = (x + offset.x, y + offset.y, z + offset.z);
        let inside = |v: i32| (0..CHUNK_DIMENSION).contains(&v);
        if inside(nx) && inside(ny) && inside(nz) {
            return self.chunk.get_block(nx, ny, nz);
        }

        match &self.neighbors[side.index()] {
            Some(neighbor) => neighbor.get_block(
                nx.rem_euclid(CHUNK_DIMENSION),
                ny.rem_euclid(CHUNK_DIMENSION),
                nz.rem_euclid(CHUNK_DIMENSION),
            ),
            None => BlockType::AIR,
        }
    }
}

/// Builds both meshes for a chunk from its current cell data.
pub fn build_chunk_mesh(chunk: &Chunk, registry: &BlockRegistry) -> ChunkMeshes {
    let context = MeshingContext {
        chunk,
        neighbors: chunk.neighbors(),
    };
    let origin = chunk_coords::chunk_origin(chunk.position);
    let mut meshes = ChunkMeshes::new();

    for x in 0..CHUNK_DIMENSION {
        for y in 0..CHUNK_DIMENSION {
            for z in 0..CHUNK_DIMENSION {
                let block = chunk.get_block(x, y, z);
                if block.is_air() {
                    continue;
                }

                let descriptor = registry.lookup(block);
                let position = origin + cgmath::Vector3::new(x, y, z);
                let block_origin = world_origin(position);

                if block == BlockType::WATER {
                    let above = context.adjacent(x, y, z, BlockSide::TOP);
                    let height = if above == BlockType::WATER {
                        1.0
                    } else {
                        WATER_SURFACE_HEIGHT
                    };

                    for side in BlockSide::all() {
                        let adjacent = context.adjacent(x, y, z, side);
                        let visible = adjacent != BlockType::WATER
                            && (registry.is_transparent(adjacent) || side == BlockSide::TOP);
                        if visible {
                            meshes.get_mut(MeshKind::Translucent).push_face(
                                side,
                                block_origin,
                                descriptor.texture_index(side),
                                height,
                            );
                        }
                    }
                } else {
                    for side in BlockSide::all() {
                        if registry.is_transparent(context.adjacent(x, y, z, side)) {
                            meshes.get_mut(MeshKind::Opaque).push_face(
                                side,
                                block_origin,
                                descriptor.texture_index(side),
                                1.0,
                            );
                        }
                    }
                }
            }
        }
    }

    meshes
}

fn world_origin(position: Point3<i32>) -> [f32; 3] {
    [position.x as f32, position.y as f32, position.z as f32]
}
