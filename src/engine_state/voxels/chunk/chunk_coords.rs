//! Conversions between world block coordinates, chunk coordinates and
//! chunk-local cell coordinates.

use cgmath::{Point3, Vector3};

use super::CHUNK_DIMENSION;
use crate::engine_state::voxels::block::block_side::BlockSide;

/// Chunk containing the block at a world block coordinate.
pub fn world_to_chunk(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.div_euclid(CHUNK_DIMENSION),
        world.y.div_euclid(CHUNK_DIMENSION),
        world.z.div_euclid(CHUNK_DIMENSION),
    )
}

/// Cell within its chunk of a world block coordinate, each axis in `0..16`.
pub fn world_to_local(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.rem_euclid(CHUNK_DIMENSION),
        world.y.rem_euclid(CHUNK_DIMENSION),
        world.z.rem_euclid(CHUNK_DIMENSION),
    )
}

/// World block coordinate of a chunk's minimum corner.
pub fn chunk_origin(chunk: Point3<i32>) -> Point3<i32> {
    Point3::new(
        chunk.x * CHUNK_DIMENSION,
        chunk.y * CHUNK_DIMENSION,
        chunk.z * CHUNK_DIMENSION,
    )
}

/// Chunk containing a continuous world position (camera space).
pub fn position_to_chunk(position: Point3<f32>) -> Point3<i32> {
    let size = CHUNK_DIMENSION as f32;
    Point3::new(
        (position.x / size).floor() as i32,
        (position.y / size).floor() as i32,
        (position.z / size).floor() as i32,
    )
}

/// Coordinate of the chunk adjacent on `side`.
pub fn neighbor_position(chunk: Point3<i32>, side: BlockSide) -> Point3<i32> {
    chunk + side.offset()
}

/// Sides of a chunk touched by the cell at `local`.
///
/// A cell on the minimum boundary of an axis touches the negative side, one on
/// the maximum boundary touches the positive side. Interior cells touch none.
pub fn boundary_sides(local: Point3<i32>) -> Vec<BlockSide> {
    let local = Vector3::new(local.x, local.y, local.z);
    let mut sides = Vec::new();
    for axis in 0..3 {
        if local[axis] == 0 {
            sides.push(BlockSide::from_index(axis * 2));
        } else if local[axis] == CHUNK_DIMENSION - 1 {
            sides.push(BlockSide::from_index(axis * 2 + 1));
        }
    }
    sides
}
