//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and the
//! conversion from the compact per-cell storage format.

use num_derive::FromPrimitive;

use super::BlockTypeSize;

/// Number of distinct block types, used to size lookup tables.
pub const BLOCK_TYPE_COUNT: usize = 6;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminants are the values stored in chunk cells. The `FromPrimitive`
/// derive allows conversion back from those integers.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Never meshed, always transparent.
    AIR = 0,

    /// Bare rock found above the grass line.
    STONE = 1,

    /// Common ground filler below the surface.
    DIRT = 2,

    /// Surface block with distinct top, side and bottom textures.
    GRASS = 3,

    /// Beach material found around low-lying water.
    SAND = 4,

    /// Translucent liquid. Meshed into its own buffer with a lowered surface.
    WATER = 5,
}

impl BlockType {
    /// Every block type in discriminant order.
    pub const ALL: [BlockType; BLOCK_TYPE_COUNT] = [
        BlockType::AIR,
        BlockType::STONE,
        BlockType::DIRT,
        BlockType::GRASS,
        BlockType::SAND,
        BlockType::WATER,
    ];

    /// Converts a stored `BlockTypeSize` back into a `BlockType`.
    ///
    /// # Arguments
    /// * `btype` - The block type as stored in a chunk cell
    ///
    /// # Returns
    /// The matching `BlockType`, or `AIR` for values that name no block.
    pub fn from_int(btype: BlockTypeSize) -> Self {
        num::FromPrimitive::from_u8(btype).unwrap_or(BlockType::AIR)
    }

    /// Returns the compact storage value of this block type.
    pub fn as_int(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    /// Whether the cell holds anything at all.
    pub fn is_air(self) -> bool {
        self == BlockType::AIR
    }

    /// Whether a selection ray should stop at this block.
    pub fn is_selectable(self) -> bool {
        !matches!(self, BlockType::AIR | BlockType::WATER)
    }
}
