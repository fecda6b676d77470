//! # Block Module
//!
//! This module provides the block type definitions, block face handling, and the
//! block registry that maps each type to its rendering properties.
//!
//! The registry is an explicit value. It is built once with
//! [`BlockRegistry::standard`] (or [`BlockRegistry::initialize`] on an empty table)
//! and then shared by `Arc` with everything that meshes or generates chunks.

use block_side::BlockSide;
use block_type::{BlockType, BLOCK_TYPE_COUNT};
use log::warn;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
pub type BlockTypeSize = u8;

/// Width of the texture atlas, in tiles.
pub const ATLAS_TILES_PER_ROW: u32 = 16;

/// Returns the atlas layer for the tile at `(row, col)`.
pub const fn atlas_index(row: u32, col: u32) -> u32 {
    row * ATLAS_TILES_PER_ROW + col
}

/// Rendering properties of a single block type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Whether faces of neighboring blocks remain visible through this one.
    pub is_transparent: bool,
    /// Atlas layer per face, indexed by [`BlockSide`].
    pub texture_indices: [u32; 6],
}

impl BlockDescriptor {
    /// Descriptor that uses the same tile on every face.
    pub const fn uniform(is_transparent: bool, texture_index: u32) -> Self {
        Self {
            is_transparent,
            texture_indices: [texture_index; 6],
        }
    }

    /// Atlas layer for one face.
    pub fn texture_index(&self, side: BlockSide) -> u32 {
        self.texture_indices[side.index()]
    }
}

impl Default for BlockDescriptor {
    fn default() -> Self {
        Self::uniform(false, atlas_index(15, 15))
    }
}

/// Table of [`BlockDescriptor`]s indexed by [`BlockType`].
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    descriptors: [BlockDescriptor; BLOCK_TYPE_COUNT],
    initialized: bool,
}

impl BlockRegistry {
    /// Creates a table filled with placeholder descriptors.
    ///
    /// Chunks must not be generated or meshed against this table until
    /// [`initialize`](Self::initialize) has run.
    pub fn empty() -> Self {
        Self {
            descriptors: [BlockDescriptor::default(); BLOCK_TYPE_COUNT],
            initialized: false,
        }
    }

    /// Creates an initialized table with the standard block set.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.initialize();
        registry
    }

    /// Fills the table with the standard block set.
    ///
    /// # Returns
    /// `true` if the table was filled, `false` if it had already been initialized.
    /// The second call leaves the table untouched.
    pub fn initialize(&mut self) -> bool {
        if self.initialized {
            warn!("Block registry already initialized, ignoring second initialization");
            return false;
        }

        self.descriptors[BlockType::AIR as usize] =
            BlockDescriptor::uniform(true, atlas_index(15, 15));
        self.descriptors[BlockType::STONE as usize] =
            BlockDescriptor::uniform(false, atlas_index(0, 1));
        self.descriptors[BlockType::DIRT as usize] =
            BlockDescriptor::uniform(false, atlas_index(0, 2));

        let mut grass = BlockDescriptor::uniform(false, atlas_index(0, 3));
        grass.texture_indices[BlockSide::TOP.index()] = atlas_index(0, 0);
        grass.texture_indices[BlockSide::BOTTOM.index()] = atlas_index(0, 2);
        self.descriptors[BlockType::GRASS as usize] = grass;

        self.descriptors[BlockType::SAND as usize] =
            BlockDescriptor::uniform(false, atlas_index(1, 2));
        self.descriptors[BlockType::WATER as usize] =
            BlockDescriptor::uniform(true, atlas_index(13, 15));

        self.initialized = true;
        true
    }

    /// Whether [`initialize`](Self::initialize) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the descriptor for a block type.
    pub fn lookup(&self, block_type: BlockType) -> &BlockDescriptor {
        &self.descriptors[block_type as usize]
    }

    /// Shorthand for `lookup(block_type).is_transparent`.
    pub fn is_transparent(&self, block_type: BlockType) -> bool {
        self.lookup(block_type).is_transparent
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
