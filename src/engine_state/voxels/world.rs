//! # World Module
//!
//! This module provides the `World` struct, the registry of every chunk that
//! currently exists, keyed by chunk coordinate.
//!
//! ## Adjacency
//!
//! `World` is the only place neighbor links are written. [`World::add_chunk_at`]
//! links a new chunk with every existing face-adjacent chunk in both directions,
//! and [`World::remove_chunk_at`] clears both directions before dropping it. The
//! registry therefore keeps this invariant at all times: if `A` lists `B` as its
//! neighbor on `side`, then `B` lists `A` on `side.opposite()`.
//!
//! The registry itself is only mutated from the main thread. The loader thread
//! receives `Arc<Chunk>` clones and never inserts or removes entries.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point3;

use super::block::block_side::BlockSide;
use super::chunk::{chunk_coords, Chunk};

/// Sparse 3D grid of chunks.
#[derive(Default)]
pub struct World {
    chunks: HashMap<Point3<i32>, Arc<Chunk>>,
}

/// A neighbor link that breaks the symmetry invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkViolation {
    /// Chunk whose link is wrong
    pub position: Point3<i32>,
    /// Slot of the wrong link
    pub side: BlockSide,
}

impl World {
    /// Creates a new, empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks in the registry.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Whether a chunk exists at `position`.
    pub fn contains(&self, position: Point3<i32>) -> bool {
        self.chunks.contains_key(&position)
    }

    /// Retrieves the chunk at the specified chunk coordinates.
    pub fn get_chunk_at(&self, position: Point3<i32>) -> Option<Arc<Chunk>> {
        self.chunks.get(&position).cloned()
    }

    /// Iterates over every chunk in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.chunks.values()
    }

    /// Creates a chunk at `position` and links it with its existing neighbors.
    ///
    /// # Returns
    /// The chunk at `position` and whether it was created by this call. An
    /// existing chunk is returned untouched.
    pub fn add_chunk_at(&mut self, position: Point3<i32>) -> (Arc<Chunk>, bool) {
        if let Some(existing) = self.chunks.get(&position) {
            return (Arc::clone(existing), false);
        }

        let chunk = Arc::new(Chunk::new(position));
        for side in BlockSide::all() {
            let neighbor_position = chunk_coords::neighbor_position(position, side);
            if let Some(neighbor) = self.chunks.get(&neighbor_position) {
                chunk.set_neighbor(side, Some(neighbor));
                neighbor.set_neighbor(side.opposite(), Some(&chunk));
            }
        }

        self.chunks.insert(position, Arc::clone(&chunk));
        (chunk, true)
    }

    /// Removes the chunk at `position`, unlinking it from its neighbors first.
    ///
    /// GPU resources are not touched; callers release them through their
    /// uploader.
    pub fn remove_chunk_at(&mut self, position: Point3<i32>) -> Option<Arc<Chunk>> {
        let chunk = self.chunks.remove(&position)?;
        for side in BlockSide::all() {
            let neighbor_position = chunk_coords::neighbor_position(position, side);
            if let Some(neighbor) = self.chunks.get(&neighbor_position) {
                neighbor.set_neighbor(side.opposite(), None);
            }
            chunk.set_neighbor(side, None);
        }
        Some(chunk)
    }

    /// Lists every neighbor link that is missing, dangling or one-sided.
    ///
    /// An empty result means the registry is consistent: each pair of
    /// face-adjacent chunks is linked in both directions and no chunk links to
    /// anything outside the registry.
    pub fn check_neighbor_symmetry(&self) -> Vec<LinkViolation> {
        let mut violations = Vec::new();
        for (position, chunk) in &self.chunks {
            for side in BlockSide::all() {
                let expected = self
                    .chunks
                    .get(&chunk_coords::neighbor_position(*position, side));
                let linked = chunk.neighbor(side);

                let consistent = match (expected, &linked) {
                    (Some(expected), Some(linked)) => {
                        Arc::ptr_eq(expected, linked)
                            && linked
                                .neighbor(side.opposite())
                                .is_some_and(|back| Arc::ptr_eq(&back, chunk))
                    }
                    (None, None) => true,
                    _ => false,
                };

                if !consistent {
                    violations.push(LinkViolation {
                        position: *position,
                        side,
                    });
                }
            }
        }
        violations
    }
}
