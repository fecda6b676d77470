//! # Chunk Batches
//!
//! The unit of work handed to the chunk loader and the routine that processes it.
//!
//! ## Batch Lifecycle
//! 1. The chunk manager collects the chunks it wants processed this frame into a
//!    [`ChunkBatch`], together with the viewer chunk and render distance.
//! 2. The loader merges every batch waiting in its queue into one.
//! 3. [`process_batch`] generates missing data for every chunk, then meshes the
//!    meshable ones nearest-first and hands every chunk back by marking it
//!    loaded.
//! 4. The terrain source's cache is cleared.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use cgmath::Point3;

use crate::engine_state::streaming::scan;
use crate::engine_state::voxels::block::BlockRegistry;
use crate::engine_state::voxels::chunk::Chunk;
use crate::engine_state::voxels::terrain::TerrainSource;

/// Chunks to process plus the viewpoint to prioritize against.
#[derive(Debug, Clone)]
pub struct ChunkBatch {
    /// Chunks handed to the loader. None of them is marked loaded.
    pub chunks: Vec<Arc<Chunk>>,
    /// Viewer chunk coordinate when the batch was published
    pub center: Point3<i32>,
    /// Render distance when the batch was published
    pub render_distance: i32,
}

impl ChunkBatch {
    /// Creates an empty batch for a viewpoint.
    pub fn new(center: Point3<i32>, render_distance: i32) -> Self {
        Self {
            chunks: Vec::new(),
            center,
            render_distance,
        }
    }

    /// Number of chunks in the batch.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the batch holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Appends a later batch, adopting its viewpoint.
    pub fn merge(&mut self, later: ChunkBatch) {
        self.chunks.extend(later.chunks);
        self.center = later.center;
        self.render_distance = later.render_distance;
    }
}

/// A chunk waiting to be meshed, ordered so that a max-heap pops the chunk
/// closest to the batch center first. Equal distances pop in insertion order.
#[derive(Debug)]
pub struct MeshCandidate {
    /// Manhattan distance from the batch center
    pub distance: i32,
    /// Insertion order within the batch
    pub sequence: usize,
    /// The chunk to mesh
    pub chunk: Arc<Chunk>,
}

impl PartialEq for MeshCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.sequence == other.sequence
    }
}

impl Eq for MeshCandidate {}

impl PartialOrd for MeshCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MeshCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .cmp(&self.distance)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// What happened to the chunks of one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Chunks whose data was generated
    pub generated: usize,
    /// Chunks that were meshed
    pub meshed: usize,
    /// Chunks handed back without a mesh
    pub deferred: usize,
}

/// Generates data and meshes for one batch.
///
/// Data for the whole batch is generated before any chunk is classified, so
/// chunks arriving together can serve as each other's neighbors.
pub fn process_batch(
    batch: ChunkBatch,
    terrain: &mut dyn TerrainSource,
    registry: &BlockRegistry,
) -> BatchReport {
    let mut report = BatchReport::default();

    for chunk in &batch.chunks {
        if !chunk.is_data_generated() {
            chunk.generate_data(terrain);
            report.generated += 1;
        }
    }

    let mut heap = BinaryHeap::with_capacity(batch.chunks.len());
    for (sequence, chunk) in batch.chunks.into_iter().enumerate() {
        let meshable = chunk.has_all_neighbors()
            && scan::is_within_sphere(chunk.position, batch.center, batch.render_distance);
        if meshable {
            heap.push(MeshCandidate {
                distance: scan::manhattan_distance(chunk.position, batch.center),
                sequence,
                chunk,
            });
        } else {
            chunk.mark_loaded();
            report.deferred += 1;
        }
    }

    while let Some(candidate) = heap.pop() {
        candidate.chunk.generate_mesh(registry);
        candidate.chunk.mark_loaded();
        report.meshed += 1;
    }

    terrain.clear_cache();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;
    use crate::engine_state::voxels::world::World;

    fn candidate(distance: i32, sequence: usize) -> MeshCandidate {
        MeshCandidate {
            distance,
            sequence,
            chunk: Arc::new(Chunk::new(Point3::new(0, 0, 0))),
        }
    }

    #[test]
    fn heap_pops_nearest_first_then_in_insertion_order() {
        let mut heap = BinaryHeap::new();
        for (distance, sequence) in [(3, 0), (1, 1), (2, 2), (1, 3), (0, 4)] {
            heap.push(candidate(distance, sequence));
        }
        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|c| (c.distance, c.sequence))
            .collect();
        assert_eq!(order, vec![(0, 4), (1, 1), (1, 3), (2, 2), (3, 0)]);
    }

    #[test]
    fn merge_keeps_chunks_and_adopts_latest_viewpoint() {
        let mut first = ChunkBatch::new(Point3::new(0, 0, 0), 2);
        first.chunks.push(Arc::new(Chunk::new(Point3::new(0, 0, 0))));
        let mut second = ChunkBatch::new(Point3::new(5, 0, 0), 3);
        second.chunks.push(Arc::new(Chunk::new(Point3::new(5, 0, 0))));
        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.center, Point3::new(5, 0, 0));
        assert_eq!(first.render_distance, 3);
    }

    #[test]
    fn only_surrounded_chunks_get_meshed() {
        let mut world = World::new();
        let mut batch = ChunkBatch::new(Point3::new(0, 0, 0), 1);
        for x in -1..=1 {
            let (chunk, _) = world.add_chunk_at(Point3::new(x, 0, 0));
            batch.chunks.push(chunk);
        }
        for position in [
            Point3::new(0, 1, 0),
            Point3::new(0, -1, 0),
            Point3::new(0, 0, 1),
            Point3::new(0, 0, -1),
        ] {
            let (chunk, _) = world.add_chunk_at(position);
            batch.chunks.push(chunk);
        }

        let mut clears = 0;
        struct Counting<'a>(&'a mut usize);
        impl TerrainSource for Counting<'_> {
            fn generate(&mut self, _: i32, y: i32, _: i32) -> BlockType {
                if y < 0 { BlockType::STONE } else { BlockType::AIR }
            }
            fn clear_cache(&mut self) {
                *self.0 += 1;
            }
        }

        let report = process_batch(batch, &mut Counting(&mut clears), &BlockRegistry::standard());
        assert_eq!(report.generated, 7);
        assert_eq!(report.meshed, 1);
        assert_eq!(report.deferred, 6);
        assert_eq!(clears, 1);

        let center = world.get_chunk_at(Point3::new(0, 0, 0)).unwrap();
        assert!(center.is_mesh_generated());
        assert!(world.iter().all(|chunk| chunk.is_loaded()));
    }
}
