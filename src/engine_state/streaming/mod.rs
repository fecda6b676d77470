//! # Chunk Streaming
//!
//! The per-frame policy deciding which chunks exist, which get meshed and
//! uploaded, which are drawn, and which are evicted.
//!
//! ## Frame Phases
//!
//! 1. **Creation**: when the viewer entered a new chunk, the render distance
//!    changed, or the previous pass ran out of budget, missing chunks inside the
//!    cube around the viewer are created, linked, and queued. Small moves only
//!    scan the slabs that just came into range.
//! 2. **Maintenance**: every chunk the main thread owns is visited once. Chunks
//!    in the render sphere are queued for meshing, uploaded, or frustum tested
//!    into the render list. Chunks outside the eviction box are deleted once
//!    all their neighbors are loaded.
//! 3. **Dispatch**: missing neighbors of queued chunks are created, then the
//!    batch goes to the loader.
//!
//! Every phase is count-budgeted. Work that does not fit is picked up on a
//! later frame.

pub mod scan;

use std::collections::HashSet;
use std::sync::Arc;

use cgmath::Point3;
use log::{debug, error, info};

use crate::config::StreamingConfig;
use crate::engine_state::camera_state::{Camera, Frustum};
use crate::engine_state::rendering::render_list::RenderList;
use crate::engine_state::rendering::upload::{HeadlessUploader, MeshUploader};
use crate::engine_state::task_management::task::ChunkBatch;
use crate::engine_state::task_management::ChunkLoader;
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::BlockRegistry;
use crate::engine_state::voxels::chunk::{chunk_coords, Chunk};
use crate::engine_state::voxels::terrain::TerrainSource;
use crate::engine_state::voxels::world::World;
use crate::error::Result;
use scan::{CubeOffsets, ScanRegion};

/// Counters describing what one [`ChunkManager::update`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Chunks created by the creation phase
    pub created: usize,
    /// Chunks created because a queued chunk was missing a neighbor
    pub neighbors_created: usize,
    /// Loaded chunks sent back to the loader for meshing
    pub queued_for_mesh: usize,
    /// Chunks whose meshes were uploaded
    pub uploaded: usize,
    /// Chunks removed from the registry
    pub deleted: usize,
    /// Eviction candidates kept for now
    pub deferred_deletions: usize,
    /// Entries in the published render list
    pub rendered: usize,
    /// Whether the creation phase scanned the whole cube
    pub full_rescan: bool,
}

impl FrameStats {
    /// Whether the registry changed size this frame.
    pub fn changed_registry(&self) -> bool {
        self.created + self.neighbors_created + self.deleted > 0
    }
}

/// Owns the chunk registry and drives streaming around a camera.
pub struct ChunkManager<U: MeshUploader = HeadlessUploader> {
    config: StreamingConfig,
    world: World,
    registry: Arc<BlockRegistry>,
    loader: ChunkLoader,
    uploader: U,
    render_list: RenderList,
    last_chunk_position: Option<Point3<i32>>,
    last_render_distance: i32,
    last_position_fully_loaded: bool,
    cube_offsets: CubeOffsets,
    scan_cursor: Option<usize>,
}

fn ensure_initialized(registry: Arc<BlockRegistry>) -> Arc<BlockRegistry> {
    if registry.is_initialized() {
        registry
    } else {
        error!("Chunk manager given an uninitialized block registry, using the standard set");
        Arc::new(BlockRegistry::standard())
    }
}

impl<U: MeshUploader> ChunkManager<U> {
    /// Creates a manager with a background loader thread.
    pub fn new(
        config: StreamingConfig,
        registry: Arc<BlockRegistry>,
        terrain: Box<dyn TerrainSource>,
        uploader: U,
    ) -> Result<Self> {
        let registry = ensure_initialized(registry);
        let loader = ChunkLoader::spawn(terrain, Arc::clone(&registry))?;
        Ok(Self::from_parts(config, registry, loader, uploader))
    }

    /// Creates a manager that processes batches synchronously during
    /// [`update`](Self::update).
    pub fn with_inline_loader(
        config: StreamingConfig,
        registry: Arc<BlockRegistry>,
        terrain: Box<dyn TerrainSource>,
        uploader: U,
    ) -> Self {
        let registry = ensure_initialized(registry);
        let loader = ChunkLoader::inline(terrain, Arc::clone(&registry));
        Self::from_parts(config, registry, loader, uploader)
    }

    fn from_parts(
        config: StreamingConfig,
        registry: Arc<BlockRegistry>,
        loader: ChunkLoader,
        uploader: U,
    ) -> Self {
        Self {
            config,
            world: World::new(),
            registry,
            loader,
            uploader,
            render_list: RenderList::new(),
            last_chunk_position: None,
            last_render_distance: 0,
            last_position_fully_loaded: false,
            cube_offsets: CubeOffsets::new(),
            scan_cursor: None,
        }
    }

    /// Runs one frame of the streaming policy.
    pub fn update(&mut self, camera: &Camera) -> FrameStats {
        let current = camera.chunk_position();
        let render_distance = camera.render_distance.max(0);
        let mut stats = FrameStats::default();
        let mut generate_budget = self.config.max_generated;
        let mut batch = ChunkBatch::new(current, render_distance);
        let mut queued = HashSet::new();

        self.create_missing_chunks(
            current,
            render_distance,
            &mut generate_budget,
            &mut batch,
            &mut queued,
            &mut stats,
        );
        self.maintain_chunks(
            camera,
            current,
            render_distance,
            &mut generate_budget,
            &mut batch,
            &mut queued,
            &mut stats,
        );
        self.dispatch(batch, &mut stats);

        if stats.changed_registry() || stats.uploaded > 0 {
            debug!(
                "Streaming update at {:?}: {:?} ({} chunks, {} pending)",
                current,
                stats,
                self.world.len(),
                self.loader.pending_chunks()
            );
        }
        stats
    }

    fn create_missing_chunks(
        &mut self,
        current: Point3<i32>,
        render_distance: i32,
        budget: &mut usize,
        batch: &mut ChunkBatch,
        queued: &mut HashSet<Point3<i32>>,
        stats: &mut FrameStats,
    ) {
        let moved = self.last_chunk_position != Some(current)
            || self.last_render_distance != render_distance
            || !self.last_position_fully_loaded;
        if !moved {
            return;
        }
        if let Some(previous) = self.last_chunk_position.filter(|p| *p != current) {
            info!("Viewer crossed from chunk {:?} to {:?}", previous, current);
        }

        let full = scan::needs_full_rescan(
            self.last_chunk_position,
            current,
            self.last_render_distance,
            render_distance,
            self.last_position_fully_loaded,
        );
        stats.full_rescan = full;

        // An unfinished cube pass at the same spot resumes where it stopped.
        let resume_from = match self.scan_cursor {
            Some(cursor)
                if self.last_chunk_position == Some(current)
                    && self.last_render_distance == render_distance =>
            {
                cursor
            }
            _ => 0,
        };
        self.scan_cursor = None;

        let positions: Box<dyn Iterator<Item = Point3<i32>> + '_> = match self.last_chunk_position
        {
            Some(previous) if !full => Box::new(
                ScanRegion::slabs(previous, current, render_distance)
                    .positions()
                    .into_iter(),
            ),
            _ => Box::new(
                self.cube_offsets.get(render_distance)[resume_from..]
                    .iter()
                    .map(move |offset| current + *offset),
            ),
        };

        let mut complete = true;
        let mut visited = resume_from;
        for position in positions {
            if !self.world.contains(position) {
                if *budget == 0 {
                    complete = false;
                    break;
                }
                let (chunk, _) = self.world.add_chunk_at(position);
                queued.insert(position);
                batch.chunks.push(chunk);
                *budget -= 1;
                stats.created += 1;
            }
            visited += 1;
        }
        if full && !complete {
            self.scan_cursor = Some(visited);
        }

        self.last_chunk_position = Some(current);
        self.last_render_distance = render_distance;
        self.last_position_fully_loaded = complete;
    }

    #[allow(clippy::too_many_arguments)]
    fn maintain_chunks(
        &mut self,
        camera: &Camera,
        current: Point3<i32>,
        render_distance: i32,
        generate_budget: &mut usize,
        batch: &mut ChunkBatch,
        queued: &mut HashSet<Point3<i32>>,
        stats: &mut FrameStats,
    ) {
        let frustum = Frustum::from_camera(camera);
        let eviction_extent = render_distance + self.config.unload_margin;
        let mut load_budget = self.config.max_loaded;
        let mut render_list = RenderList::new();
        let mut eviction_candidates = Vec::new();

        for chunk in self.world.iter() {
            if !chunk.is_loaded() {
                continue;
            }
            let position = chunk.position;

            if scan::is_within_sphere(position, current, render_distance) {
                if !chunk.is_mesh_generated() {
                    if *generate_budget > 0 && queued.insert(position) {
                        chunk.mark_unloaded();
                        batch.chunks.push(Arc::clone(chunk));
                        *generate_budget -= 1;
                        stats.queued_for_mesh += 1;
                    }
                    continue;
                }

                if !chunk.is_mesh_loaded() {
                    if load_budget == 0 {
                        continue;
                    }
                    chunk.load_mesh(&mut self.uploader);
                    load_budget -= 1;
                    stats.uploaded += 1;
                }

                if chunk.has_geometry() && frustum.intersects(&chunk.aabb()) {
                    render_list.push(position, chunk.gpu_meshes(), current);
                }
            } else if !scan::is_within_box(position, current, eviction_extent) {
                eviction_candidates.push(position);
            }
        }

        self.evict(eviction_candidates, stats);

        render_list.finish();
        stats.rendered = render_list.len();
        self.render_list = render_list;
    }

    fn evict(&mut self, mut candidates: Vec<Point3<i32>>, stats: &mut FrameStats) {
        candidates.sort_by_key(|p| (p.x, p.y, p.z));
        let mut delete_budget = self.config.max_deleted;

        for position in candidates {
            if delete_budget == 0 {
                stats.deferred_deletions += 1;
                continue;
            }
            let safe = self
                .world
                .get_chunk_at(position)
                .is_some_and(|chunk| is_safe_to_delete(&chunk));
            if !safe {
                stats.deferred_deletions += 1;
                continue;
            }
            if let Some(chunk) = self.world.remove_chunk_at(position) {
                chunk.release_gpu(&mut self.uploader);
                delete_budget -= 1;
                stats.deleted += 1;
            }
        }
    }

    fn dispatch(&mut self, mut batch: ChunkBatch, stats: &mut FrameStats) {
        if batch.is_empty() {
            return;
        }

        let queued_positions: Vec<_> = batch.chunks.iter().map(|chunk| chunk.position).collect();
        for position in queued_positions {
            for side in BlockSide::all() {
                let neighbor_position = chunk_coords::neighbor_position(position, side);
                let (neighbor, created) = self.world.add_chunk_at(neighbor_position);
                if created {
                    batch.chunks.push(neighbor);
                    stats.neighbors_created += 1;
                }
            }
        }

        if let Err(err) = self.loader.dispatch(batch) {
            error!("Failed to dispatch chunk batch: {}", err);
        }
    }

    /// Block at a world block coordinate. Absent or ungenerated chunks read as
    /// air.
    pub fn get_block(&self, world_position: Point3<i32>) -> BlockType {
        match self.world.get_chunk_at(chunk_coords::world_to_chunk(world_position)) {
            Some(chunk) if chunk.is_data_generated() => {
                let local = chunk_coords::world_to_local(world_position);
                chunk.get_block(local.x, local.y, local.z)
            }
            _ => BlockType::AIR,
        }
    }

    /// Replaces the block at a world block coordinate and rebuilds affected
    /// meshes on the spot.
    ///
    /// Writing the block a cell already holds succeeds without remeshing.
    ///
    /// # Returns
    /// `false` without changing anything when the chunk, or a neighbor sharing
    /// the edited cell's boundary, is absent or held by the loader.
    pub fn set_block(&mut self, world_position: Point3<i32>, block: BlockType) -> bool {
        let Some(chunk) = self
            .world
            .get_chunk_at(chunk_coords::world_to_chunk(world_position))
        else {
            return false;
        };
        if !chunk.is_loaded() {
            return false;
        }

        let local = chunk_coords::world_to_local(world_position);
        if chunk.get_block(local.x, local.y, local.z) == block {
            return true;
        }
        let mut affected = vec![Arc::clone(&chunk)];
        for side in chunk_coords::boundary_sides(local) {
            match chunk.neighbor(side) {
                Some(neighbor) if neighbor.is_loaded() => affected.push(neighbor),
                _ => return false,
            }
        }

        chunk.set_block(local.x, local.y, local.z, block);
        for chunk in affected {
            if chunk.is_mesh_generated() {
                chunk.generate_mesh(&self.registry);
                chunk.load_mesh(&mut self.uploader);
            }
        }
        true
    }

    /// Chunks visible after the last update, nearest first.
    pub fn render_list(&self) -> &RenderList {
        &self.render_list
    }

    /// The chunk registry.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The block registry shared with the loader.
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Streaming settings.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// The uploader meshes are sent to.
    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Chunks handed to the loader and not yet returned.
    pub fn pending_chunks(&self) -> usize {
        self.loader.pending_chunks()
    }

    /// Whether the last creation pass found every chunk it wanted.
    pub fn is_position_fully_loaded(&self) -> bool {
        self.last_position_fully_loaded
    }
}

/// A chunk may go once it and every neighbor that still exists are loaded.
fn is_safe_to_delete(chunk: &Chunk) -> bool {
    chunk.is_loaded()
        && chunk
            .neighbors()
            .iter()
            .flatten()
            .all(|neighbor| neighbor.is_loaded())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::camera_state::Projection;
    use crate::engine_state::voxels::terrain::TerrainFn;
    use cgmath::Deg;

    fn manager(config: StreamingConfig) -> ChunkManager {
        ChunkManager::with_inline_loader(
            config,
            Arc::new(BlockRegistry::standard()),
            Box::new(TerrainFn(|_, y, _| {
                if y < 0 {
                    BlockType::STONE
                } else {
                    BlockType::AIR
                }
            })),
            HeadlessUploader::new(),
        )
    }

    fn camera(render_distance: i32) -> Camera {
        Camera::new(
            cgmath::Point3::new(8.0, 8.0, 8.0),
            Deg(0.0),
            Deg(-30.0),
            Projection::default(),
            render_distance,
        )
    }

    #[test]
    fn uninitialized_registry_is_replaced() {
        let manager = ChunkManager::with_inline_loader(
            StreamingConfig::default(),
            Arc::new(BlockRegistry::empty()),
            Box::new(TerrainFn(|_, _, _| BlockType::AIR)),
            HeadlessUploader::new(),
        );
        assert!(manager.registry().is_initialized());
    }

    #[test]
    fn render_distance_change_forces_full_rescan() {
        let mut manager = manager(StreamingConfig::default());
        let mut camera = camera(1);
        assert!(manager.update(&camera).full_rescan);
        assert!(!manager.update(&camera).full_rescan);

        camera.render_distance = 2;
        let stats = manager.update(&camera);
        assert!(stats.full_rescan);
        assert!(stats.created > 0);
    }

    #[test]
    fn unsafe_eviction_is_deferred() {
        let mut manager = manager(StreamingConfig::default());
        let (far, _) = manager.world.add_chunk_at(Point3::new(10, 0, 0));
        let (neighbor, _) = manager.world.add_chunk_at(Point3::new(11, 0, 0));
        far.mark_loaded();

        let camera = camera(0);
        let stats = manager.update(&camera);
        assert_eq!(stats.deleted, 0);
        assert!(manager.world().contains(Point3::new(10, 0, 0)));

        neighbor.mark_loaded();
        let stats = manager.update(&camera);
        assert_eq!(stats.deleted, 2);
        assert!(!manager.world().contains(Point3::new(10, 0, 0)));
        assert!(manager.world().check_neighbor_symmetry().is_empty());
    }

    #[test]
    fn unfinished_cube_pass_resumes_where_it_stopped() {
        let mut manager = manager(StreamingConfig {
            max_generated: 10,
            ..StreamingConfig::default()
        });
        let camera = camera(2);

        let stats = manager.update(&camera);
        assert_eq!(stats.created, 10);
        assert_eq!(manager.scan_cursor, Some(10));

        let mut previous = 10;
        while let Some(cursor) = manager.scan_cursor {
            assert!(cursor >= previous);
            previous = cursor;
            let stats = manager.update(&camera);
            assert!(stats.full_rescan);
        }
        assert!(manager.is_position_fully_loaded());
        let center = camera.chunk_position();
        let offsets = manager.cube_offsets.get(2).to_vec();
        assert!(offsets
            .iter()
            .all(|offset| manager.world().contains(center + *offset)));
    }
}
