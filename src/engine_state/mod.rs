//! # Engine State Module
//!
//! The core engine module that ties the viewpoint, the streaming policy and
//! block editing together.
//!
//! ## Key Components
//!
//! * `EngineState` - The per-frame coordinator
//! * `camera_state` - Camera, projection and frustum
//! * `rendering` - Meshing, mesh upload and the render list
//! * `selection` - Ray-marched block targeting
//! * `streaming` - The chunk manager deciding what exists, what is meshed and what is drawn
//! * `task_management` - The background chunk loader
//! * `voxels` - Blocks, chunks, terrain and the chunk registry
//!
//! ## Frame Flow
//!
//! 1. The caller moves the camera through [`EngineState::camera_mut`].
//! 2. The chunk manager streams around the new camera position and publishes a
//!    render list.
//! 3. The selection ray is refreshed against the updated world.

use log::debug;

use camera_state::Camera;
use rendering::render_list::RenderList;
use rendering::upload::{HeadlessUploader, MeshUploader};
use selection::{raycast, Selection, DEFAULT_REACH};
use streaming::{ChunkManager, FrameStats};
use voxels::block::block_type::BlockType;

pub mod camera_state;
pub mod rendering;
pub mod selection;
pub mod streaming;
pub mod task_management;
pub mod voxels;

/// The per-frame coordinator of the engine.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chunk_streamer::{
///     BlockRegistry, BlockType, Camera, ChunkManager, EngineConfig, EngineState,
///     HeadlessUploader, Projection, TerrainFn,
/// };
///
/// let config = EngineConfig::default();
/// let manager = ChunkManager::with_inline_loader(
///     config.streaming.clone(),
///     Arc::new(BlockRegistry::standard()),
///     Box::new(TerrainFn(|_, y, _| if y < 0 { BlockType::STONE } else { BlockType::AIR })),
///     HeadlessUploader::new(),
/// );
/// let camera = Camera::new((8.0, 4.0, 8.0), cgmath::Deg(0.0), cgmath::Deg(-45.0), Projection::default(), 1);
/// let mut engine = EngineState::new(camera, manager);
///
/// for _ in 0..3 {
///     engine.update();
/// }
/// assert!(!engine.render_list().is_empty());
/// ```
pub struct EngineState<U: MeshUploader = HeadlessUploader> {
    camera: Camera,
    chunk_manager: ChunkManager<U>,
    selection: Selection,
    reach: f32,
}

impl<U: MeshUploader> EngineState<U> {
    /// Creates an engine around a camera and a chunk manager.
    pub fn new(camera: Camera, chunk_manager: ChunkManager<U>) -> Self {
        Self {
            camera,
            chunk_manager,
            selection: Selection::default(),
            reach: DEFAULT_REACH,
        }
    }

    /// Streams chunks around the camera and refreshes the selection.
    pub fn update(&mut self) -> FrameStats {
        let stats = self.chunk_manager.update(&self.camera);
        self.refresh_selection();
        stats
    }

    fn refresh_selection(&mut self) {
        let manager = &self.chunk_manager;
        self.selection = raycast(
            self.camera.position,
            self.camera.forward(),
            self.reach,
            |position| manager.get_block(position),
        );
    }

    /// Replaces the selected block with air.
    ///
    /// # Returns
    /// Whether a block was selected and the edit went through.
    pub fn break_selected_block(&mut self) -> bool {
        let Some(selected) = self.selection.selected else {
            return false;
        };
        let edited = self.chunk_manager.set_block(selected, BlockType::AIR);
        if edited {
            debug!("Broke block at {:?}", selected);
            self.refresh_selection();
        }
        edited
    }

    /// Places `block` in the cell in front of the selected block.
    ///
    /// # Returns
    /// Whether a placement cell existed and the edit went through.
    pub fn place_block(&mut self, block: BlockType) -> bool {
        let Some(placement) = self.selection.placement else {
            return false;
        };
        let edited = self.chunk_manager.set_block(placement, block);
        if edited {
            debug!("Placed {:?} at {:?}", block, placement);
            self.refresh_selection();
        }
        edited
    }

    /// The camera streamed around.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable access to the camera, to move it or change the render distance.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// The chunk manager.
    pub fn chunk_manager(&self) -> &ChunkManager<U> {
        &self.chunk_manager
    }

    /// Mutable access to the chunk manager.
    pub fn chunk_manager_mut(&mut self) -> &mut ChunkManager<U> {
        &mut self.chunk_manager
    }

    /// The current block selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Chunks to draw this frame.
    pub fn render_list(&self) -> &RenderList {
        self.chunk_manager.render_list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::camera_state::Projection;
    use crate::engine_state::voxels::block::BlockRegistry;
    use crate::engine_state::voxels::terrain::TerrainFn;
    use cgmath::{Deg, Point3};
    use std::sync::Arc;

    fn engine() -> EngineState {
        let manager = ChunkManager::with_inline_loader(
            crate::config::StreamingConfig::default(),
            Arc::new(BlockRegistry::standard()),
            Box::new(TerrainFn(|_, y, _| {
                if y < 0 {
                    BlockType::STONE
                } else {
                    BlockType::AIR
                }
            })),
            HeadlessUploader::new(),
        );
        let camera = Camera::new((8.5, 2.5, 8.5), Deg(0.0), Deg(-89.0), Projection::default(), 1);
        EngineState::new(camera, manager)
    }

    #[test]
    fn break_and_place_edit_the_world() {
        let mut engine = engine();
        for _ in 0..3 {
            engine.update();
        }
        assert_eq!(engine.selection().selected, Some(Point3::new(8, -1, 8)));

        assert!(engine.break_selected_block());
        assert_eq!(
            engine.chunk_manager().get_block(Point3::new(8, -1, 8)),
            BlockType::AIR
        );
        assert_eq!(engine.selection().selected, Some(Point3::new(8, -2, 8)));

        assert!(engine.place_block(BlockType::SAND));
        assert_eq!(
            engine.chunk_manager().get_block(Point3::new(8, -1, 8)),
            BlockType::SAND
        );
    }

    #[test]
    fn moving_the_camera_streams_around_it() {
        let mut engine = engine();
        engine.update();
        assert!(engine.chunk_manager().world().contains(Point3::new(0, 0, 0)));

        engine.camera_mut().position.z += 16.0 * 8.0;
        for _ in 0..8 {
            engine.update();
        }
        let world = engine.chunk_manager().world();
        assert!(!world.contains(Point3::new(0, 0, 0)));
        assert!(world.contains(Point3::new(0, 0, 8)));
        assert_eq!(engine.selection().selected, Some(Point3::new(8, -1, 136)));
    }
}
