//! The per-frame hand-off from the chunk manager to the render consumer.
//!
//! A [`RenderList`] is rebuilt from scratch on every update and read by the
//! consumer on the same thread, so it needs no synchronization. Entries are
//! sorted front-to-back, which lets the opaque pass benefit from early depth
//! rejection; the translucent pass walks the list in reverse.

use cgmath::Point3;

use super::meshing::mesh::MeshKind;
use super::upload::GpuMesh;
use crate::engine_state::streaming::scan;

/// One chunk to draw this frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderEntry {
    /// Chunk coordinate
    pub position: Point3<i32>,
    /// Opaque and translucent meshes, indexed by [`MeshKind::index`]
    pub meshes: [GpuMesh; 2],
    /// Squared chunk distance from the viewer
    pub distance_squared: i64,
}

impl RenderEntry {
    /// Mesh of one kind.
    pub fn mesh(&self, kind: MeshKind) -> &GpuMesh {
        &self.meshes[kind.index()]
    }
}

/// Chunks visible this frame, nearest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderList {
    entries: Vec<RenderEntry>,
}

impl RenderList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chunk seen from `viewer`.
    pub fn push(&mut self, position: Point3<i32>, meshes: [GpuMesh; 2], viewer: Point3<i32>) {
        self.entries.push(RenderEntry {
            position,
            meshes,
            distance_squared: scan::distance_squared(position, viewer),
        });
    }

    /// Sorts front-to-back, breaking ties by coordinate so the order does not
    /// depend on registry iteration order.
    pub fn finish(&mut self) {
        self.entries.sort_by_key(|entry| {
            (
                entry.distance_squared,
                entry.position.x,
                entry.position.y,
                entry.position.z,
            )
        });
    }

    /// Number of chunks to draw.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries front-to-back.
    pub fn entries(&self) -> &[RenderEntry] {
        &self.entries
    }

    /// Entries with geometry of `kind`, in draw order for that pass.
    pub fn pass(&self, kind: MeshKind) -> Box<dyn Iterator<Item = &RenderEntry> + '_> {
        let with_geometry = move |entry: &&RenderEntry| entry.mesh(kind).has_geometry();
        match kind {
            MeshKind::Opaque => Box::new(self.entries.iter().filter(with_geometry)),
            MeshKind::Translucent => Box::new(self.entries.iter().rev().filter(with_geometry)),
        }
    }

    /// Total indices across both passes.
    pub fn index_count(&self) -> u64 {
        self.entries
            .iter()
            .flat_map(|entry| entry.meshes.iter())
            .map(|mesh| mesh.index_count as u64)
            .sum()
    }
}
