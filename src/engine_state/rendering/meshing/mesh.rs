//! Mesh data structures for chunk rendering.
//!
//! A chunk produces two independent meshes, one for opaque blocks and one for
//! translucent liquid. Each is a flat vertex buffer plus a `u32` index buffer
//! built from a fixed four-vertex template per block face.

use crate::engine_state::rendering::Vertex;
use crate::engine_state::voxels::block::block_side::BlockSide;

/// Which of a chunk's two meshes a face belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    /// Solid geometry, drawn first without blending.
    Opaque = 0,
    /// Liquid geometry, drawn after the opaque pass with blending.
    Translucent = 1,
}

impl MeshKind {
    /// Both kinds in buffer order.
    pub const ALL: [MeshKind; 2] = [MeshKind::Opaque, MeshKind::Translucent];

    /// Buffer slot of this kind.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Unit-cube corners per face, ordered bottom-left, bottom-right, top-right,
/// top-left when looking at the face from outside.
#[rustfmt::skip]
const FACE_VERTICES: [[[f32; 3]; 4]; 6] = [
    // Left
    [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    // Right
    [[1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]],
    // Bottom
    [[1.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
    // Top
    [[0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
    // Back
    [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
    // Front
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
];

const FACE_TEX_COORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Two counter-clockwise triangles over the four face vertices.
pub const FACE_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Vertices emitted per face.
pub const VERTICES_PER_FACE: usize = 4;

/// Vertex and index data for one mesh of a chunk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshBuffers {
    /// Vertex data, four vertices per face
    pub vertices: Vec<Vertex>,
    /// Index data, six indices per face, offsets into `vertices`
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Creates empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no face has been emitted.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of faces emitted so far.
    pub fn face_count(&self) -> usize {
        self.indices.len() / FACE_INDICES.len()
    }

    /// Appends one block face.
    ///
    /// # Arguments
    /// * `side` - Which face of the block to emit
    /// * `origin` - World position of the block's minimum corner
    /// * `texture_index` - Atlas layer for this face
    /// * `height` - Vertical scale of the block, `1.0` for full blocks. Side faces
    ///   scale their `v` coordinate by the same amount so the texture is cropped
    ///   rather than squashed.
    pub fn push_face(&mut self, side: BlockSide, origin: [f32; 3], texture_index: u32, height: f32) {
        let base = self.vertices.len() as u32;
        let stretch_v = !matches!(side, BlockSide::TOP | BlockSide::BOTTOM);
        let normal = side.normal();

        for (corner, uv) in FACE_VERTICES[side.index()].iter().zip(FACE_TEX_COORDS) {
            let v = if stretch_v { uv[1] * height } else { uv[1] };
            self.vertices.push(Vertex {
                position: [
                    corner[0] + origin[0],
                    height * corner[1] + origin[1],
                    corner[2] + origin[2],
                ],
                tex_coords: [uv[0], v],
                texture_index,
                normal,
            });
        }

        self.indices
            .extend(FACE_INDICES.iter().map(|index| index + base));
    }
}

/// The opaque and translucent meshes of a chunk.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChunkMeshes {
    /// Buffers indexed by [`MeshKind::index`].
    pub buffers: [MeshBuffers; 2],
}

impl ChunkMeshes {
    /// Creates a pair of empty meshes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers for one mesh kind.
    pub fn get(&self, kind: MeshKind) -> &MeshBuffers {
        &self.buffers[kind.index()]
    }

    /// Mutable buffers for one mesh kind.
    pub fn get_mut(&mut self, kind: MeshKind) -> &mut MeshBuffers {
        &mut self.buffers[kind.index()]
    }

    /// Faces across both meshes.
    pub fn face_count(&self) -> usize {
        self.buffers.iter().map(MeshBuffers::face_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_offset_per_buffer() {
        let mut buffers = MeshBuffers::new();
        buffers.push_face(BlockSide::TOP, [0.0, 0.0, 0.0], 1, 1.0);
        buffers.push_face(BlockSide::LEFT, [0.0, 0.0, 0.0], 1, 1.0);
        assert_eq!(buffers.face_count(), 2);
        assert_eq!(&buffers.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn every_template_vertex_lies_on_its_face_plane() {
        for side in BlockSide::all() {
            let mut buffers = MeshBuffers::new();
            buffers.push_face(side, [0.0, 0.0, 0.0], 0, 1.0);
            let plane = if side.direction() > 0 { 1.0 } else { 0.0 };
            for vertex in &buffers.vertices {
                assert_eq!(vertex.position[side.axis()], plane);
                assert_eq!(vertex.normal, side.normal());
            }
        }
    }

    #[test]
    fn lowered_side_face_crops_its_texture() {
        let mut buffers = MeshBuffers::new();
        buffers.push_face(BlockSide::FRONT, [2.0, 3.0, 4.0], 0, 0.8);
        let top_v = buffers.vertices.iter().map(|v| v.tex_coords[1]).fold(0.0, f32::max);
        let top_y = buffers.vertices.iter().map(|v| v.position[1]).fold(0.0, f32::max);
        assert!((top_v - 0.8).abs() < 1e-6);
        assert!((top_y - 3.8).abs() < 1e-6);

        let mut top = MeshBuffers::new();
        top.push_face(BlockSide::TOP, [0.0, 0.0, 0.0], 0, 0.8);
        assert!(top.vertices.iter().any(|v| v.tex_coords[1] == 1.0));
    }
}
