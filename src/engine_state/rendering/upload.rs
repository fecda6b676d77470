//! # Mesh Upload Contract
//!
//! Meshing runs on the loader thread, but GPU resources may only be created on
//! the thread that owns the graphics context. Uploading is therefore a separate
//! stage driven by the chunk manager through the [`MeshUploader`] trait.
//!
//! Two implementations ship with the crate:
//! - [`HeadlessUploader`]: hands out handles and tracks byte counts without a GPU,
//!   used by tests, benchmarks and the demo binary.
//! - [`WgpuMeshUploader`](super::wgpu_uploader::WgpuMeshUploader): creates real
//!   vertex and index buffers.

use std::collections::HashMap;

use cgmath::Point3;

use super::meshing::mesh::{MeshBuffers, MeshKind};
use super::Vertex;

/// Opaque identifier of a GPU-resident mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GpuMeshHandle(pub u64);

/// What the render consumer needs to draw one mesh of a chunk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GpuMesh {
    /// Number of vertices uploaded
    pub vertex_count: u32,
    /// Number of indices to draw
    pub index_count: u32,
    /// Uploaded buffers, `None` when the mesh is empty
    pub handle: Option<GpuMeshHandle>,
}

impl GpuMesh {
    /// Whether there is anything to draw.
    pub fn has_geometry(&self) -> bool {
        self.index_count > 0
    }
}

/// Transfers finished meshes into GPU-resident storage.
///
/// Only ever called from the main thread.
pub trait MeshUploader {
    /// Uploads one mesh of the chunk at `position`.
    ///
    /// Returns `None` when nothing was allocated, which callers treat as an
    /// empty mesh.
    fn upload(
        &mut self,
        position: Point3<i32>,
        kind: MeshKind,
        buffers: &MeshBuffers,
    ) -> Option<GpuMeshHandle>;

    /// Frees the resources behind a handle returned by [`upload`](Self::upload).
    fn release(&mut self, handle: GpuMeshHandle);
}

/// Size bookkeeping for one upload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UploadRecord {
    /// Chunk the mesh belongs to
    pub position: Point3<i32>,
    /// Opaque or translucent
    pub kind: MeshKind,
    /// Bytes of vertex data
    pub vertex_bytes: u64,
    /// Bytes of index data
    pub index_bytes: u64,
}

/// A [`MeshUploader`] that keeps no GPU state.
#[derive(Debug, Default)]
pub struct HeadlessUploader {
    next_handle: u64,
    live: HashMap<GpuMeshHandle, UploadRecord>,
    total_uploads: u64,
    total_releases: u64,
}

impl HeadlessUploader {
    /// Creates an uploader with no live meshes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meshes uploaded and not yet released.
    pub fn live_meshes(&self) -> usize {
        self.live.len()
    }

    /// Bytes that would currently be resident on the GPU.
    pub fn resident_bytes(&self) -> u64 {
        self.live
            .values()
            .map(|record| record.vertex_bytes + record.index_bytes)
            .sum()
    }

    /// Total uploads since creation.
    pub fn total_uploads(&self) -> u64 {
        self.total_uploads
    }

    /// Total releases since creation.
    pub fn total_releases(&self) -> u64 {
        self.total_releases
    }

    /// Bookkeeping for a live handle.
    pub fn record(&self, handle: GpuMeshHandle) -> Option<&UploadRecord> {
        self.live.get(&handle)
    }
}

impl MeshUploader for HeadlessUploader {
    fn upload(
        &mut self,
        position: Point3<i32>,
        kind: MeshKind,
        buffers: &MeshBuffers,
    ) -> Option<GpuMeshHandle> {
        if buffers.is_empty() {
            return None;
        }

        let handle = GpuMeshHandle(self.next_handle);
        self.next_handle += 1;
        self.total_uploads += 1;
        self.live.insert(
            handle,
            UploadRecord {
                position,
                kind,
                vertex_bytes: (buffers.vertices.len() * std::mem::size_of::<Vertex>()) as u64,
                index_bytes: (buffers.indices.len() * std::mem::size_of::<u32>()) as u64,
            },
        );
        Some(handle)
    }

    fn release(&mut self, handle: GpuMeshHandle) {
        if self.live.remove(&handle).is_some() {
            self.total_releases += 1;
        } else {
            log::warn!("Release of unknown mesh handle {:?}", handle);
        }
    }
}
