//! # GPU Mesh Storage
//!
//! A [`MeshUploader`] backed by `wgpu`. Each uploaded chunk mesh owns one vertex
//! buffer and one index buffer, created with `create_buffer_init`, and is
//! referenced by a [`GpuMeshHandle`] the render consumer resolves through
//! [`WgpuMeshUploader::buffers`].
//!
//! Like the rest of the GPU-facing code, this must only be used from the thread
//! that owns the device.

use std::collections::HashMap;

use cgmath::Point3;
use log::{debug, warn};
use wgpu::util::DeviceExt;

use super::meshing::mesh::{MeshBuffers, MeshKind};
use super::upload::{GpuMeshHandle, MeshUploader};

/// Allocation analytics across all live chunk meshes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferAnalytics {
    /// Bytes currently allocated for vertex and index data
    pub allocated_memory: u64,
    /// Number of buffer pairs created since startup
    pub times_written: u64,
    /// Number of buffer pairs destroyed since startup
    pub times_released: u64,
}

/// The GPU buffers of one uploaded chunk mesh.
#[derive(Debug)]
pub struct ChunkBuffers {
    /// Vertex buffer laid out as [`Vertex::desc`](super::Vertex::desc)
    pub vertex_buffer: wgpu::Buffer,
    /// `u32` index buffer
    pub index_buffer: wgpu::Buffer,
    /// Number of indices to draw
    pub index_count: u32,
}

/// Creates and owns the GPU buffers of every loaded chunk mesh.
pub struct WgpuMeshUploader {
    device: wgpu::Device,
    buffers: HashMap<GpuMeshHandle, ChunkBuffers>,
    next_handle: u64,
    analytics: BufferAnalytics,
}

impl WgpuMeshUploader {
    /// Creates an uploader that allocates on `device`.
    pub fn new(device: wgpu::Device) -> Self {
        Self {
            device,
            buffers: HashMap::new(),
            next_handle: 0,
            analytics: BufferAnalytics::default(),
        }
    }

    /// Resolves a handle from the render list to its buffers.
    pub fn buffers(&self, handle: GpuMeshHandle) -> Option<&ChunkBuffers> {
        self.buffers.get(&handle)
    }

    /// Current allocation analytics.
    pub fn analytics(&self) -> BufferAnalytics {
        self.analytics
    }

    fn buffer_size(buffer: &wgpu::Buffer) -> u64 {
        buffer.size()
    }
}

impl MeshUploader for WgpuMeshUploader {
    fn upload(
        &mut self,
        position: Point3<i32>,
        kind: MeshKind,
        buffers: &MeshBuffers,
    ) -> Option<GpuMeshHandle> {
        if buffers.is_empty() {
            return None;
        }

        let label = format!("chunk {:?} {:?}", position, kind);
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} vertices")),
                contents: bytemuck::cast_slice(&buffers.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} indices")),
                contents: bytemuck::cast_slice(&buffers.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        self.analytics.allocated_memory +=
            Self::buffer_size(&vertex_buffer) + Self::buffer_size(&index_buffer);
        self.analytics.times_written += 1;

        let handle = GpuMeshHandle(self.next_handle);
        self.next_handle += 1;
        self.buffers.insert(
            handle,
            ChunkBuffers {
                vertex_buffer,
                index_buffer,
                index_count: buffers.indices.len() as u32,
            },
        );
        debug!("Uploaded {label} as {:?}", handle);
        Some(handle)
    }

    fn release(&mut self, handle: GpuMeshHandle) {
        match self.buffers.remove(&handle) {
            Some(chunk_buffers) => {
                self.analytics.allocated_memory = self.analytics.allocated_memory.saturating_sub(
                    Self::buffer_size(&chunk_buffers.vertex_buffer)
                        + Self::buffer_size(&chunk_buffers.index_buffer),
                );
                self.analytics.times_released += 1;
                chunk_buffers.vertex_buffer.destroy();
                chunk_buffers.index_buffer.destroy();
            }
            None => warn!("Release of unknown mesh handle {:?}", handle),
        }
    }
}
