//! Rendering side of the chunk pipeline.
//!
//! This module turns chunk data into meshes and hands them to the render
//! consumer. Draw-call issuance is left to the consumer; what lives here is:
//! - `meshing`: face-culled mesh generation for a chunk
//! - `upload`: the main-thread upload contract and a headless implementation
//! - `wgpu_uploader`: GPU buffer creation with `wgpu`
//! - `render_list`: the per-frame list of chunks to draw

pub mod meshing;
pub mod render_list;
pub mod upload;
mod vertex;
pub mod wgpu_uploader;

// Re-export commonly used types
pub use vertex::Vertex;
