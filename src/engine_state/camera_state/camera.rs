//! # Camera Implementation
//!
//! This module contains the viewpoint the chunk manager streams around:
//! - `Camera`: position, orientation and render distance
//! - `Projection`: perspective settings used for frustum culling

use cgmath::*;
use std::f32::consts::FRAC_PI_2;

use crate::engine_state::voxels::chunk::{chunk_coords, CHUNK_DIMENSION};

/// Transformation matrix to convert from OpenGL's coordinate system to WGPU's.
///
/// Maps clip-space Z from [-1, 1] to [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Safe limit for pitch to prevent gimbal lock
const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Chunks past the render distance still covered by the far plane.
const FAR_PLANE_MARGIN: i32 = 2;

/// Represents a first-person camera in 3D space.
///
/// Yaw rotates around the Y axis starting from +X, pitch tilts up from the
/// horizon.
#[derive(Debug, Clone)]
pub struct Camera {
    /// The camera's position in world space
    pub position: Point3<f32>,
    /// Horizontal rotation (around Y axis) in radians
    pub yaw: Rad<f32>,
    /// Vertical rotation (around X axis) in radians
    pub pitch: Rad<f32>,
    /// Perspective settings
    pub projection: Projection,
    /// Radius in chunks around the camera that gets streamed in
    pub render_distance: i32,
}

impl Camera {
    /// Creates a new camera with the specified position and orientation.
    ///
    /// # Arguments
    /// * `position` - Initial position of the camera in world space
    /// * `yaw` - Initial yaw (horizontal rotation around Y axis)
    /// * `pitch` - Initial pitch (vertical rotation around X axis)
    /// * `projection` - Perspective settings
    /// * `render_distance` - Streaming radius in chunks
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
        projection: Projection,
        render_distance: i32,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            projection,
            render_distance,
        }
    }

    /// Normalized direction the camera looks in.
    pub fn forward(&self) -> Vector3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize()
    }

    /// Normalized vector pointing to the camera's right.
    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(Vector3::unit_y()).normalize()
    }

    /// Normalized vector pointing out of the top of the screen.
    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.forward()).normalize()
    }

    /// Distance of the far plane: two chunks past the render distance.
    pub fn far_distance(&self) -> f32 {
        ((self.render_distance + FAR_PLANE_MARGIN) * CHUNK_DIMENSION) as f32
    }

    /// Chunk coordinate containing the camera.
    pub fn chunk_position(&self) -> Point3<i32> {
        chunk_coords::position_to_chunk(self.position)
    }

    /// Calculates the view matrix for this camera.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }

    /// Turns the view, keeping the pitch short of straight up or down.
    pub fn rotate(&mut self, yaw: Rad<f32>, pitch: Rad<f32>) {
        self.yaw += yaw;
        self.pitch = Rad((self.pitch + pitch).0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
    }
}

/// Perspective projection settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Vertical field of view in radians
    pub fovy: Rad<f32>,
    /// Near clipping plane distance
    pub znear: f32,
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `width` - Viewport width in pixels
    /// * `height` - Viewport height in pixels
    /// * `fovy` - Vertical field of view
    /// * `znear` - Near clipping plane distance
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
        }
    }

    /// Updates the aspect ratio after a viewport resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Projection matrix for a given far distance, in WGPU clip space.
    pub fn calc_matrix(&self, zfar: f32) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, zfar)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(16, 9, Deg(60.0), 0.1)
    }
}
