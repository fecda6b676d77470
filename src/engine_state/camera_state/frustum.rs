//! # View Frustum Culling
//!
//! Axis-aligned boxes and the six-plane camera frustum used to decide which
//! chunks enter the render list.
//!
//! Every plane stores an inward-facing normal, so a positive signed distance
//! means "inside". For each plane the box corner furthest along the normal (the
//! positive vertex) is picked with a 3-bit sign lookup; if that corner is
//! behind any plane the whole box is outside. The test is conservative: boxes
//! near the frustum edges may be reported visible when they are not.

use cgmath::{InnerSpace, Point3, Vector3};

use super::camera::Camera;

/// Slack applied to every plane so boxes exactly on a plane stay visible.
pub const FRUSTUM_TOLERANCE: f32 = 0.0001;

/// Axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3<f32>,
    /// Maximum corner
    pub max: Point3<f32>,
}

impl Aabb {
    /// Creates a box from its two extreme corners.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// One of the eight corners. Bit 0 of `index` picks max x, bit 1 max y,
    /// bit 2 max z.
    pub fn corner(&self, index: usize) -> Point3<f32> {
        Point3::new(
            if index & 1 != 0 { self.max.x } else { self.min.x },
            if index & 2 != 0 { self.max.y } else { self.min.y },
            if index & 4 != 0 { self.max.z } else { self.min.z },
        )
    }
}

/// A plane `dot(normal, p) == constant`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the kept half-space
    pub normal: Vector3<f32>,
    /// Signed offset along the normal
    pub constant: f32,
}

impl Plane {
    /// Plane through `point` with the given normal.
    pub fn from_normal_and_point(normal: Vector3<f32>, point: Point3<f32>) -> Self {
        Self {
            normal,
            constant: normal.dot(point_to_vector(point)),
        }
    }

    /// Signed distance of `point`, positive on the inside.
    pub fn distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(point_to_vector(point)) - self.constant
    }

    /// Index of the box corner furthest along the normal.
    fn positive_vertex_index(&self) -> usize {
        (self.normal.x > 0.0) as usize
            | ((self.normal.y > 0.0) as usize) << 1
            | ((self.normal.z > 0.0) as usize) << 2
    }
}

fn point_to_vector(point: Point3<f32>) -> Vector3<f32> {
    Vector3::new(point.x, point.y, point.z)
}

/// The six planes bounding what the camera can see.
#[derive(Copy, Clone, Debug)]
pub struct Frustum {
    planes: [Plane; 6],
    positive_vertices: [usize; 6],
}

impl Frustum {
    /// Builds a frustum from raw planes.
    pub fn from_planes(planes: [Plane; 6]) -> Self {
        Self {
            positive_vertices: planes.map(|plane| plane.positive_vertex_index()),
            planes,
        }
    }

    /// Builds the near, far, left, right, bottom and top planes of a camera.
    pub fn from_camera(camera: &Camera) -> Self {
        let position = camera.position;
        let forward = camera.forward();
        let right = camera.right();
        let up = camera.up();
        let near = camera.projection.znear;
        let far = camera.far_distance();

        let near_height = 2.0 * (camera.projection.fovy.0 * 0.5).tan() * near;
        let near_width = near_height * camera.projection.aspect;
        let to_near = forward * near;

        let side_plane = |normal: Vector3<f32>| Plane::from_normal_and_point(normal.normalize(), position);

        Self::from_planes([
            Plane::from_normal_and_point(forward, position + to_near),
            Plane::from_normal_and_point(-forward, position + forward * far),
            side_plane((to_near - right * (0.5 * near_width)).cross(up)),
            side_plane(up.cross(to_near + right * (0.5 * near_width))),
            side_plane(right.cross(to_near - up * (0.5 * near_height))),
            side_plane((to_near + up * (0.5 * near_height)).cross(right)),
        ])
    }

    /// The planes in near, far, left, right, bottom, top order.
    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Whether any part of the box may be inside the frustum.
    pub fn intersects(&self, aabb: &Aabb) -> bool {
        self.planes
            .iter()
            .zip(self.positive_vertices)
            .all(|(plane, corner)| plane.distance(aabb.corner(corner)) >= -FRUSTUM_TOLERANCE)
    }
}
