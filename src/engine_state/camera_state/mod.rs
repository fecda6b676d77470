//! # Camera State
//!
//! The viewpoint the world is streamed around and the frustum used to cull
//! chunks against it.
//!
//! ## Core Components
//! - `Camera`: position, orientation, projection and render distance
//! - `Frustum` and `Aabb`: conservative visibility test for chunk bounds

pub mod camera;
pub mod frustum;

pub use camera::{Camera, Projection};
pub use frustum::{Aabb, Frustum, Plane};
