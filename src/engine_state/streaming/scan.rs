//! Distance tests and scan regions for the streaming policy.
//!
//! The desired chunk set around a viewer is the cube `[-d, +d]³` around its
//! chunk. When the viewer moves a little, only the slabs of that cube that were
//! not part of the previous cube need to be checked for missing chunks. A move
//! of `2d + 1` or more in Manhattan distance, a render distance change, or an
//! unfinished previous pass falls back to scanning the whole cube.
//!
//! Distances are squared in `i64`; chunk coordinates span most of `i32`.

use cgmath::{Point3, Vector3};

/// Sum of absolute per-axis differences.
pub fn manhattan_distance(a: Point3<i32>, b: Point3<i32>) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs()
}

/// Largest absolute per-axis difference.
pub fn chebyshev_distance(a: Point3<i32>, b: Point3<i32>) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs()).max((a.z - b.z).abs())
}

/// Squared Euclidean distance between two chunk coordinates.
pub fn distance_squared(a: Point3<i32>, b: Point3<i32>) -> i64 {
    let (dx, dy, dz) = (
        i64::from(a.x) - i64::from(b.x),
        i64::from(a.y) - i64::from(b.y),
        i64::from(a.z) - i64::from(b.z),
    );
    dx * dx + dy * dy + dz * dz
}

/// Whether `position` is inside the render sphere around `center`.
///
/// The radius is padded by one chunk so chunks that only partly overlap the
/// sphere are included.
pub fn is_within_sphere(position: Point3<i32>, center: Point3<i32>, render_distance: i32) -> bool {
    let radius = i64::from(render_distance) + 1;
    distance_squared(position, center) < radius * radius
}

/// Whether `position` is inside the box of half-extent `extent` around `center`.
pub fn is_within_box(position: Point3<i32>, center: Point3<i32>, extent: i32) -> bool {
    chebyshev_distance(position, center) <= extent
}

/// Whether the creation phase must scan the whole cube instead of slabs.
pub fn needs_full_rescan(
    previous: Option<Point3<i32>>,
    current: Point3<i32>,
    previous_render_distance: i32,
    render_distance: i32,
    previous_pass_complete: bool,
) -> bool {
    match previous {
        None => true,
        Some(previous) => {
            !previous_pass_complete
                || previous_render_distance != render_distance
                || manhattan_distance(previous, current) >= 2 * render_distance + 1
        }
    }
}

/// Offsets of the cube `[-d, +d]³`, nearest to the center first.
///
/// Built once per render distance. A full creation pass walks these offsets
/// instead of collecting and sorting the cube every frame, and an unfinished
/// pass records where it stopped so the next frame can resume there.
#[derive(Clone, Debug, Default)]
pub struct CubeOffsets {
    render_distance: Option<i32>,
    offsets: Vec<Vector3<i32>>,
}

impl CubeOffsets {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted offsets for `render_distance`, rebuilt when it changed.
    pub fn get(&mut self, render_distance: i32) -> &[Vector3<i32>] {
        if self.render_distance != Some(render_distance) {
            let d = render_distance.max(0);
            let mut offsets = Vec::with_capacity((2 * d as usize + 1).pow(3));
            for x in -d..=d {
                for y in -d..=d {
                    for z in -d..=d {
                        offsets.push(Vector3::new(x, y, z));
                    }
                }
            }
            offsets.sort_by_key(|o| (o.x * o.x + o.y * o.y + o.z * o.z, o.x, o.y, o.z));
            self.offsets = offsets;
            self.render_distance = Some(render_distance);
        }
        &self.offsets
    }
}

/// An inclusive box of chunk coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct ScanBox {
    min: Point3<i32>,
    max: Point3<i32>,
}

/// Chunk coordinates newly exposed by a small move.
#[derive(Clone, Debug)]
pub struct ScanRegion {
    center: Point3<i32>,
    boxes: Vec<ScanBox>,
}

impl ScanRegion {
    /// The parts of the cube around `current` that lie outside the cube around
    /// `previous`, one slab per axis that changed.
    pub fn slabs(previous: Point3<i32>, current: Point3<i32>, render_distance: i32) -> Self {
        let d = render_distance;
        let extent = Vector3::new(d, d, d);
        let cube_min = current - extent;
        let cube_max = current + extent;
        let diff = current - previous;

        let mut boxes = Vec::new();
        for axis in 0..3 {
            let delta = diff[axis];
            if delta == 0 {
                continue;
            }
            let mut min = cube_min;
            let mut max = cube_max;
            if delta > 0 {
                min[axis] = (previous[axis] + d + 1).max(cube_min[axis]);
            } else {
                max[axis] = (previous[axis] - d - 1).min(cube_max[axis]);
            }
            if min[axis] <= max[axis] {
                boxes.push(ScanBox { min, max });
            }
        }

        Self {
            center: current,
            boxes,
        }
    }

    /// Every coordinate in the region once, nearest to the center first.
    pub fn positions(&self) -> Vec<Point3<i32>> {
        let mut positions = Vec::new();
        for scan_box in &self.boxes {
            for x in scan_box.min.x..=scan_box.max.x {
                for y in scan_box.min.y..=scan_box.max.y {
                    for z in scan_box.min.z..=scan_box.max.z {
                        positions.push(Point3::new(x, y, z));
                    }
                }
            }
        }

        positions.sort_by_key(|p| (distance_squared(*p, self.center), p.x, p.y, p.z));
        positions.dedup();
        positions
    }
}
