//! Block targeting for break and place actions.
//!
//! The ray is marched from cell boundary to cell boundary, stepping a hair
//! past each boundary so the next sample lands inside the next cell.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::engine_state::voxels::block::block_type::BlockType;

/// Default reach in blocks.
pub const DEFAULT_REACH: f32 = 5.0;

/// Distance stepped past each cell boundary.
const BOUNDARY_EPSILON: f32 = 0.001;

/// Result of a selection ray.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// First solid block hit
    pub selected: Option<Point3<i32>>,
    /// Cell the ray passed through right before the hit
    pub placement: Option<Point3<i32>>,
}

impl Selection {
    /// Whether the ray hit anything.
    pub fn is_block_selected(&self) -> bool {
        self.selected.is_some()
    }
}

fn floor_cell(position: Point3<f32>) -> Point3<i32> {
    Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    )
}

/// Marches from `origin` along `direction` until a selectable block is found
/// or `reach` is exhausted.
///
/// `get_block` is queried with world block coordinates. Air and water are
/// passed through.
pub fn raycast<F>(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    reach: f32,
    get_block: F,
) -> Selection
where
    F: Fn(Point3<i32>) -> BlockType,
{
    if direction.magnitude2() == 0.0 {
        return Selection::default();
    }
    let direction = direction.normalize();

    let mut position = origin;
    let mut cell = floor_cell(position);
    let mut previous = cell;
    let mut travelled = 0.0;

    while travelled < reach {
        if get_block(cell).is_selectable() {
            return Selection {
                selected: Some(cell),
                placement: (previous != cell).then_some(previous),
            };
        }

        let mut step = f32::INFINITY;
        for axis in 0..3 {
            let factor = if direction[axis] > 0.0 {
                ((position[axis] + 1.0).floor() - position[axis]) / direction[axis]
            } else if direction[axis] < 0.0 {
                (position[axis].floor() - position[axis]) / direction[axis]
            } else {
                f32::INFINITY
            };
            step = step.min(factor);
        }
        step += BOUNDARY_EPSILON;

        position += direction * step;
        previous = cell;
        cell = floor_cell(position);
        travelled += step;
    }

    Selection::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_at(y: i32) -> impl Fn(Point3<i32>) -> BlockType {
        move |p: Point3<i32>| {
            if p.y <= y {
                BlockType::STONE
            } else {
                BlockType::AIR
            }
        }
    }

    #[test]
    fn looking_down_selects_the_floor() {
        let selection = raycast(
            Point3::new(0.5, 2.5, 0.5),
            Vector3::new(0.0, -1.0, 0.0),
            DEFAULT_REACH,
            floor_at(0),
        );
        assert_eq!(selection.selected, Some(Point3::new(0, 0, 0)));
        assert_eq!(selection.placement, Some(Point3::new(0, 1, 0)));
    }

    #[test]
    fn water_is_passed_through() {
        let world = |p: Point3<i32>| match p.x {
            1 | 2 => BlockType::WATER,
            3 => BlockType::SAND,
            _ => BlockType::AIR,
        };
        let selection = raycast(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(1.0, 0.0, 0.0),
            DEFAULT_REACH,
            world,
        );
        assert_eq!(selection.selected, Some(Point3::new(3, 0, 0)));
        assert_eq!(selection.placement, Some(Point3::new(2, 0, 0)));
    }

    #[test]
    fn nothing_beyond_reach() {
        let selection = raycast(
            Point3::new(0.5, 10.5, 0.5),
            Vector3::new(0.0, -1.0, 0.0),
            DEFAULT_REACH,
            floor_at(0),
        );
        assert!(!selection.is_block_selected());
        assert_eq!(selection.placement, None);
    }

    #[test]
    fn starting_inside_a_block_has_no_placement() {
        let selection = raycast(
            Point3::new(0.5, -0.5, 0.5),
            Vector3::new(0.0, 1.0, 0.0),
            DEFAULT_REACH,
            floor_at(0),
        );
        assert_eq!(selection.selected, Some(Point3::new(0, -1, 0)));
        assert_eq!(selection.placement, None);
    }
}
