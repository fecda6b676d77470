//! # Block Side Module
//!
//! This module defines the six faces of a voxel block. The same ordering is used
//! for chunk neighbor slots, face templates and per-face texture indices.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// Faces come in axis pairs, negative direction first, so the opposite face of
/// any side is found by flipping the lowest bit.
///
/// The order is: [LEFT, RIGHT, BOTTOM, TOP, BACK, FRONT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The left face (facing negative X)
    LEFT = 0,

    /// The right face (facing positive X)
    RIGHT = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The back face (facing negative Z)
    BACK = 4,

    /// The front face (facing positive Z)
    FRONT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in slot order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::BACK,
            BlockSide::FRONT,
        ]
    }

    /// Returns the side for a slot index, wrapping indices past 5.
    pub fn from_index(index: usize) -> BlockSide {
        Self::all()[index % 6]
    }

    /// Slot index of this side.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The face pointing the other way along the same axis.
    pub fn opposite(self) -> BlockSide {
        Self::from_index(self.index() ^ 1)
    }

    /// Axis this face is perpendicular to (0 = x, 1 = y, 2 = z).
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    /// `-1` for faces pointing down their axis, `+1` otherwise.
    pub fn direction(self) -> i32 {
        if self.index() % 2 == 0 {
            -1
        } else {
            1
        }
    }

    /// Unit step towards the neighboring cell on this side.
    pub fn offset(self) -> Vector3<i32> {
        let mut offset = Vector3::new(0, 0, 0);
        offset[self.axis()] = self.direction();
        offset
    }

    /// Outward facing normal of this face.
    pub fn normal(self) -> [f32; 3] {
        let offset = self.offset();
        [offset.x as f32, offset.y as f32, offset.z as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution_on_the_same_axis() {
        for side in BlockSide::all() {
            let opposite = side.opposite();
            assert_ne!(side, opposite);
            assert_eq!(opposite.opposite(), side);
            assert_eq!(side.axis(), opposite.axis());
            assert_eq!(side.offset() + opposite.offset(), Vector3::new(0, 0, 0));
        }
    }

    #[test]
    fn slot_order_matches_axis_directions() {
        assert_eq!(BlockSide::LEFT.offset(), Vector3::new(-1, 0, 0));
        assert_eq!(BlockSide::RIGHT.offset(), Vector3::new(1, 0, 0));
        assert_eq!(BlockSide::BOTTOM.offset(), Vector3::new(0, -1, 0));
        assert_eq!(BlockSide::TOP.offset(), Vector3::new(0, 1, 0));
        assert_eq!(BlockSide::BACK.offset(), Vector3::new(0, 0, -1));
        assert_eq!(BlockSide::FRONT.offset(), Vector3::new(0, 0, 1));
    }
}
