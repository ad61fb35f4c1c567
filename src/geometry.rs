//! Direction flags, grid coordinates, and small scalar helpers.
//!
//! Cells connect to each other through the four cardinal sides. A cell
//! prototype advertises its open sides as a [`Direction`] flag set, and the
//! cell registry keys placed cells by [`GridCoord`].
//!
//! The world uses a y-up convention: [`Direction::UP`] points toward
//! increasing `row` and increasing world `y`.

use std::f32::consts::FRAC_PI_2;

use arrayvec::ArrayVec;
use bitflags::bitflags;
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of cardinal directions. Values may be combined.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Direction: u8 {
        const UP = 1;
        const RIGHT = 2;
        const DOWN = 4;
        const LEFT = 8;
    }
}

impl Direction {
    pub const NONE: Direction = Direction::empty();

    /// Single-bit directions in adjacency-slot order.
    pub const CARDINALS: [Direction; 4] = [
        Direction::UP,
        Direction::RIGHT,
        Direction::DOWN,
        Direction::LEFT,
    ];

    /// Flip every set bit to its opposite side.
    pub fn mirror(self) -> Direction {
        let mut out = Direction::NONE;
        if self.contains(Direction::UP) {
            out |= Direction::DOWN;
        }
        if self.contains(Direction::DOWN) {
            out |= Direction::UP;
        }
        if self.contains(Direction::LEFT) {
            out |= Direction::RIGHT;
        }
        if self.contains(Direction::RIGHT) {
            out |= Direction::LEFT;
        }
        out
    }

    /// Sum of the unit vectors of every set bit.
    pub fn to_vector(self) -> IVec2 {
        let mut v = IVec2::ZERO;
        if self.contains(Direction::UP) {
            v.y += 1;
        }
        if self.contains(Direction::DOWN) {
            v.y -= 1;
        }
        if self.contains(Direction::RIGHT) {
            v.x += 1;
        }
        if self.contains(Direction::LEFT) {
            v.x -= 1;
        }
        v
    }

    /// Direction flags from the signs of a vector. Magnitude is ignored.
    pub fn from_vector(v: Vec2) -> Direction {
        let mut out = Direction::NONE;
        match sign(v.x) {
            1 => out |= Direction::RIGHT,
            -1 => out |= Direction::LEFT,
            _ => {}
        }
        match sign(v.y) {
            1 => out |= Direction::UP,
            -1 => out |= Direction::DOWN,
            _ => {}
        }
        out
    }

    /// Every bit of `target` is present in `self`.
    pub fn has_all(self, target: Direction) -> bool {
        self.contains(target)
    }

    /// At least one bit of `target` is present in `self`.
    ///
    /// An empty `target` imposes nothing, so this returns `true` for it.
    pub fn has_any(self, target: Direction) -> bool {
        target.is_empty() || self.intersects(target)
    }

    /// Adjacency slot of a single-bit direction (UP=0, RIGHT=1, DOWN=2, LEFT=3).
    ///
    /// # Panics
    /// Panics when `self` is empty or has more than one bit set.
    pub fn index(self) -> usize {
        match self.try_index() {
            Some(i) => i,
            None => panic!("Direction::index requires exactly one bit, got {:?}", self),
        }
    }

    /// Like [`Direction::index`], but returns `None` for zero or multi-bit input.
    pub fn try_index(self) -> Option<usize> {
        let bits = self.bits();
        if bits.count_ones() == 1 {
            Some(bits.trailing_zeros() as usize)
        } else {
            None
        }
    }

    /// Inverse of [`Direction::index`].
    pub fn from_index(index: usize) -> Option<Direction> {
        Self::CARDINALS.get(index).copied()
    }

    /// The set bits as single-bit directions, in slot order.
    pub fn split(self) -> ArrayVec<Direction, 4> {
        Self::CARDINALS
            .iter()
            .copied()
            .filter(|d| self.contains(*d))
            .collect()
    }
}

/// Integer cell slot key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    pub col: i32,
    pub row: i32,
}

impl GridCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Coordinate of the slot one step in `dir`.
    pub fn neighbor(self, dir: Direction) -> GridCoord {
        let v = dir.to_vector();
        GridCoord::new(self.col + v.x, self.row + v.y)
    }

    /// World position of the slot center for a given cell size.
    pub fn to_world(self, cell_size: Vec2) -> Vec2 {
        Vec2::new(self.col as f32 * cell_size.x, self.row as f32 * cell_size.y)
    }

    /// Slot containing a world position. `None` for a degenerate cell size.
    ///
    /// Slot centers sit at `coord * cell_size`, so a slot covers half a cell
    /// on each side of its center. The quotient is rounded rather than
    /// truncated so that positions left of or below a center map to the
    /// slot whose square actually contains them.
    pub fn from_world(pos: Vec2, cell_size: Vec2) -> Option<GridCoord> {
        if cell_size.x == 0.0 || cell_size.y == 0.0 {
            return None;
        }
        Some(GridCoord::new(
            (pos.x / cell_size.x).round() as i32,
            (pos.y / cell_size.y).round() as i32,
        ))
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// -1, 0 or 1.
pub fn sign(value: f32) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Like [`sign`], but values within `threshold` of zero count as zero.
pub fn sign_with_threshold(value: f32, threshold: f32) -> i32 {
    if is_zero(value, threshold) {
        0
    } else {
        sign(value)
    }
}

pub fn is_zero(value: f32, threshold: f32) -> bool {
    value.abs() <= threshold
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Angle in radians that rotates world up onto `normal`.
pub fn slope_angle(normal: Vec2) -> f32 {
    normal.y.atan2(normal.x) - FRAC_PI_2
}

/// Rotate a flat-frame vector onto the surface described by `normal`.
pub fn rotate_to_normal(v: Vec2, normal: Vec2) -> Vec2 {
    Vec2::from_angle(slope_angle(normal)).rotate(v)
}

/// Rotate a world vector back into the flat frame of `normal`.
pub fn rotate_from_normal(v: Vec2, normal: Vec2) -> Vec2 {
    Vec2::from_angle(-slope_angle(normal)).rotate(v)
}
