//! Integer cell addressing: [`Position`], [`Offset`] and inclusive [`BlockBox`] regions.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// An absolute cell coordinate plus the dimension (layer of the world) it lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Dimension tag. Two positions in different dimensions never alias.
    pub dimension: i32,
}

impl Position {
    /// Creates a position in dimension 0.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self {
            x,
            y,
            z,
            dimension: 0,
        }
    }

    /// Creates a position in the given dimension.
    pub const fn in_dimension(x: i32, y: i32, z: i32, dimension: i32) -> Self {
        Self { x, y, z, dimension }
    }

    /// Returns a copy moved by `(dx, dy, dz)`; the dimension is preserved.
    pub fn add_xyz(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
            dimension: self.dimension,
        }
    }

    /// Returns a copy re-tagged with another dimension.
    pub fn with_dimension(self, dimension: i32) -> Self {
        Self { dimension, ..self }
    }

    /// Component-wise minimum. The dimension of `self` wins.
    pub fn min(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
            dimension: self.dimension,
        }
    }

    /// Component-wise maximum. The dimension of `self` wins.
    pub fn max(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
            dimension: self.dimension,
        }
    }
}

/// A translation between two positions. Carries no dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
}

impl Offset {
    pub const ZERO: Self = Self::new(0, 0, 0);

    pub const fn new(dx: i32, dy: i32, dz: i32) -> Self {
        Self { dx, dy, dz }
    }
}

impl Add<Offset> for Position {
    type Output = Position;

    fn add(self, rhs: Offset) -> Position {
        self.add_xyz(rhs.dx, rhs.dy, rhs.dz)
    }
}

impl Sub<Offset> for Position {
    type Output = Position;

    fn sub(self, rhs: Offset) -> Position {
        self.add_xyz(-rhs.dx, -rhs.dy, -rhs.dz)
    }
}

impl Sub for Position {
    type Output = Offset;

    fn sub(self, rhs: Position) -> Offset {
        Offset::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ---------------------------------------------------------------------------
// BlockBox
// ---------------------------------------------------------------------------

/// An inclusive axis-aligned box of cells.
///
/// Invariant: `min.x <= max.x`, `min.y <= max.y`, `min.z <= max.z`, and both
/// corners share one dimension. [`BlockBox::new`] sorts the corners so callers
/// may pass them in either order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockBox {
    pub min: Position,
    pub max: Position,
}

impl BlockBox {
    /// Builds the box spanned by two corners. The dimension of `a` is used.
    pub fn new(a: Position, b: Position) -> Self {
        let b = b.with_dimension(a.dimension);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Number of cells along each axis.
    pub fn extent(&self) -> (u32, u32, u32) {
        (
            self.max.x.abs_diff(self.min.x).saturating_add(1),
            self.max.y.abs_diff(self.min.y).saturating_add(1),
            self.max.z.abs_diff(self.min.z).saturating_add(1),
        )
    }

    /// Total number of cells.
    pub fn volume(&self) -> u64 {
        let (x, y, z) = self.extent();
        x as u64 * y as u64 * z as u64
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains(&self, p: Position) -> bool {
        p.dimension == self.min.dimension
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Returns true if a floating-point location falls within the box's cells.
    pub fn contains_point(&self, p: [f64; 3]) -> bool {
        p[0] >= self.min.x as f64
            && p[0] < (self.max.x + 1) as f64
            && p[1] >= self.min.y as f64
            && p[1] < (self.max.y + 1) as f64
            && p[2] >= self.min.z as f64
            && p[2] < (self.max.z + 1) as f64
    }

    /// Lazily walks every cell, x outermost, then y, then z.
    pub fn positions(&self) -> BoxWalk {
        BoxWalk {
            bounds: *self,
            next: Some(self.min),
        }
    }
}

/// Iterator returned by [`BlockBox::positions`].
#[derive(Clone, Debug)]
pub struct BoxWalk {
    bounds: BlockBox,
    next: Option<Position>,
}

impl Iterator for BoxWalk {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        let current = self.next?;
        let (min, max) = (self.bounds.min, self.bounds.max);

        let mut step = current;
        if step.z < max.z {
            step.z += 1;
        } else if step.y < max.y {
            step.z = min.z;
            step.y += 1;
        } else if step.x < max.x {
            step.z = min.z;
            step.y = min.y;
            step.x += 1;
        } else {
            self.next = None;
            return Some(current);
        }
        self.next = Some(step);
        Some(current)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
