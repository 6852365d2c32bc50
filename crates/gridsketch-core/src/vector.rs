//! Integer cell coordinates and axis-aligned cell boxes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A cell position on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0, y: 0 };
    pub const UP: Vector = Vector { x: 0, y: -1 };
    pub const DOWN: Vector = Vector { x: 0, y: 1 };
    pub const LEFT: Vector = Vector { x: -1, y: 0 };
    pub const RIGHT: Vector = Vector { x: 1, y: 0 };

    /// Create a new vector.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Scale both components.
    pub fn scale(self, factor: i32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        f64::from(self.x).hypot(f64::from(self.y))
    }

    /// Stable string key, `"x,y"`.
    pub fn key(self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// Parse a key produced by [`Vector::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(',')?;
        Some(Self::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<i32> for Vector {
    type Output = Vector;

    fn mul(self, rhs: i32) -> Vector {
        self.scale(rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

/// An axis-aligned box of cells, inclusive on both corners.
///
/// Construction normalizes the corners so `top_left` always holds the
/// minimum coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBox {
    top_left: Vector,
    bottom_right: Vector,
}

impl GridBox {
    /// Create a box spanning two arbitrary corners.
    pub fn new(a: Vector, b: Vector) -> Self {
        Self {
            top_left: Vector::new(a.x.min(b.x), a.y.min(b.y)),
            bottom_right: Vector::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// A box covering a single cell.
    pub fn cell(v: Vector) -> Self {
        Self::new(v, v)
    }

    pub fn top_left(&self) -> Vector {
        self.top_left
    }

    pub fn bottom_right(&self) -> Vector {
        self.bottom_right
    }

    pub fn top_right(&self) -> Vector {
        Vector::new(self.bottom_right.x, self.top_left.y)
    }

    pub fn bottom_left(&self) -> Vector {
        Vector::new(self.top_left.x, self.bottom_right.y)
    }

    /// Number of columns covered.
    pub fn width(&self) -> i32 {
        self.bottom_right.x - self.top_left.x + 1
    }

    /// Number of rows covered.
    pub fn height(&self) -> i32 {
        self.bottom_right.y - self.top_left.y + 1
    }

    /// Inclusive containment test.
    pub fn contains(&self, v: Vector) -> bool {
        v.x >= self.top_left.x
            && v.x <= self.bottom_right.x
            && v.y >= self.top_left.y
            && v.y <= self.bottom_right.y
    }

    /// The box moved by `delta`.
    pub fn translate(&self, delta: Vector) -> Self {
        Self {
            top_left: self.top_left + delta,
            bottom_right: self.bottom_right + delta,
        }
    }

    /// Limit `delta` so the translated box stays inside `bounds`.
    ///
    /// A box larger than `bounds` keeps its top-left edge inside.
    pub fn clamp_translation(&self, delta: Vector, bounds: &GridBox) -> Vector {
        let axis = |d: i32, lo: i32, hi: i32| d.min(hi).max(lo);
        Vector::new(
            axis(
                delta.x,
                bounds.top_left.x - self.top_left.x,
                bounds.bottom_right.x - self.bottom_right.x,
            ),
            axis(
                delta.y,
                bounds.top_left.y - self.top_left.y,
                bounds.bottom_right.y - self.bottom_right.y,
            ),
        )
    }

    /// Smallest box covering both boxes.
    pub fn union(&self, other: &GridBox) -> Self {
        Self {
            top_left: Vector::new(
                self.top_left.x.min(other.top_left.x),
                self.top_left.y.min(other.top_left.y),
            ),
            bottom_right: Vector::new(
                self.bottom_right.x.max(other.bottom_right.x),
                self.bottom_right.y.max(other.bottom_right.y),
            ),
        }
    }

    /// Iterate every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Vector> + '_ {
        let (tl, br) = (self.top_left, self.bottom_right);
        (tl.y..=br.y).flat_map(move |y| (tl.x..=br.x).map(move |x| Vector::new(x, y)))
    }
}
