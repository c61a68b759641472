//! Fundamental types used across the entire workspace.

use crate::error::{Result, SkdError};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

// ---------------------------------------------------------------------------
// Point2D
// ---------------------------------------------------------------------------

/// A position on the road plane: `longit` runs along the lane, `hoz` across it.
///
/// Serialized as a bare `[longit, hoz]` pair, which is the layout of the
/// trajectory files produced by the planner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point2D {
    pub longit: f64,
    pub hoz: f64,
}

impl Point2D {
    pub const fn new(longit: f64, hoz: f64) -> Self {
        Self { longit, hoz }
    }

    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.longit, self.hoz)
    }

    pub fn from_vector(v: Vector2<f64>) -> Self {
        Self::new(v[0], v[1])
    }

    /// Linear interpolation; `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(self, other: Point2D, t: f64) -> Point2D {
        Point2D::new(
            self.longit + (other.longit - self.longit) * t,
            self.hoz + (other.hoz - self.hoz) * t,
        )
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

impl From<Point2D> for [f64; 2] {
    fn from(p: Point2D) -> Self {
        [p.longit, p.hoz]
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.longit, self.hoz)
    }
}

// ---------------------------------------------------------------------------
// Trajectory
// ---------------------------------------------------------------------------

/// Ordered sequence of positions, one per discrete time step.
///
/// Never empty: index 0 is the start state, the last index the terminal one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point2D>", into = "Vec<Point2D>")]
pub struct Trajectory(Vec<Point2D>);

impl Trajectory {
    pub fn new(points: Vec<Point2D>) -> Result<Self> {
        if points.is_empty() {
            return Err(SkdError::EmptyTrajectory);
        }
        Ok(Self(points))
    }

    /// Build from raw `[longit, hoz]` pairs.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Result<Self> {
        Self::new(pairs.iter().copied().map(Point2D::from).collect())
    }

    pub fn points(&self) -> &[Point2D] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed trajectory.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Point2D {
        self.0[0]
    }

    pub fn last(&self) -> Point2D {
        self.0[self.0.len() - 1]
    }

    /// Point at `step`, holding the terminal point once past the end.
    pub fn at_or_last(&self, step: usize) -> Point2D {
        self.0.get(step).copied().unwrap_or_else(|| self.last())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point2D> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, p: Point2D) {
        self.0.push(p);
    }

    pub fn into_points(self) -> Vec<Point2D> {
        self.0
    }
}

impl TryFrom<Vec<Point2D>> for Trajectory {
    type Error = SkdError;

    fn try_from(points: Vec<Point2D>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<Trajectory> for Vec<Point2D> {
    fn from(t: Trajectory) -> Self {
        t.0
    }
}

impl Index<usize> for Trajectory {
    type Output = Point2D;

    fn index(&self, idx: usize) -> &Point2D {
        &self.0[idx]
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Point2D;
    type IntoIter = std::slice::Iter<'a, Point2D>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
