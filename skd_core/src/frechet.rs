//! Discrete Fréchet distance between two polylines.
//!
//! # Coupling recurrence
//! For P (length n) and Q (length m):
//!
//! ```text
//! c(0,0) = d(P0, Q0)
//! c(i,0) = max(d(Pi, Q0), c(i-1,0))
//! c(0,j) = max(d(P0, Qj), c(0,j-1))
//! c(i,j) = max(d(Pi, Qj), min(c(i-1,j), c(i-1,j-1), c(i,j-1)))
//! ```
//!
//! The table is filled row by row, so the cost is O(n·m) time. Only the
//! previous row is kept, giving O(m) memory.

use crate::error::{Result, SkdError};
use crate::geometry::distance;
use crate::types::{Point2D, Trajectory};

/// Discrete Fréchet distance between two point sequences.
///
/// Fails with [`SkdError::EmptyTrajectory`] if either side has no points.
pub fn frechet_distance(p: &[Point2D], q: &[Point2D]) -> Result<f64> {
    if p.is_empty() || q.is_empty() {
        return Err(SkdError::EmptyTrajectory);
    }

    let m = q.len();
    let mut prev = vec![0.0f64; m];
    let mut curr = vec![0.0f64; m];

    for (i, pi) in p.iter().enumerate() {
        for (j, qj) in q.iter().enumerate() {
            let d = distance(*pi, *qj);
            curr[j] = match (i, j) {
                (0, 0) => d,
                (0, _) => d.max(curr[j - 1]),
                (_, 0) => d.max(prev[0]),
                _ => d.max(prev[j].min(prev[j - 1]).min(curr[j - 1])),
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    Ok(prev[m - 1])
}

/// Fréchet distance between two trajectories.
pub fn trajectory_frechet(a: &Trajectory, b: &Trajectory) -> Result<f64> {
    frechet_distance(a.points(), b.points())
}
