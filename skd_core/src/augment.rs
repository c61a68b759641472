//! Trajectory augmentation: completes a truncated collision trajectory with
//! a straight walk to the end of its reference safe trajectory.
//!
//! A kamikaze run usually stops at the collision point. Extending it in
//! steps no longer than `max_displacement` charges it the cost of finishing
//! the crossing, which keeps Fréchet distances comparable between runs that
//! terminate at different points.

use crate::error::{Result, SkdError};
use crate::types::{Point2D, Trajectory};

/// Largest distance covered by one synthetic step (length units).
pub const DEFAULT_MAX_DISPLACEMENT: f64 = 0.75;

/// Extend `collision` towards the last point of `safe`.
///
/// Returns `collision` unchanged when the endpoints already coincide.
/// Otherwise appends `ceil(|safe_end - collision_end| / max_displacement)`
/// equally spaced points, the last of which is the safe endpoint.
pub fn augment(collision: &Trajectory, safe: &Trajectory, max_displacement: f64) -> Result<Trajectory> {
    if max_displacement <= 0.0 || !max_displacement.is_finite() {
        return Err(SkdError::InvalidConfig(format!(
            "max_displacement must be a positive finite number, got {max_displacement}"
        )));
    }

    let start = collision.last();
    let end = safe.last();
    let mut extended = collision.clone();
    if start == end {
        return Ok(extended);
    }

    let steps = augmentation_steps(start, end, max_displacement);
    let origin = start.to_vector();
    let diff = end.to_vector() - origin;
    for k in 1..=steps {
        let frac = k as f64 / steps as f64;
        extended.push(Point2D::from_vector(origin + diff * frac));
    }
    Ok(extended)
}

/// Number of points [`augment`] would append.
pub fn augmentation_steps(collision_end: Point2D, safe_end: Point2D, max_displacement: f64) -> usize {
    if collision_end == safe_end {
        return 0;
    }
    let diff = safe_end.to_vector() - collision_end.to_vector();
    (diff.norm() / max_displacement).ceil() as usize
}
