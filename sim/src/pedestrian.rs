//! Pedestrian replay model.
//!
//! The pedestrian plays back a reference trajectory one point per step and
//! holds the terminal point once the trajectory is exhausted.

use serde::{Deserialize, Serialize};
use skd_core::error::{Result, SkdError};
use skd_core::geometry::Circle;
use skd_core::types::{Point2D, Trajectory};

/// Physical extent of the pedestrian.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PedestrianParams {
    /// Footprint radius (m)
    pub radius: f64,
    /// Height (m), carried for completeness of the agent description
    pub height: f64,
}

impl Default for PedestrianParams {
    fn default() -> Self {
        Self {
            radius: 0.34,
            height: 1.86,
        }
    }
}

impl PedestrianParams {
    pub fn validate(&self) -> Result<()> {
        if self.radius <= 0.0 || !self.radius.is_finite() {
            return Err(SkdError::InvalidConfig(format!(
                "pedestrian radius must be positive, got {}",
                self.radius
            )));
        }
        if self.height <= 0.0 || !self.height.is_finite() {
            return Err(SkdError::InvalidConfig(format!(
                "pedestrian height must be positive, got {}",
                self.height
            )));
        }
        Ok(())
    }
}

/// A pedestrian replaying a borrowed reference trajectory.
#[derive(Clone, Debug)]
pub struct Pedestrian<'a> {
    trajectory: &'a Trajectory,
    params: PedestrianParams,
    position: Point2D,
    step: usize,
}

impl<'a> Pedestrian<'a> {
    /// Place the pedestrian at the first point of `trajectory`.
    pub fn new(trajectory: &'a Trajectory, params: PedestrianParams) -> Self {
        Self {
            position: trajectory.first(),
            trajectory,
            params,
            step: 0,
        }
    }

    /// Move to the next point of the reference trajectory.
    pub fn advance_step(&mut self) {
        self.step += 1;
        self.position = self.trajectory.at_or_last(self.step);
    }

    /// Override the current position. The step cursor is left untouched.
    pub fn set_position(&mut self, longit: f64, hoz: f64) {
        self.position = Point2D::new(longit, hoz);
    }

    pub fn position(&self) -> Point2D {
        self.position
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn radius(&self) -> f64 {
        self.params.radius
    }

    pub fn height(&self) -> f64 {
        self.params.height
    }

    /// `[radius, height]`
    pub fn dimensions(&self) -> [f64; 2] {
        [self.params.radius, self.params.height]
    }

    pub fn trajectory(&self) -> &'a Trajectory {
        self.trajectory
    }

    /// Footprint at the current position.
    pub fn footprint(&self) -> Circle {
        self.footprint_at(self.position)
    }

    /// Footprint if the pedestrian stood at `center`.
    pub fn footprint_at(&self, center: Point2D) -> Circle {
        Circle {
            center,
            radius: self.params.radius,
        }
    }
}
