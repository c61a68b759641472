//! Vehicle kinematics and braking controller.
//!
//! The vehicle drives along the lane at max speed until the pedestrian's
//! longitudinal offset drops to the stopping distance, then brakes for the
//! rest of the episode. Both the deceleration and the resulting speed carry
//! uniform noise:
//!
//! ```text
//! braking:  a = b·(1 + U(-0.1, 0.1)),  v = clamp(v + a·dt, 0, v_max)
//! driving:  a = 0,                      v = v_max
//! always:   v = clamp(v + U(-0.05, 0.05)·v_max, 0, v_max)
//!           x += clamp(v_prev·dt + ½·a·dt², 0, v_max·dt)
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use skd_core::error::{Result, SkdError};
use skd_core::geometry::{rect_circle_collide, Circle, Rect};
use skd_core::types::Point2D;
use tracing::trace;

/// Relative noise on the braking deceleration.
const BRAKING_NOISE: f64 = 0.1;
/// Speed noise as a fraction of max speed.
const SPEED_NOISE: f64 = 0.05;

/// Mechanical parameters of the vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    /// m/s
    pub max_speed: f64,
    /// m/s², negative
    pub braking_rate: f64,
    pub length: f64,
    pub width: f64,
    /// Lateral lane position the vehicle starts on
    pub start_hoz: f64,
    /// Start this many unit stopping distances before the pedestrian
    pub start_offset_factor: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            max_speed: 8.33,
            braking_rate: -3.5,
            length: 4.66,
            width: 1.68,
            start_hoz: -2.0,
            start_offset_factor: 1.5,
        }
    }
}

impl VehicleParams {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_speed", self.max_speed),
            ("length", self.length),
            ("width", self.width),
        ];
        for (name, v) in positive {
            if v <= 0.0 || !v.is_finite() {
                return Err(SkdError::InvalidConfig(format!("{name} must be positive, got {v}")));
            }
        }
        if self.braking_rate >= 0.0 || !self.braking_rate.is_finite() {
            return Err(SkdError::InvalidConfig(format!(
                "braking_rate must be negative, got {}",
                self.braking_rate
            )));
        }
        if self.start_offset_factor < 0.0 || !self.start_offset_factor.is_finite() {
            return Err(SkdError::InvalidConfig(format!(
                "start_offset_factor must be non-negative, got {}",
                self.start_offset_factor
            )));
        }
        if !self.start_hoz.is_finite() {
            return Err(SkdError::InvalidConfig("start_hoz must be finite".into()));
        }
        Ok(())
    }

    /// Time to stop from max speed at the nominal braking rate.
    pub fn stop_time(&self) -> f64 {
        (self.max_speed / self.braking_rate).abs()
    }

    /// Braking distance from max speed, padded by half the car length and
    /// half a step of travel at max speed.
    pub fn unit_stop_dist(&self, dt: f64) -> f64 {
        let t = self.stop_time();
        let braking = self.max_speed * t + 0.5 * self.braking_rate * t * t;
        braking + self.length / 2.0 + self.max_speed / 2.0 * dt
    }
}

/// Kinematic state, as logged every step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Point2D,
    pub velocity: f64,
    pub acceleration: f64,
    pub braking: bool,
}

/// A vehicle with a stopping-distance braking controller.
#[derive(Clone, Debug)]
pub struct Vehicle {
    params: VehicleParams,
    multiplier: f64,
    dt: f64,
    stop_time: f64,
    unit_stop_dist: f64,
    stopping_distance: f64,
    state: VehicleState,
}

impl Vehicle {
    /// Vehicle at `start`, driving at max speed.
    ///
    /// `multiplier` scales the unit stopping distance into the braking
    /// trigger distance.
    pub fn new(params: VehicleParams, multiplier: f64, dt: f64, start: Point2D) -> Result<Self> {
        params.validate()?;
        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(SkdError::InvalidConfig(format!(
                "controller multiplier must be positive, got {multiplier}"
            )));
        }
        if dt <= 0.0 || !dt.is_finite() {
            return Err(SkdError::InvalidConfig(format!("dt must be positive, got {dt}")));
        }
        let stop_time = params.stop_time();
        let unit_stop_dist = params.unit_stop_dist(dt);
        Ok(Self {
            state: VehicleState {
                position: start,
                velocity: params.max_speed,
                acceleration: 0.0,
                braking: false,
            },
            stopping_distance: unit_stop_dist * multiplier,
            stop_time,
            unit_stop_dist,
            multiplier,
            dt,
            params,
        })
    }

    /// Advance one step given the pedestrian's current position.
    pub fn advance<R: Rng + ?Sized>(&mut self, pedestrian: Point2D, rng: &mut R) {
        let v_max = self.params.max_speed;
        let dt = self.dt;
        let s = &mut self.state;
        let v_prev = s.velocity;

        if !s.braking && pedestrian.longit - s.position.longit <= self.stopping_distance {
            s.braking = true;
            trace!(
                longit = s.position.longit,
                ped_longit = pedestrian.longit,
                "vehicle starts braking"
            );
        }

        if s.braking {
            s.acceleration = self.params.braking_rate * (1.0 + symmetric_noise(rng, BRAKING_NOISE));
            s.velocity = (s.velocity + s.acceleration * dt).clamp(0.0, v_max);
        } else {
            s.acceleration = 0.0;
            s.velocity = v_max;
        }
        s.velocity = (s.velocity + symmetric_noise(rng, SPEED_NOISE * v_max)).clamp(0.0, v_max);

        let displacement = v_prev * dt + 0.5 * s.acceleration * dt * dt;
        s.position.longit += displacement.clamp(0.0, v_max * dt);
    }

    /// True if the vehicle footprint touches the given pedestrian footprint.
    pub fn collides(&self, pedestrian: &Circle) -> bool {
        rect_circle_collide(&self.footprint(), pedestrian)
    }

    pub fn footprint(&self) -> Rect {
        self.footprint_at(self.state.position)
    }

    /// Footprint if the vehicle were centered at `center`.
    pub fn footprint_at(&self, center: Point2D) -> Rect {
        Rect {
            center,
            length: self.params.length,
            width: self.params.width,
        }
    }

    pub fn set_position(&mut self, longit: f64, hoz: f64) {
        self.state.position = Point2D::new(longit, hoz);
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    pub fn position(&self) -> Point2D {
        self.state.position
    }

    pub fn is_braking(&self) -> bool {
        self.state.braking
    }

    /// `[length, width]`
    pub fn dimensions(&self) -> [f64; 2] {
        [self.params.length, self.params.width]
    }

    pub fn params(&self) -> &VehicleParams {
        &self.params
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn stop_time(&self) -> f64 {
        self.stop_time
    }

    pub fn unit_stop_dist(&self) -> f64 {
        self.unit_stop_dist
    }

    /// Braking trigger distance: `unit_stop_dist · multiplier`.
    pub fn stopping_distance(&self) -> f64 {
        self.stopping_distance
    }
}

/// Uniform sample in `[-half, half)`.
fn symmetric_noise<R: Rng + ?Sized>(rng: &mut R, half: f64) -> f64 {
    (rng.gen::<f64>() * 2.0 - 1.0) * half
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f64 = 0.3;

    fn vehicle(multiplier: f64) -> Vehicle {
        Vehicle::new(VehicleParams::default(), multiplier, DT, Point2D::new(0.0, -2.0)).unwrap()
    }

    #[test]
    fn stopping_distance_formula() {
        let v = vehicle(1.0);
        let t = 8.33 / 3.5;
        assert_abs_diff_eq!(v.stop_time(), t, epsilon = 1e-12);
        let unit = 8.33 * t - 0.5 * 3.5 * t * t + 4.66 / 2.0 + 8.33 / 2.0 * DT;
        assert_abs_diff_eq!(v.unit_stop_dist(), unit, epsilon = 1e-12);

        let v2 = vehicle(0.5);
        assert_abs_diff_eq!(v2.stopping_distance(), unit * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn drives_at_max_speed_when_far() {
        let mut v = vehicle(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        v.advance(Point2D::new(1000.0, 0.0), &mut rng);
        let s = v.state();
        assert!(!s.braking);
        assert_eq!(s.acceleration, 0.0);
        assert!(s.velocity <= 8.33 && s.velocity >= 8.33 * 0.95);
        // Previous velocity was max speed, so the step is capped at v_max·dt.
        assert_abs_diff_eq!(s.position.longit, 8.33 * DT, epsilon = 1e-12);
    }

    #[test]
    fn brakes_within_stopping_distance_and_stays_braking() {
        let mut v = vehicle(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        v.advance(Point2D::new(v.stopping_distance() - 0.1, 0.0), &mut rng);
        assert!(v.is_braking());
        let a = v.state().acceleration;
        assert!(a <= -3.5 * 0.9 && a >= -3.5 * 1.1);

        // Pedestrian far away again: braking is latched.
        v.advance(Point2D::new(1000.0, 0.0), &mut rng);
        assert!(v.is_braking());
    }

    #[test]
    fn braking_step_includes_acceleration_term() {
        let mut v = vehicle(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let before = v.position().longit;
        v.advance(Point2D::new(v.stopping_distance() - 0.1, 0.0), &mut rng);
        let s = v.state();
        assert!(s.braking);

        let a = s.acceleration;
        let expected = (8.33 * DT + 0.5 * a * DT * DT).clamp(0.0, 8.33 * DT);
        let step = s.position.longit - before;
        assert_abs_diff_eq!(step, expected, epsilon = 1e-12);
        // 0.5·a·dt² is at least 0.14 for any drawn deceleration.
        assert!(step < 8.33 * DT - 0.1);
    }

    #[test]
    fn pedestrian_behind_triggers_braking() {
        let mut v = vehicle(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        v.advance(Point2D::new(-50.0, 0.0), &mut rng);
        assert!(v.is_braking());
    }

    #[test]
    fn velocity_stays_in_bounds_and_position_never_regresses() {
        let mut v = vehicle(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut last = v.position().longit;
        for _ in 0..100 {
            v.advance(Point2D::new(5.0, 0.0), &mut rng);
            let s = v.state();
            assert!((0.0..=8.33).contains(&s.velocity));
            assert!(s.position.longit >= last);
            assert!(s.position.longit - last <= 8.33 * DT + 1e-12);
            last = s.position.longit;
        }
    }

    #[test]
    fn collides_with_touching_pedestrian() {
        let v = vehicle(1.0);
        let touching = Circle {
            center: Point2D::new(4.66 / 2.0 + 0.33, -2.0),
            radius: 0.34,
        };
        assert!(v.collides(&touching));
        let clear = Circle {
            center: Point2D::new(4.66 / 2.0 + 0.35, -2.0),
            radius: 0.34,
        };
        assert!(!v.collides(&clear));
    }

    #[test]
    fn same_seed_same_trace() {
        let run = |seed| {
            let mut v = vehicle(1.0);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..20)
                .map(|_| {
                    v.advance(Point2D::new(20.0, 0.0), &mut rng);
                    v.state()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert!(Vehicle::new(VehicleParams::default(), 0.0, DT, Point2D::default()).is_err());
        assert!(Vehicle::new(VehicleParams::default(), 1.0, 0.0, Point2D::default()).is_err());
        let params = VehicleParams {
            braking_rate: 1.0,
            ..Default::default()
        };
        assert!(Vehicle::new(params, 1.0, DT, Point2D::default()).is_err());
    }
}
