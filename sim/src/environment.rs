//! Collision simulation environment.
//!
//! Steps one vehicle and one pedestrian forward together, checking for
//! contact at interpolated positions between consecutive steps. A collision
//! latches the run's flag but does not end the episode.

use crate::pedestrian::Pedestrian;
use crate::run_log::RunRecord;
use crate::vehicle::{Vehicle, VehicleState};
use rand::Rng;
use serde::{Deserialize, Serialize};
use skd_core::error::{Result, SkdError};
use skd_core::geometry::{linspace, rect_circle_collide};
use skd_core::types::Point2D;

/// Episode timing and collision-check resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Step duration (s)
    pub dt: f64,
    /// Steps per episode
    pub max_steps: usize,
    /// Interpolated positions checked per step, endpoints included
    pub substeps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.3,
            max_steps: 25,
            substeps: 5,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dt <= 0.0 || !self.dt.is_finite() {
            return Err(SkdError::InvalidConfig(format!("dt must be positive, got {}", self.dt)));
        }
        if self.substeps == 0 {
            return Err(SkdError::InvalidConfig("substeps must be at least 1".into()));
        }
        Ok(())
    }
}

/// Snapshot of both agents at the start of a step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    pub pedestrian: Point2D,
    pub vehicle: VehicleState,
}

impl StepState {
    /// `[ped_longit, ped_hoz, veh_longit, veh_hoz, veh_speed, veh_braking]`
    pub fn to_row(&self) -> [f64; 6] {
        [
            self.pedestrian.longit,
            self.pedestrian.hoz,
            self.vehicle.position.longit,
            self.vehicle.position.hoz,
            self.vehicle.velocity,
            if self.vehicle.braking { 1.0 } else { 0.0 },
        ]
    }
}

/// One completed episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    /// `max_steps + 1` snapshots: one per step plus the terminal state
    pub steps: Vec<StepState>,
    pub collided: bool,
    /// `[length, width]` of the vehicle
    pub car_dimensions: [f64; 2],
}

impl SimulationRun {
    pub fn to_record(&self) -> RunRecord {
        RunRecord {
            data_log: self.steps.iter().map(StepState::to_row).collect(),
            collided: self.collided,
            car_dimensions: self.car_dimensions,
        }
    }
}

fn snapshot(vehicle: &Vehicle, pedestrian: &Pedestrian<'_>) -> StepState {
    StepState {
        pedestrian: pedestrian.position(),
        vehicle: vehicle.state(),
    }
}

/// Run one episode of `config.max_steps` steps.
///
/// The state is logged before every step and once more after the last one.
pub fn run_episode<R: Rng + ?Sized>(
    vehicle: &mut Vehicle,
    pedestrian: &mut Pedestrian<'_>,
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<SimulationRun> {
    config.validate()?;
    let mut collided = vehicle.collides(&pedestrian.footprint());
    let mut steps = Vec::with_capacity(config.max_steps + 1);

    for _ in 0..config.max_steps {
        let ped_from = pedestrian.position();
        let car_from = vehicle.position();
        steps.push(snapshot(vehicle, pedestrian));

        vehicle.advance(ped_from, rng);
        pedestrian.advance_step();

        if !collided {
            collided = swept_collision(
                vehicle,
                pedestrian,
                (car_from, vehicle.position()),
                (ped_from, pedestrian.position()),
                config.substeps,
            );
        }
    }
    steps.push(snapshot(vehicle, pedestrian));

    Ok(SimulationRun {
        steps,
        collided,
        car_dimensions: vehicle.dimensions(),
    })
}

/// Test `substeps` paired interpolated positions of both agents.
///
/// Fast relative motion can slip between samples; the resolution is fixed.
pub fn swept_collision(
    vehicle: &Vehicle,
    pedestrian: &Pedestrian<'_>,
    car_path: (Point2D, Point2D),
    ped_path: (Point2D, Point2D),
    substeps: usize,
) -> bool {
    let cars = linspace(car_path.0, car_path.1, substeps);
    let peds = linspace(ped_path.0, ped_path.1, substeps);
    cars.into_iter()
        .zip(peds)
        .any(|(c, p)| rect_circle_collide(&vehicle.footprint_at(c), &pedestrian.footprint_at(p)))
}

/// Outcome counts over a batch of runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionTally {
    pub total_runs: usize,
    /// Runs that ended in a collision
    pub failures: usize,
    pub successes: usize,
}

impl CollisionTally {
    pub fn record(&mut self, collided: bool) {
        self.total_runs += 1;
        if collided {
            self.failures += 1;
        } else {
            self.successes += 1;
        }
    }

    pub fn from_flags<I: IntoIterator<Item = bool>>(flags: I) -> Self {
        let mut tally = Self::default();
        for f in flags {
            tally.record(f);
        }
        tally
    }

    /// `[total_runs, failures, successes]`
    pub fn to_row(&self) -> [usize; 3] {
        [self.total_runs, self.failures, self.successes]
    }
}
