//! Collision experiment runner.
//!
//! Evaluates the grid `multiplier × safe set × safe key × repetition`. Each
//! cell is an independent episode with its own generator seeded from the
//! cell's position in grid order, so the parallel run is reproducible and
//! equal to a sequential one.

use crate::environment::{run_episode, CollisionTally, SimulationConfig, SimulationRun};
use crate::pedestrian::{Pedestrian, PedestrianParams};
use crate::run_log::{RunId, RunStore};
use crate::safe_trajs::SafeTrajectorySet;
use crate::vehicle::{Vehicle, VehicleParams};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skd_core::error::{Result, SkdError};
use skd_core::types::{Point2D, Trajectory};
use tracing::{debug, info};

/// Full experiment configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Controller aggressiveness multipliers to evaluate
    pub multipliers: Vec<f64>,
    /// Episodes per (multiplier, safe trajectory)
    pub repetitions: usize,
    /// Only use the first N keys of each safe set (all when `None`)
    pub max_trajs_per_file: Option<usize>,
    pub seed: u64,
    pub simulation: SimulationConfig,
    pub vehicle: VehicleParams,
    pub pedestrian: PedestrianParams,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            multipliers: vec![0.5, 0.625, 0.75, 0.875, 1.0, 1.05, 1.10, 1.125, 1.15],
            repetitions: 25,
            max_trajs_per_file: None,
            seed: 42,
            simulation: SimulationConfig::default(),
            vehicle: VehicleParams::default(),
            pedestrian: PedestrianParams::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.multipliers.is_empty() {
            return Err(SkdError::InvalidConfig("no controller multipliers given".into()));
        }
        if let Some(m) = self.multipliers.iter().find(|m| **m <= 0.0 || !m.is_finite()) {
            return Err(SkdError::InvalidConfig(format!(
                "controller multiplier must be positive, got {m}"
            )));
        }
        if self.repetitions == 0 {
            return Err(SkdError::InvalidConfig("repetitions must be at least 1".into()));
        }
        if self.max_trajs_per_file == Some(0) {
            return Err(SkdError::InvalidConfig("max_trajs_per_file must be positive".into()));
        }
        self.simulation.validate()?;
        self.vehicle.validate()?;
        self.pedestrian.validate()
    }
}

/// Vehicle start for a given safe trajectory.
///
/// Placed `unit_stop_dist × start_offset_factor` behind the safe point with
/// the smallest longitudinal coordinate (first one on ties), on the
/// vehicle's lane.
pub fn starting_position(safe: &Trajectory, vehicle: &VehicleParams, dt: f64) -> Point2D {
    let nearest = safe
        .iter()
        .skip(1)
        .fold(safe.first(), |best, p| if p.longit < best.longit { *p } else { best });
    let offset = vehicle.unit_stop_dist(dt) * vehicle.start_offset_factor;
    Point2D::new(nearest.longit - offset, vehicle.start_hoz)
}

/// Run one episode of `multiplier` against `safe`.
pub fn run_trajectory_episode(
    config: &ExperimentConfig,
    multiplier: f64,
    safe: &Trajectory,
    rng: &mut ChaCha8Rng,
) -> Result<SimulationRun> {
    let start = starting_position(safe, &config.vehicle, config.simulation.dt);
    let mut vehicle = Vehicle::new(config.vehicle.clone(), multiplier, config.simulation.dt, start)?;
    let mut pedestrian = Pedestrian::new(safe, config.pedestrian.clone());
    run_episode(&mut vehicle, &mut pedestrian, &config.simulation, rng)
}

/// Collision count of one (multiplier, safe trajectory) cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryOutcome {
    pub multiplier: f64,
    pub set_name: String,
    pub traj_key: String,
    pub collided: usize,
    pub attempts: usize,
}

impl TrajectoryOutcome {
    /// `collided / attempts`, 0 when nothing was attempted.
    pub fn collision_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.collided as f64 / self.attempts as f64
        }
    }

    /// `<set>/ST_<key>`
    pub fn label(&self) -> String {
        format!("{}/ST_{}", self.set_name, self.traj_key)
    }

    pub fn run_id(&self, run: usize) -> RunId {
        RunId {
            multiplier: self.multiplier,
            set_name: self.set_name.clone(),
            traj_key: self.traj_key.clone(),
            run,
        }
    }
}

/// Everything `run_experiments` produces besides the stored runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub seed: u64,
    pub repetitions: usize,
    /// In grid order
    pub outcomes: Vec<TrajectoryOutcome>,
    pub tally: CollisionTally,
}

struct Job<'a> {
    index: u64,
    multiplier: f64,
    set_name: &'a str,
    key: &'a str,
    run: usize,
    safe: &'a Trajectory,
}

/// Run the whole experiment grid and persist every run to `store`.
pub fn run_experiments<S: RunStore>(
    config: &ExperimentConfig,
    sets: &[SafeTrajectorySet],
    store: &mut S,
) -> anyhow::Result<ExperimentResults> {
    config.validate()?;

    let mut jobs = Vec::new();
    let mut outcomes = Vec::new();
    for &multiplier in &config.multipliers {
        for set in sets {
            let keys = set.keys();
            let limit = config.max_trajs_per_file.unwrap_or(keys.len());
            for key in keys.into_iter().take(limit) {
                let safe = set.get_trajectory(key)?;
                for run in 0..config.repetitions {
                    jobs.push(Job {
                        index: jobs.len() as u64,
                        multiplier,
                        set_name: &set.name,
                        key,
                        run,
                        safe,
                    });
                }
                outcomes.push(TrajectoryOutcome {
                    multiplier,
                    set_name: set.name.clone(),
                    traj_key: key.to_string(),
                    collided: 0,
                    attempts: 0,
                });
            }
        }
    }
    info!(
        jobs = jobs.len(),
        multipliers = config.multipliers.len(),
        sets = sets.len(),
        "running collision experiments"
    );

    let runs: Vec<SimulationRun> = jobs
        .par_iter()
        .map(|job| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(job.index));
            run_trajectory_episode(config, job.multiplier, job.safe, &mut rng)
        })
        .collect::<Result<_>>()?;

    // Jobs of one outcome are contiguous and `repetitions` long.
    let mut tally = CollisionTally::default();
    for (job, run) in jobs.iter().zip(&runs) {
        let outcome = &mut outcomes[job.index as usize / config.repetitions];
        debug_assert_eq!(outcome.traj_key, job.key);
        let id = RunId {
            multiplier: job.multiplier,
            set_name: job.set_name.to_string(),
            traj_key: job.key.to_string(),
            run: job.run,
        };
        store.write_run(&id, &run.to_record())?;
        outcome.attempts += 1;
        if run.collided {
            outcome.collided += 1;
        }
        tally.record(run.collided);
    }

    for o in &outcomes {
        debug!(
            multiplier = o.multiplier,
            trajectory = o.label().as_str(),
            collided = o.collided,
            attempts = o.attempts,
            "trajectory done"
        );
    }
    info!(
        total = tally.total_runs,
        collisions = tally.failures,
        "collision experiments done"
    );

    Ok(ExperimentResults {
        seed: config.seed,
        repetitions: config.repetitions,
        outcomes,
        tally,
    })
}
