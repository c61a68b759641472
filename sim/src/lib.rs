//! `sim` - Pedestrian/vehicle collision simulation, experiment runs, persistence.

pub mod analysis;
pub mod environment;
pub mod experiment;
pub mod pairs;
pub mod pedestrian;
pub mod run_log;
pub mod safe_trajs;
pub mod vehicle;

pub use analysis::{collision_rate_rows, CollisionRateRow};
pub use environment::{run_episode, CollisionTally, SimulationConfig, SimulationRun, StepState};
pub use experiment::{run_experiments, starting_position, ExperimentConfig, ExperimentResults, TrajectoryOutcome};
pub use pairs::{load_pairs, save_pairs, PairDump, PairEntry};
pub use pedestrian::{Pedestrian, PedestrianParams};
pub use run_log::{JsonDirStore, MemoryStore, RunId, RunRecord, RunStore};
pub use safe_trajs::SafeTrajectorySet;
pub use vehicle::{Vehicle, VehicleParams, VehicleState};
