//! `skd_core` - Trajectory geometry, Fréchet scoring and statistics for
//! kamikaze pedestrian experiments.
//!
//! # Module layout
//! - [`types`]    - Points and trajectories
//! - [`geometry`] - Clamping, distances, rectangle/circle collision, linspace
//! - [`frechet`]  - Discrete Fréchet distance
//! - [`augment`]  - Completing truncated collision trajectories
//! - [`records`]  - Kamikaze / safe data records
//! - [`stats`]    - Summaries, confidence intervals, grouped variance, quota sampling
//! - [`metrics`]  - Per-controller kamikaze scoring
//! - [`error`]    - Crate error type

pub mod augment;
pub mod error;
pub mod frechet;
pub mod geometry;
pub mod metrics;
pub mod records;
pub mod stats;
pub mod types;

pub use error::{Result, SkdError};
pub use metrics::{AnalysisConfig, ControllerScore};
pub use records::DataRecord;
pub use stats::{GroupedSummary, StatSummary};
pub use types::{Point2D, Trajectory};
