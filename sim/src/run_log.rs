//! Run persistence: serialize completed episodes for offline analysis.
//!
//! Every run is stored under a relative path derived from its [`RunId`]:
//! `controller_m_<multiplier>/<set>/ST_<key>/run_<n>.json`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use skd_core::error::Result as CoreResult;
use skd_core::types::{Point2D, Trajectory};
use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A persisted episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// One row per logged step:
    /// `[ped_longit, ped_hoz, veh_longit, veh_hoz, veh_speed, veh_braking]`
    #[serde(rename = "DATA_LOG")]
    pub data_log: Vec<[f64; 6]>,
    #[serde(rename = "COLLIDED")]
    pub collided: bool,
    /// `[length, width]`
    #[serde(rename = "CAR_DIMENSIONS")]
    pub car_dimensions: [f64; 2],
}

impl RunRecord {
    pub fn pedestrian_trajectory(&self) -> CoreResult<Trajectory> {
        Trajectory::new(self.data_log.iter().map(|r| Point2D::new(r[0], r[1])).collect())
    }

    pub fn vehicle_trajectory(&self) -> CoreResult<Trajectory> {
        Trajectory::new(self.data_log.iter().map(|r| Point2D::new(r[2], r[3])).collect())
    }
}

/// Identifies one run within an experiment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunId {
    pub multiplier: f64,
    pub set_name: String,
    pub traj_key: String,
    pub run: usize,
}

impl RunId {
    /// Directory name for a controller multiplier, e.g. `controller_m_1.0`.
    pub fn controller_dir(multiplier: f64) -> String {
        format!("controller_m_{multiplier:?}")
    }

    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(Self::controller_dir(self.multiplier))
            .join(&self.set_name)
            .join(format!("ST_{}", self.traj_key))
            .join(format!("run_{}.json", self.run))
    }
}

/// Write/read hooks for persisted runs.
pub trait RunStore {
    fn write_run(&mut self, id: &RunId, record: &RunRecord) -> anyhow::Result<()>;
    fn read_run(&self, id: &RunId) -> anyhow::Result<RunRecord>;
}

/// Runs stored as pretty-printed JSON files under a root directory.
#[derive(Clone, Debug)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, id: &RunId) -> PathBuf {
        self.root.join(id.relative_path())
    }
}

impl RunStore for JsonDirStore {
    fn write_run(&mut self, id: &RunId, record: &RunRecord) -> anyhow::Result<()> {
        let path = self.path_of(id);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating run directory {}", dir.display()))?;
        }
        let file = std::fs::File::create(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record)?;
        writer.flush()?;
        Ok(())
    }

    fn read_run(&self, id: &RunId) -> anyhow::Result<RunRecord> {
        let path = self.path_of(id);
        let file = std::fs::File::open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let record = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(record)
    }
}

/// In-memory store keyed by relative run path.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    runs: BTreeMap<PathBuf, RunRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &RunRecord)> {
        self.runs.iter()
    }
}

impl RunStore for MemoryStore {
    fn write_run(&mut self, id: &RunId, record: &RunRecord) -> anyhow::Result<()> {
        self.runs.insert(id.relative_path(), record.clone());
        Ok(())
    }

    fn read_run(&self, id: &RunId) -> anyhow::Result<RunRecord> {
        self.runs
            .get(&id.relative_path())
            .cloned()
            .with_context(|| format!("no run stored at {}", id.relative_path().display()))
    }
}
