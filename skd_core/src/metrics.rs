//! Kamikaze scoring metrics: Fréchet distance of each (augmented) kamikaze
//! pedestrian path to its safe reference, plus the time spent computing it.
//!
//! Records are grouped by safe trajectory key for one controller multiplier.
//! Statistics are reported per key and over all keys of the controller.

use crate::{
    augment::{augment, DEFAULT_MAX_DISPLACEMENT},
    error::{Result, SkdError},
    frechet::trajectory_frechet,
    records::DataRecord,
    stats::{sample_with_quota, summarize_groups, GroupedSummary, STAT_COLUMNS},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Instant};
use tracing::debug;

/// Configuration for kamikaze scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Largest synthetic step used when augmenting truncated paths
    pub max_displacement: f64,
    /// Extend each kamikaze path to the safe endpoint before scoring
    pub augmented: bool,
    /// When set, draw this many records in total, split evenly over keys
    pub sample_limit: Option<usize>,
    /// Seed for the quota sampler
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_displacement: DEFAULT_MAX_DISPLACEMENT,
            augmented: true,
            sample_limit: None,
            seed: 42,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_displacement <= 0.0 || !self.max_displacement.is_finite() {
            return Err(SkdError::InvalidConfig(format!(
                "max_displacement must be positive, got {}",
                self.max_displacement
            )));
        }
        if self.sample_limit == Some(0) {
            return Err(SkdError::InvalidConfig("sample_limit must be positive".into()));
        }
        Ok(())
    }
}

/// Score of one data record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordScore {
    pub distance: f64,
    /// Wall-clock time of augmentation + Fréchet, in milliseconds
    pub timing_ms: f64,
}

/// Distance of one record's kamikaze path to its safe reference.
pub fn score_record(record: &DataRecord, config: &AnalysisConfig) -> Result<RecordScore> {
    let start = Instant::now();
    let distance = if config.augmented {
        let extended = augment(record.kamikaze_ped(), record.safe(), config.max_displacement)?;
        trajectory_frechet(&extended, record.safe())?
    } else {
        trajectory_frechet(record.kamikaze_ped(), record.safe())?
    };
    let timing_ms = start.elapsed().as_secs_f64() * 1000.0;
    Ok(RecordScore { distance, timing_ms })
}

/// Raw per-key scores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyScores {
    pub distances: Vec<f64>,
    pub timings_ms: Vec<f64>,
}

/// All scores of one controller multiplier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControllerScore {
    pub multiplier: f64,
    pub per_key: BTreeMap<String, KeyScores>,
    pub distances: GroupedSummary,
    pub timings: GroupedSummary,
}

/// Number of columns in [`ControllerScore::to_row`].
pub const CONTROLLER_ROW_COLUMNS: usize = 1 + 2 * STAT_COLUMNS;

impl ControllerScore {
    /// `[multiplier, frechet stats (6), timing stats (6)]`
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(CONTROLLER_ROW_COLUMNS);
        row.push(self.multiplier);
        row.extend_from_slice(&self.distances.overall.to_row());
        row.extend_from_slice(&self.timings.overall.to_row());
        row
    }
}

/// Score every record of one controller multiplier.
///
/// When `config.sample_limit` is set, records are first drawn with
/// [`sample_with_quota`] using `rng`.
pub fn score_controller<R: Rng + ?Sized>(
    multiplier: f64,
    records: BTreeMap<String, Vec<DataRecord>>,
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<ControllerScore> {
    config.validate()?;
    let records = match config.sample_limit {
        Some(limit) => sample_with_quota(records, limit, rng)?,
        None => records,
    };

    let mut per_key = BTreeMap::new();
    for (key, key_records) in &records {
        let mut scores = KeyScores::default();
        for record in key_records {
            let s = score_record(record, config)?;
            scores.distances.push(s.distance);
            scores.timings_ms.push(s.timing_ms);
        }
        debug!(
            multiplier,
            key = key.as_str(),
            n = key_records.len(),
            "scored safe trajectory"
        );
        per_key.insert(key.clone(), scores);
    }

    let distance_groups: BTreeMap<String, Vec<f64>> = per_key
        .iter()
        .map(|(k, s)| (k.clone(), s.distances.clone()))
        .collect();
    let timing_groups: BTreeMap<String, Vec<f64>> = per_key
        .iter()
        .map(|(k, s)| (k.clone(), s.timings_ms.clone()))
        .collect();

    Ok(ControllerScore {
        multiplier,
        distances: summarize_groups(&distance_groups)?,
        timings: summarize_groups(&timing_groups)?,
        per_key,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
