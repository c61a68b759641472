//! Kamikaze trajectory pair dumps.
//!
//! A dump holds, for one controller multiplier, every kamikaze pedestrian
//! path produced by the planner (with the vehicle path it met) grouped by
//! the safe trajectory it was derived from. Dumps are the input to Fréchet
//! scoring.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use skd_core::error::Result as CoreResult;
use skd_core::records::DataRecord;
use skd_core::types::Trajectory;
use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairEntry {
    #[serde(rename = "KAMIKAZE")]
    pub kamikaze: Trajectory,
    #[serde(rename = "VEHICLE")]
    pub vehicle: Trajectory,
    #[serde(rename = "SAFE")]
    pub safe: Trajectory,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairDump {
    pub multiplier: f64,
    /// Safe trajectory label → pairs
    pub pairs: BTreeMap<String, Vec<PairEntry>>,
}

impl PairDump {
    pub fn len(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert into scoring records. Fails on any entry whose pedestrian and
    /// vehicle paths are not time-aligned.
    pub fn into_records(self) -> CoreResult<BTreeMap<String, Vec<DataRecord>>> {
        self.pairs
            .into_iter()
            .map(|(key, entries)| {
                let records = entries
                    .into_iter()
                    .map(|e| DataRecord::new(e.kamikaze, e.vehicle, e.safe))
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok((key, records))
            })
            .collect()
    }
}

pub fn save_pairs(dump: &PairDump, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, dump)?;
    writer.flush()?;
    Ok(())
}

pub fn load_pairs(path: &Path) -> anyhow::Result<PairDump> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let dump = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing pair dump {}", path.display()))?;
    Ok(dump)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use skd_core::error::SkdError;
    use skd_core::metrics::{score_controller, AnalysisConfig};

    fn traj(raw: &[[f64; 2]]) -> Trajectory {
        Trajectory::from_pairs(raw).unwrap()
    }

    fn entry(n_ped: usize, n_veh: usize) -> PairEntry {
        PairEntry {
            kamikaze: traj(&vec![[1.0, 1.0]; n_ped]),
            vehicle: traj(&vec![[0.0, -2.0]; n_veh]),
            safe: traj(&[[1.0, 2.0], [1.0, -2.0]]),
        }
    }

    #[test]
    fn mismatched_entry_fails_conversion() {
        let mut pairs = BTreeMap::new();
        pairs.insert("s/ST_0".to_string(), vec![entry(3, 3), entry(3, 2)]);
        let dump = PairDump { multiplier: 1.0, pairs };
        assert_eq!(
            dump.into_records().unwrap_err(),
            SkdError::LengthMismatch { left: 3, right: 2 }
        );
    }

    #[test]
    fn file_round_trip_uses_upper_case_fields() {
        let mut pairs = BTreeMap::new();
        pairs.insert("s/ST_0".to_string(), vec![entry(2, 2)]);
        let dump = PairDump { multiplier: 0.75, pairs };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.json");
        save_pairs(&dump, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"KAMIKAZE\""));
        assert_eq!(load_pairs(&path).unwrap(), dump);
    }

    fn crossing(offset: f64, n: usize) -> Vec<[f64; 2]> {
        (0..n).map(|i| [15.0 + offset, 2.0 - 0.5 * i as f64]).collect()
    }

    fn planner_entry(offset: f64, n: usize) -> PairEntry {
        PairEntry {
            kamikaze: traj(&crossing(offset, n)),
            vehicle: traj(&(0..n).map(|i| [-10.0 + 2.4 * i as f64, -2.0]).collect::<Vec<_>>()),
            safe: traj(&crossing(0.0, 9)),
        }
    }

    #[test]
    fn scores_planner_pairs() {
        // Offset crossings score their lateral offset. The truncated one is
        // completed in 0.5 steps that land on the safe samples.
        let mut pairs = BTreeMap::new();
        pairs.insert(
            "s/ST_0".to_string(),
            vec![planner_entry(0.5, 9), planner_entry(1.0, 9)],
        );
        pairs.insert(
            "s/ST_1".to_string(),
            vec![planner_entry(2.0, 9), planner_entry(0.0, 5)],
        );
        let dump = PairDump { multiplier: 0.75, pairs };
        assert_eq!(dump.len(), 4);

        let records = dump.into_records().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let config = AnalysisConfig { max_displacement: 0.5, ..AnalysisConfig::default() };
        let score = score_controller(0.75, records, &config, &mut rng).unwrap();

        assert_abs_diff_eq!(score.distances.groups["s/ST_0"].mean, 0.75, epsilon = 1e-9);
        assert_eq!(score.per_key["s/ST_1"].distances[1], 0.0);
        assert_abs_diff_eq!(score.distances.overall.sum, 3.5, epsilon = 1e-9);
        assert!(score.distances.overall.variance > 0.0);
        assert_eq!(score.to_row()[0], 0.75);
    }
}
