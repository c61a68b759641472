//! Reference safe trajectory sets.
//!
//! A set is a JSON object mapping string keys ("0", "1", ...) to lists of
//! `[longit, hoz]` pairs. The set is named after its file stem.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use skd_core::types::Trajectory;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafeTrajectorySet {
    pub name: String,
    pub trajectories: BTreeMap<String, Trajectory>,
}

impl SafeTrajectorySet {
    pub fn new(name: impl Into<String>, trajectories: BTreeMap<String, Trajectory>) -> Self {
        Self {
            name: name.into(),
            trajectories,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening safe trajectory file {}", path.display()))?;
        let trajectories: BTreeMap<String, Trajectory> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing safe trajectory file {}", path.display()))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("safe")
            .to_string();
        Ok(Self { name, trajectories })
    }

    pub fn get_trajectory(&self, key: &str) -> anyhow::Result<&Trajectory> {
        self.trajectories
            .get(key)
            .ok_or_else(|| anyhow!("safe trajectory '{key}' not found in set '{}'", self.name))
    }

    /// Keys with numeric keys in numeric order ("2" before "10"), then the
    /// rest lexicographically.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.trajectories.keys().map(String::as_str).collect();
        keys.sort_by(|a, b| numeric_aware(a, b));
        keys
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }
}

fn numeric_aware(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skd_core::types::Point2D;
    use std::io::Write;

    #[test]
    fn keys_sort_numerically() {
        let t = Trajectory::from_pairs(&[[0.0, 0.0]]).unwrap();
        let map = ["10", "2", "0", "extra", "1"]
            .iter()
            .map(|k| (k.to_string(), t.clone()))
            .collect();
        let set = SafeTrajectorySet::new("s", map);
        assert_eq!(set.keys(), vec!["0", "1", "2", "10", "extra"]);
    }

    #[test]
    fn loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crossings.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, r#"{{"0": [[10.0, 2.0], [10.0, 1.5]], "1": [[12.0, 2.0]]}}"#).unwrap();

        let set = SafeTrajectorySet::load(&path).unwrap();
        assert_eq!(set.name, "crossings");
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_trajectory("0").unwrap().last(), Point2D::new(10.0, 1.5));
        assert!(set.get_trajectory("7").is_err());
    }

    #[test]
    fn empty_trajectory_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"0": []}"#).unwrap();
        assert!(SafeTrajectorySet::load(&path).is_err());
    }
}
