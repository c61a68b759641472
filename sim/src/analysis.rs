//! Collision-rate analysis of experiment outcomes.

use crate::experiment::TrajectoryOutcome;
use serde::{Deserialize, Serialize};
use skd_core::error::Result;
use skd_core::stats::{summarize, StatSummary};

/// Collision rates of one controller multiplier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollisionRateRow {
    pub multiplier: f64,
    /// `(trajectory label, rate)` in experiment order
    pub rates: Vec<(String, f64)>,
    pub summary: StatSummary,
}

impl CollisionRateRow {
    /// `[multiplier, rate_0, …, rate_k, size, sum, mean, variance, ci_low, ci_high]`
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(1 + self.rates.len() + 6);
        row.push(self.multiplier);
        row.extend(self.rates.iter().map(|(_, r)| *r));
        row.extend_from_slice(&self.summary.to_row());
        row
    }
}

/// One row per multiplier, in order of first appearance.
pub fn collision_rate_rows(outcomes: &[TrajectoryOutcome]) -> Result<Vec<CollisionRateRow>> {
    let mut grouped: Vec<(f64, Vec<(String, f64)>)> = Vec::new();
    for o in outcomes {
        let entry = (o.label(), o.collision_rate());
        match grouped.iter_mut().find(|(m, _)| *m == o.multiplier) {
            Some((_, rates)) => rates.push(entry),
            None => grouped.push((o.multiplier, vec![entry])),
        }
    }

    grouped
        .into_iter()
        .map(|(multiplier, rates)| {
            let values: Vec<f64> = rates.iter().map(|(_, r)| *r).collect();
            Ok(CollisionRateRow {
                multiplier,
                summary: summarize(&values)?,
                rates,
            })
        })
        .collect()
}
