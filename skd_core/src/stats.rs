//! Sample statistics: mean, unbiased variance, 95% normal-approximation
//! confidence interval, grouped variance, and quota sampling.
//!
//! # Confidence interval
//! `mean ± z · sqrt(var / n)` with `z` the two-sided 97.5th percentile of the
//! standard normal. A t-distribution is deliberately not used, so intervals
//! match the normal-approximation reports already produced downstream.
//!
//! # Row layout
//! [`StatSummary::to_row`] yields `[size, sum, mean, variance, ci_low, ci_high]`.
//! Report writers consume these columns positionally.

use crate::error::{Result, SkdError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Two-sided 95% standard normal quantile.
pub const Z_95: f64 = 1.959_963_984_540_054;

/// Number of columns in [`StatSummary::to_row`].
pub const STAT_COLUMNS: usize = 6;

/// Aggregate over one numeric sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    pub size: usize,
    pub sum: f64,
    pub mean: f64,
    /// Unbiased sample variance (ddof = 1)
    pub variance: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

impl StatSummary {
    /// Standard error of the mean.
    pub fn std_error(&self) -> f64 {
        (self.variance / self.size as f64).sqrt()
    }

    pub fn to_row(&self) -> [f64; STAT_COLUMNS] {
        [
            self.size as f64,
            self.sum,
            self.mean,
            self.variance,
            self.ci_low,
            self.ci_high,
        ]
    }
}

/// Summarize a sample. Needs at least two values for the variance.
pub fn summarize(samples: &[f64]) -> Result<StatSummary> {
    if samples.is_empty() {
        return Err(SkdError::EmptySample);
    }
    let size = samples.len();
    if size < 2 {
        return Err(SkdError::InsufficientSamples { needed: 2, got: size });
    }

    let sum: f64 = samples.iter().sum();
    let mean = sum / size as f64;
    let variance = sample_variance(samples, mean);
    let half_width = Z_95 * (variance / size as f64).sqrt();

    Ok(StatSummary {
        size,
        sum,
        mean,
        variance,
        ci_low: mean - half_width,
        ci_high: mean + half_width,
    })
}

fn sample_variance(samples: &[f64], mean: f64) -> f64 {
    let ss: f64 = samples.iter().map(|x| (x - mean) * (x - mean)).sum();
    ss / (samples.len() - 1) as f64
}

/// Mean of the per-group variances plus the variance (ddof = 1) of the
/// per-group means. Needs at least two groups.
pub fn grouped_variance(groups: &[StatSummary]) -> Result<f64> {
    if groups.len() < 2 {
        return Err(SkdError::InsufficientGroups {
            needed: 2,
            got: groups.len(),
        });
    }
    let n = groups.len() as f64;
    let mean_of_vars = groups.iter().map(|g| g.variance).sum::<f64>() / n;
    let means: Vec<f64> = groups.iter().map(|g| g.mean).collect();
    let grand = means.iter().sum::<f64>() / n;
    Ok(mean_of_vars + sample_variance(&means, grand))
}

// ---------------------------------------------------------------------------
// Grouped samples
// ---------------------------------------------------------------------------

/// Statistics of a sample partitioned by key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupedSummary {
    /// Summary over the union of all groups
    pub overall: StatSummary,
    /// Per-group summaries in key order
    pub groups: BTreeMap<String, StatSummary>,
    /// `None` when fewer than two groups are present
    pub grouped_variance: Option<f64>,
}

impl GroupedSummary {
    pub fn group_means(&self) -> Vec<f64> {
        self.groups.values().map(|g| g.mean).collect()
    }

    pub fn group_variances(&self) -> Vec<f64> {
        self.groups.values().map(|g| g.variance).collect()
    }
}

/// Summarize each group and the union of all groups.
pub fn summarize_groups(groups: &BTreeMap<String, Vec<f64>>) -> Result<GroupedSummary> {
    let all: Vec<f64> = groups.values().flatten().copied().collect();
    let overall = summarize(&all)?;

    let mut per_group = BTreeMap::new();
    for (key, values) in groups {
        per_group.insert(key.clone(), summarize(values)?);
    }

    let summaries: Vec<StatSummary> = per_group.values().cloned().collect();
    let grouped_variance = match grouped_variance(&summaries) {
        Ok(v) => Some(v),
        Err(SkdError::InsufficientGroups { .. }) => None,
        Err(e) => return Err(e),
    };

    Ok(GroupedSummary {
        overall,
        groups: per_group,
        grouped_variance,
    })
}

/// Draw the same number of items from every group, without replacement.
///
/// The per-group quota is `ceil(total_quota / groups.len())`. Fails if the
/// groups hold fewer than `total_quota` items overall, or if any single group
/// holds fewer than the per-group quota. Groups are never padded.
pub fn sample_with_quota<K, T, R>(
    groups: BTreeMap<K, Vec<T>>,
    total_quota: usize,
    rng: &mut R,
) -> Result<BTreeMap<K, Vec<T>>>
where
    K: Ord + Display,
    R: Rng + ?Sized,
{
    if groups.is_empty() {
        return Err(SkdError::InsufficientGroups { needed: 1, got: 0 });
    }
    let available: usize = groups.values().map(Vec::len).sum();
    if available < total_quota {
        return Err(SkdError::QuotaExceedsData {
            quota: total_quota,
            available,
        });
    }

    let quota = total_quota.div_ceil(groups.len());
    let mut sampled = BTreeMap::new();
    for (key, mut items) in groups {
        if items.len() < quota {
            return Err(SkdError::GroupBelowQuota {
                key: key.to_string(),
                quota,
                available: items.len(),
            });
        }
        items.shuffle(rng);
        items.truncate(quota);
        sampled.insert(key, items);
    }
    Ok(sampled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn one_to_five() {
        let s = summarize(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.size, 5);
        assert_abs_diff_eq!(s.sum, 15.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.mean, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.variance, 2.5, epsilon = 1e-12);
        let half = Z_95 * (2.5f64 / 5.0).sqrt();
        assert_abs_diff_eq!(s.ci_low, 3.0 - half, epsilon = 1e-12);
        assert_abs_diff_eq!(s.ci_high, 3.0 + half, epsilon = 1e-12);
        assert_eq!(s.to_row(), [5.0, 15.0, 3.0, 2.5, s.ci_low, s.ci_high]);
    }

    #[test]
    fn empty_and_singleton_fail() {
        assert_eq!(summarize(&[]), Err(SkdError::EmptySample));
        assert_eq!(
            summarize(&[1.0]),
            Err(SkdError::InsufficientSamples { needed: 2, got: 1 })
        );
    }

    #[test]
    fn ci_covers_true_mean_at_nominal_rate() {
        // Uniform(0, 1) has mean 0.5.
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let trials = 2000;
        let mut covered = 0;
        for _ in 0..trials {
            let sample: Vec<f64> = (0..60).map(|_| rng.gen::<f64>()).collect();
            let s = summarize(&sample).unwrap();
            if s.ci_low <= 0.5 && 0.5 <= s.ci_high {
                covered += 1;
            }
        }
        let rate = covered as f64 / trials as f64;
        assert!((0.92..=0.975).contains(&rate), "coverage {rate}");
    }

    #[test]
    fn grouped_variance_decomposition() {
        let a = summarize(&[1.0, 3.0]).unwrap(); // mean 2, var 2
        let b = summarize(&[5.0, 7.0, 9.0]).unwrap(); // mean 7, var 4
        // mean(2, 4) + var([2, 7], ddof=1) = 3 + 12.5
        assert_abs_diff_eq!(grouped_variance(&[a, b]).unwrap(), 15.5, epsilon = 1e-12);
    }

    #[test]
    fn grouped_variance_needs_two_groups() {
        let a = summarize(&[1.0, 3.0]).unwrap();
        assert_eq!(
            grouped_variance(&[a]),
            Err(SkdError::InsufficientGroups { needed: 2, got: 1 })
        );
    }

    #[test]
    fn summarize_groups_reports_overall_and_per_group() {
        let mut groups = BTreeMap::new();
        groups.insert("0".to_string(), vec![1.0, 3.0]);
        groups.insert("1".to_string(), vec![5.0, 7.0, 9.0]);
        let g = summarize_groups(&groups).unwrap();
        assert_eq!(g.overall.size, 5);
        assert_abs_diff_eq!(g.overall.mean, 5.0, epsilon = 1e-12);
        assert_eq!(g.group_means(), vec![2.0, 7.0]);
        assert_abs_diff_eq!(g.grouped_variance.unwrap(), 15.5, epsilon = 1e-12);

        groups.remove("1");
        let single = summarize_groups(&groups).unwrap();
        assert!(single.grouped_variance.is_none());
    }

    #[test]
    fn quota_sampling_takes_equal_share() {
        let mut groups = BTreeMap::new();
        groups.insert("a", (1..=10).collect::<Vec<i32>>());
        groups.insert("b", (1..=10).collect::<Vec<i32>>());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let out = sample_with_quota(groups, 10, &mut rng).unwrap();
        assert_eq!(out["a"].len(), 5);
        assert_eq!(out["b"].len(), 5);

        // Without replacement: no duplicates.
        let mut a = out["a"].clone();
        a.sort_unstable();
        a.dedup();
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn quota_rounds_up_per_group() {
        let mut groups = BTreeMap::new();
        groups.insert("a", vec![0; 4]);
        groups.insert("b", vec![0; 4]);
        groups.insert("c", vec![0; 4]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // ceil(10 / 3) = 4 per group
        let out = sample_with_quota(groups, 10, &mut rng).unwrap();
        assert!(out.values().all(|v| v.len() == 4));
    }

    #[test]
    fn quota_failures() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut small = BTreeMap::new();
        small.insert("a", vec![1, 2, 3]);
        small.insert("b", vec![1, 2, 3]);
        assert_eq!(
            sample_with_quota(small, 10, &mut rng),
            Err(SkdError::QuotaExceedsData {
                quota: 10,
                available: 6
            })
        );

        let mut uneven = BTreeMap::new();
        uneven.insert("a", (0..10).collect::<Vec<i32>>());
        uneven.insert("b", vec![1, 2, 3, 4]);
        assert_eq!(
            sample_with_quota(uneven, 10, &mut rng),
            Err(SkdError::GroupBelowQuota {
                key: "b".into(),
                quota: 5,
                available: 4
            })
        );

        let none: BTreeMap<&str, Vec<i32>> = BTreeMap::new();
        assert!(matches!(
            sample_with_quota(none, 1, &mut rng),
            Err(SkdError::InsufficientGroups { .. })
        ));
    }

    #[test]
    fn quota_sampling_is_reproducible() {
        let build = || {
            let mut g = BTreeMap::new();
            g.insert("a", (0..50).collect::<Vec<i32>>());
            g.insert("b", (50..100).collect::<Vec<i32>>());
            g
        };
        let first = sample_with_quota(build(), 20, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        let second = sample_with_quota(build(), 20, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        assert_eq!(first, second);
    }
}
