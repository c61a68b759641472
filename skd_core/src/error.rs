//! Precondition failures reported by the core algorithms.

use thiserror::Error;

/// Errors raised when an input violates a precondition of a core operation.
///
/// None of these are retried or coerced to a default: a caller that gets one
/// of them has insufficient or malformed data and must decide what to do.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkdError {
    #[error("trajectory must contain at least one point")]
    EmptyTrajectory,

    #[error("sample set is empty")]
    EmptySample,

    #[error("need at least {needed} samples, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    #[error("need at least {needed} groups, got {got}")]
    InsufficientGroups { needed: usize, got: usize },

    #[error("quota of {quota} exceeds the {available} available items")]
    QuotaExceedsData { quota: usize, available: usize },

    #[error("group '{key}' has {available} items, below the per-group quota of {quota}")]
    GroupBelowQuota {
        key: String,
        quota: usize,
        available: usize,
    },

    #[error("time-aligned sequences differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SkdError>;
