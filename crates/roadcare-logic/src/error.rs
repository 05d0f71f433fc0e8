//! Error types for configuration, stepping and snapshots.

use thiserror::Error;

/// One problem found while validating an [`EnvConfig`](crate::config::EnvConfig).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("no highways defined")]
    NoHighways,
    #[error("action catalog is empty")]
    NoActions,
    #[error("action catalog has no idle action")]
    MissingIdleAction,
    #[error("action catalog has {0} idle actions, expected exactly one")]
    MultipleIdleActions(usize),
    #[error("idle action `{0}` must not have a duration")]
    IdleActionHasDuration(String),
    #[error("idle action `{0}` must be interruptible")]
    IdleActionNotInterruptible(String),
    #[error("action `{0}` needs a duration")]
    MissingDuration(String),
    #[error("action `{action}` has invalid duration {value}")]
    InvalidDuration { action: String, value: f64 },
    #[error("action `{action}` has invalid cost {value}")]
    InvalidCost { action: String, value: f64 },
    #[error("`{0}` has a non-finite or negative transform parameter")]
    InvalidTransform(String),
    #[error("duplicate action name `{0}`")]
    DuplicateAction(String),
    #[error("empty name in {0}")]
    EmptyName(&'static str),
    #[error("highway `{highway}` has invalid traffic {value}")]
    InvalidTraffic { highway: String, value: f64 },
    #[error("highway `{highway}` has invalid toll {value}")]
    InvalidToll { highway: String, value: f64 },
    #[error("highway `{highway}` has health {value} outside [0, 100]")]
    InvalidHealth { highway: String, value: f64 },
    #[error("highway `{highway}` has invalid length {value} km")]
    InvalidLength { highway: String, value: f64 },
    #[error("highway `{highway}` would split into {count} segments, at most {max} allowed")]
    TooManySegments { highway: String, count: f64, max: usize },
    #[error("emergency `{emergency}` has probability {value} outside [0, 1]")]
    InvalidProbability { emergency: String, value: f64 },
    #[error("time unit must be at least one day")]
    ZeroTimeUnit,
    #[error("days per year must be positive, got {0}")]
    InvalidDaysPerYear(f64),
    #[error("reward gamma must be within [0, 1], got {0}")]
    InvalidGamma(f64),
    #[error("reward parameters must be finite with a positive scale")]
    InvalidRewardParams,
    #[error("default {field} is invalid: {value}")]
    InvalidDefault { field: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A rejected `step` call. The environment is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("expected one action per highway ({expected}), got {got}")]
    SelectionLength { expected: usize, got: usize },

    #[error("action index {index} for highway {highway} is outside the catalog of {catalog_len}")]
    ActionOutOfRange {
        highway: usize,
        index: usize,
        catalog_len: usize,
    },
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Codec(#[from] bincode::Error),

    #[error("snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("snapshot has {found} highways, environment has {expected}")]
    HighwayCountMismatch { expected: usize, found: usize },

    #[error("snapshot highway {tag} does not match `{expected}` in this environment")]
    HighwayMismatch { tag: usize, expected: String },

    #[error("snapshot highway {tag} has health {value} outside [0, 100]")]
    InvalidHealth { tag: usize, value: f64 },

    #[error("snapshot highway {tag} has invalid {field} {value}")]
    InvalidState {
        tag: usize,
        field: &'static str,
        value: f64,
    },
}
