//! Error taxonomy
//!
//! `ConfigError` is fatal to initialization and always reaches the caller.
//! `TransientStateError` is recovered inside the tick that produced it.

use thiserror::Error;

/// Invalid or missing configuration (ruleset, numeric knobs, arena)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("ruleset `{variation}` defines {count} type(s), at least 2 are required")]
    TooFewTypes { variation: String, count: usize },

    #[error("ruleset `{variation}` defines type `{key}` more than once")]
    DuplicateType { variation: String, key: String },

    #[error("ruleset `{variation}` has a rule naming unknown type `{key}`")]
    UnknownType { variation: String, key: String },

    #[error("ruleset `{variation}` lets `{key}` beat itself")]
    SelfRule { variation: String, key: String },

    #[error("ruleset `{variation}` has `{a}` and `{b}` beating each other")]
    ContradictoryRule { variation: String, a: String, b: String },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("items_per_type must be at least 1")]
    NoItems,

    #[error("unknown variation `{0}`")]
    UnknownVariation(String),

    #[error("ruleset `{variation}` has an invalid sound {field}: {value}")]
    InvalidSound {
        variation: String,
        field: &'static str,
        value: f64,
    },

    #[error("variation `{0}` is defined more than once")]
    DuplicateVariation(String),

    #[error("variation catalog is empty")]
    EmptyCatalog,

    #[error("failed to parse ruleset document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Check that a numeric knob is finite and strictly positive
pub(crate) fn require_positive(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite {
            field,
            value: value as f64,
        });
    }
    if value <= 0.0 {
        return Err(ConfigError::NonPositive {
            field,
            value: value as f64,
        });
    }
    Ok(value)
}

/// Per-tick state that cannot be acted on; the offending operation is skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransientStateError {
    #[error("items {a} and {b} share a center, collision normal is undefined")]
    CoincidentCenters { a: usize, b: usize },
}
