//! Structured error types for the noisy label matrix engines.
//!
//! Every variant is fatal to the call that produced it. Engines never return
//! partial tables.

use std::path::PathBuf;

/// Errors from matrix assembly, configuration, and the metric/ensemble passes.
#[derive(Debug, thiserror::Error)]
pub enum NlmError {
    /// Quality metrics need a reference vector to compare against.
    #[error("Can't calculate quality metrics without a reference vector")]
    MissingReference,

    /// The quality pass produced no rows, so there are no weights to vote with.
    #[error("Empty statistics; can't compute weak supervision")]
    EmptyStatistics,

    /// A source emitted a label that the quality pass never scored.
    #[error("No precision recorded for source {identifier:?} and label {label:?}")]
    PrecisionLookup { identifier: String, label: String },

    /// Confidence outside `[0, 1]` or not a finite number.
    #[error("Invalid confidence {value} for record {record:?} with label {label:?}")]
    InvalidConfidence {
        record: String,
        label: String,
        value: f64,
    },

    /// Two noisy vectors share an identifier.
    #[error("Duplicate source identifier: {0}")]
    DuplicateSource(String),

    /// More than one vector was flagged as the reference.
    #[error("Multiple reference vectors: {first} and {second}")]
    MultipleReferences { first: String, second: String },

    /// The reference labels one record more than once and the policy forbids it.
    #[error("Reference vector assigns several labels to record {record:?}")]
    AmbiguousReference { record: String },

    /// Failed to read a configuration file from disk.
    #[error("Failed to read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds unusable values.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for engine operations.
pub type NlmResult<T> = Result<T, NlmError>;
