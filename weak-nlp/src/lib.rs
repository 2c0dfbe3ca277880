//! Weak NLP Library
//!
//! Weak supervision for text classification: combine many noisy labelling
//! sources into one consensus label per record, and measure how reliable each
//! source is.
//!
//! # Features
//!
//! ## Quality metrics
//! Per-source, per-label precision against a human-verified reference vector
//! (`NoisyLabelMatrix::compute_quality`).
//!
//! ## Quantity metrics
//! Per-source, per-label coverage, overlaps and conflicts against the other
//! noisy sources (`NoisyLabelMatrix::compute_quantity`).
//!
//! ## Weak supervision
//! Precision-weighted ensemble voting with a margin rule and sigmoid-calibrated
//! confidence (`NoisyLabelMatrix::weakly_supervise`).
//!
//! # Usage
//!
//! ```
//! use weak_nlp::{Association, NoisyLabelMatrix, SourceVector};
//!
//! let matrix = NoisyLabelMatrix::builder()
//!     .vector(SourceVector::reference("gold", vec![Association::new("doc-1", "spam")]))
//!     .vector(SourceVector::new(
//!         "keyword",
//!         vec![Association::new("doc-1", "spam"), Association::new("doc-2", "spam")],
//!     ))
//!     .build()?;
//!
//! let outcome = matrix.weakly_supervise()?;
//! assert_eq!(outcome.get("doc-2").and_then(|d| d.label()), Some("spam"));
//! # Ok::<(), weak_nlp::NlmError>(())
//! ```

pub mod config;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod matrix;
pub mod model;
pub mod quality;
pub mod quantity;

pub use config::{MissingConfidence, NlmConfig, ReferencePolicy};
pub use engine::NlmEngine;
pub use ensemble::{sigmoid, Decision, EnsembleOutcome, RecordDecision, VoteTally};
pub use error::{NlmError, NlmResult};
pub use matrix::{records_from_associations, MatrixBuilder, NoisyLabelMatrix};
pub use model::{Association, Label, RecordId, SourceId, SourceVector};
pub use quality::{QualityCounts, QualityRow, QualityTable, SourceQuality};
pub use quantity::{QuantityCounts, QuantityRow, QuantityTable, SourceQuantity};
