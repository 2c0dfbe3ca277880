//! NLM Engine: configured entry point for the metric and ensemble passes
//!
//! All passes are deterministic and read-only over the matrix. Diagnostics are
//! returned as fresh tables keyed by source identifier, so repeated calls on
//! an unchanged matrix yield identical results.

use tracing::debug;

use crate::config::NlmConfig;
use crate::ensemble::{self, EnsembleOutcome};
use crate::error::NlmResult;
use crate::matrix::NoisyLabelMatrix;
use crate::quality::{self, QualityTable};
use crate::quantity::{self, QuantityTable};

/// Runs quality, quantity and ensemble passes with one configuration
#[derive(Debug, Clone, Default)]
pub struct NlmEngine {
    config: NlmConfig,
}

impl NlmEngine {
    /// Create a new engine with default config
    pub fn new() -> Self {
        Self {
            config: NlmConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: NlmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NlmConfig {
        &self.config
    }

    /// Per-source, per-label precision against the reference vector
    pub fn compute_quality(&self, matrix: &NoisyLabelMatrix) -> NlmResult<QualityTable> {
        debug!(
            sources = matrix.vectors_noisy().len(),
            parallel = self.config.parallel,
            "Starting quality pass"
        );
        quality::compute_quality(matrix, &self.config)
    }

    /// Per-source, per-label coverage, overlaps and conflicts
    pub fn compute_quantity(&self, matrix: &NoisyLabelMatrix) -> QuantityTable {
        debug!(
            sources = matrix.vectors_noisy().len(),
            parallel = self.config.parallel,
            "Starting quantity pass"
        );
        quantity::compute_quantity(matrix, &self.config)
    }

    /// Precision-weighted consensus label per record
    pub fn weakly_supervise(&self, matrix: &NoisyLabelMatrix) -> NlmResult<EnsembleOutcome> {
        debug!(records = matrix.records().len(), "Starting weak supervision");
        ensemble::weakly_supervise(matrix, &self.config)
    }

    /// Vote with a quality table computed earlier
    pub fn supervise_with_quality(
        &self,
        matrix: &NoisyLabelMatrix,
        quality: &QualityTable,
    ) -> NlmResult<EnsembleOutcome> {
        ensemble::supervise_with_quality(matrix, quality, &self.config)
    }
}
