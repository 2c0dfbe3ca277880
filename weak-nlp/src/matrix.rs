//! Noisy label matrix: the noisy sources, the optional reference, and the
//! record universe the ensemble scores.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::config::NlmConfig;
use crate::engine::NlmEngine;
use crate::ensemble::EnsembleOutcome;
use crate::error::{NlmError, NlmResult};
use crate::model::{RecordId, SourceVector};
use crate::quality::QualityTable;
use crate::quantity::QuantityTable;

/// Noisy vectors plus an optional ground-truth vector over a record universe.
///
/// Noisy vector identifiers are unique. `records` keeps its input order with
/// repeats removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixFields")]
pub struct NoisyLabelMatrix {
    vectors_noisy: Vec<SourceVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vector_reference: Option<SourceVector>,
    records: Vec<RecordId>,
}

#[derive(Deserialize)]
struct MatrixFields {
    #[serde(default)]
    vectors_noisy: Vec<SourceVector>,
    #[serde(default)]
    vector_reference: Option<SourceVector>,
    #[serde(default)]
    records: Vec<RecordId>,
}

impl TryFrom<MatrixFields> for NoisyLabelMatrix {
    type Error = NlmError;

    fn try_from(fields: MatrixFields) -> NlmResult<Self> {
        Self::new(fields.vectors_noisy, fields.vector_reference, fields.records)
    }
}

impl NoisyLabelMatrix {
    /// Assemble a matrix from already separated noisy and reference vectors
    pub fn new(
        vectors_noisy: Vec<SourceVector>,
        vector_reference: Option<SourceVector>,
        records: Vec<RecordId>,
    ) -> NlmResult<Self> {
        let mut identifiers = HashSet::with_capacity(vectors_noisy.len());
        for vector in &vectors_noisy {
            if !identifiers.insert(vector.identifier()) {
                return Err(NlmError::DuplicateSource(vector.identifier().to_string()));
            }
        }

        let total = records.len();
        let mut seen = HashSet::with_capacity(total);
        let records: Vec<RecordId> = records
            .into_iter()
            .filter(|record| seen.insert(record.clone()))
            .collect();
        if records.len() < total {
            debug!(
                dropped = total - records.len(),
                "Removed repeated records from universe"
            );
        }

        Ok(Self {
            vectors_noisy,
            vector_reference,
            records,
        })
    }

    /// Split a flat list of vectors into noisy and reference by each vector's
    /// reference flag. At most one vector may be flagged.
    pub fn from_vectors(vectors: Vec<SourceVector>, records: Vec<RecordId>) -> NlmResult<Self> {
        let mut reference: Option<SourceVector> = None;
        let mut noisy = Vec::with_capacity(vectors.len());
        for vector in vectors {
            if !vector.is_reference() {
                noisy.push(vector);
                continue;
            }
            if let Some(first) = &reference {
                return Err(NlmError::MultipleReferences {
                    first: first.identifier().to_string(),
                    second: vector.identifier().to_string(),
                });
            }
            reference = Some(vector);
        }
        Self::new(noisy, reference, records)
    }

    /// Start building a matrix
    pub fn builder() -> MatrixBuilder {
        MatrixBuilder::default()
    }

    pub fn vectors_noisy(&self) -> &[SourceVector] {
        &self.vectors_noisy
    }

    pub fn vector_reference(&self) -> Option<&SourceVector> {
        self.vector_reference.as_ref()
    }

    pub fn records(&self) -> &[RecordId] {
        &self.records
    }

    /// Look up a noisy vector by identifier
    pub fn vector(&self, identifier: &str) -> Option<&SourceVector> {
        self.vectors_noisy
            .iter()
            .find(|v| v.identifier() == identifier)
    }

    /// Per-source precision against the reference, with default configuration
    pub fn compute_quality(&self) -> NlmResult<QualityTable> {
        NlmEngine::new().compute_quality(self)
    }

    /// Per-source coverage, overlaps and conflicts, with default configuration
    pub fn compute_quantity(&self) -> QuantityTable {
        NlmEngine::new().compute_quantity(self)
    }

    /// Precision-weighted consensus labels, with default configuration
    pub fn weakly_supervise(&self) -> NlmResult<EnsembleOutcome> {
        NlmEngine::new().weakly_supervise(self)
    }

    /// Same as [`weakly_supervise`](Self::weakly_supervise) with a custom configuration
    pub fn weakly_supervise_with(&self, config: NlmConfig) -> NlmResult<EnsembleOutcome> {
        NlmEngine::with_config(config).weakly_supervise(self)
    }
}

/// Incremental construction of a [`NoisyLabelMatrix`].
///
/// When no record universe is given, it is the union of every record any
/// vector (reference included) mentions, in first-seen order.
#[derive(Debug, Default)]
pub struct MatrixBuilder {
    vectors: Vec<SourceVector>,
    records: Option<Vec<RecordId>>,
}

impl MatrixBuilder {
    /// Add a vector; reference vectors are recognised by their flag
    pub fn vector(mut self, vector: SourceVector) -> Self {
        self.vectors.push(vector);
        self
    }

    pub fn vectors(mut self, vectors: impl IntoIterator<Item = SourceVector>) -> Self {
        self.vectors.extend(vectors);
        self
    }

    /// Set the record universe explicitly
    pub fn records<I, R>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RecordId>,
    {
        self.records = Some(records.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> NlmResult<NoisyLabelMatrix> {
        let records = match self.records {
            Some(records) => records,
            None => records_from_associations(&self.vectors),
        };
        NoisyLabelMatrix::from_vectors(self.vectors, records)
    }
}

/// Union of every associated record, in first-seen order
pub fn records_from_associations(vectors: &[SourceVector]) -> Vec<RecordId> {
    let mut seen = HashSet::new();
    vectors
        .iter()
        .flat_map(|v| v.associations())
        .filter(|a| seen.insert(a.record()))
        .map(|a| a.record().to_string())
        .collect()
}
