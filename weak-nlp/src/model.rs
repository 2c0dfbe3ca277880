//! Core data model: associations and source vectors
//!
//! An [`Association`] is one source's claim about one record. A
//! [`SourceVector`] groups every claim a single source made. Both are
//! immutable once built; the engines derive diagnostics from them without
//! writing anything back.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{NlmError, NlmResult};

/// Opaque identifier of a labelled unit (e.g. a document id)
pub type RecordId = String;

/// Identifier of a labelling source (heuristic, model, annotator)
pub type SourceId = String;

/// Category name from the task's label schema
pub type Label = String;

/// One source's claim that `record` carries `label`.
///
/// Confidence is optional; how an absent confidence weighs in the ensemble is
/// decided by [`MissingConfidence`](crate::config::MissingConfidence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssociationFields")]
pub struct Association {
    record: RecordId,
    label: Label,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
}

#[derive(Deserialize)]
struct AssociationFields {
    record: RecordId,
    label: Label,
    #[serde(default)]
    confidence: Option<f64>,
}

impl TryFrom<AssociationFields> for Association {
    type Error = NlmError;

    fn try_from(fields: AssociationFields) -> NlmResult<Self> {
        match fields.confidence {
            Some(value) => Self::with_confidence(fields.record, fields.label, value),
            None => Ok(Self::new(fields.record, fields.label)),
        }
    }
}

impl Association {
    /// Create an association without a confidence
    pub fn new(record: impl Into<RecordId>, label: impl Into<Label>) -> Self {
        Self {
            record: record.into(),
            label: label.into(),
            confidence: None,
        }
    }

    /// Create an association with a confidence in `[0, 1]`
    pub fn with_confidence(
        record: impl Into<RecordId>,
        label: impl Into<Label>,
        confidence: f64,
    ) -> NlmResult<Self> {
        let record = record.into();
        let label = label.into();
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(NlmError::InvalidConfidence {
                record,
                label,
                value: confidence,
            });
        }
        Ok(Self {
            record,
            label,
            confidence: Some(confidence),
        })
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }
}

/// Every association produced by one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceVector {
    identifier: SourceId,
    #[serde(default)]
    associations: Vec<Association>,
    /// Marks human-verified ground truth
    #[serde(default)]
    is_reference: bool,
}

impl SourceVector {
    /// Create a noisy source vector
    pub fn new(identifier: impl Into<SourceId>, associations: Vec<Association>) -> Self {
        Self {
            identifier: identifier.into(),
            associations,
            is_reference: false,
        }
    }

    /// Create a reference (ground-truth) vector
    pub fn reference(identifier: impl Into<SourceId>, associations: Vec<Association>) -> Self {
        Self {
            is_reference: true,
            ..Self::new(identifier, associations)
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn is_reference(&self) -> bool {
        self.is_reference
    }

    /// True when the source made no claims at all
    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }

    /// Associations with repeated `(record, label)` pairs removed.
    ///
    /// The first occurrence of each pair is kept, in input order.
    pub fn distinct(&self) -> Vec<&Association> {
        let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(self.associations.len());
        self.associations
            .iter()
            .filter(|a| seen.insert((a.record(), a.label())))
            .collect()
    }

    /// Distinct labels in order of first appearance
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.associations
            .iter()
            .map(Association::label)
            .filter(|label| seen.insert(*label))
            .collect()
    }

    /// Map each record to the first label this source gave it
    pub fn first_labels(&self) -> HashMap<&str, &str> {
        let mut first = HashMap::new();
        for association in &self.associations {
            first
                .entry(association.record())
                .or_insert_with(|| association.label());
        }
        first
    }

    /// Map each record to every distinct label this source gave it, in order
    pub fn labels_by_record(&self) -> HashMap<&str, Vec<&str>> {
        let mut by_record: HashMap<&str, Vec<&str>> = HashMap::new();
        for association in self.distinct() {
            by_record
                .entry(association.record())
                .or_default()
                .push(association.label());
        }
        by_record
    }
}
