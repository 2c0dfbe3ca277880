//! Quality metrics: per-source, per-label precision against the reference
//!
//! Each non-empty noisy vector is inner-joined with the reference vector on
//! record. Joined rows are grouped by the noisy label; a row is a true
//! positive when the reference agrees and a false positive otherwise. Labels a
//! source emits but never on a reference record keep `0/0` and a precision of
//! `0.0`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::{NlmConfig, ReferencePolicy};
use crate::error::{NlmError, NlmResult};
use crate::matrix::NoisyLabelMatrix;
use crate::model::{Label, SourceId, SourceVector};

/// True/false positive counts for one label of one source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCounts {
    pub true_positives: u64,
    pub false_positives: u64,
}

impl QualityCounts {
    /// `tp / (tp + fp)`, or `0.0` when nothing was scored
    pub fn precision(&self) -> f64 {
        let scored = self.true_positives + self.false_positives;
        if scored == 0 {
            0.0
        } else {
            self.true_positives as f64 / scored as f64
        }
    }

    /// Number of joined rows behind these counts
    pub fn scored(&self) -> u64 {
        self.true_positives + self.false_positives
    }
}

/// Quality diagnostics of one source, labels in first-appearance order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQuality {
    pub identifier: SourceId,
    pub labels: Vec<(Label, QualityCounts)>,
}

impl SourceQuality {
    pub fn counts(&self, label: &str) -> Option<QualityCounts> {
        self.labels
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, counts)| *counts)
    }
}

/// One flattened row of the quality table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRow {
    pub identifier: SourceId,
    pub label: Label,
    pub true_positives: u64,
    pub false_positives: u64,
    pub precision: f64,
}

/// Result of a quality pass, one entry per non-empty noisy source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityTable {
    pub sources: Vec<SourceQuality>,
}

impl QualityTable {
    /// Flatten into `(identifier, label, tp, fp, precision)` rows
    pub fn rows(&self) -> Vec<QualityRow> {
        self.sources
            .iter()
            .flat_map(|source| {
                source.labels.iter().map(|(label, counts)| QualityRow {
                    identifier: source.identifier.clone(),
                    label: label.clone(),
                    true_positives: counts.true_positives,
                    false_positives: counts.false_positives,
                    precision: counts.precision(),
                })
            })
            .collect()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.sources.iter().map(|s| s.labels.len()).sum()
    }

    /// True when no source produced a row
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diagnostics for one source
    pub fn source(&self, identifier: &str) -> Option<&SourceQuality> {
        self.sources.iter().find(|s| s.identifier == identifier)
    }

    /// Precision of `(source, label)`, if that pair was scored
    pub fn precision(&self, identifier: &str, label: &str) -> Option<f64> {
        self.source(identifier)
            .and_then(|s| s.counts(label))
            .map(|counts| counts.precision())
    }

    /// Precision keyed by `(source, label)`
    pub fn precision_lookup(&self) -> HashMap<(&str, &str), f64> {
        self.sources
            .iter()
            .flat_map(|source| {
                source.labels.iter().map(move |(label, counts)| {
                    (
                        (source.identifier.as_str(), label.as_str()),
                        counts.precision(),
                    )
                })
            })
            .collect()
    }

    /// Format as a markdown report
    pub fn format_report(&self) -> String {
        let mut report = String::new();
        report.push_str("## Source Quality\n\n");
        report.push_str("| Source | Label | TP | FP | Precision |\n");
        report.push_str("|--------|-------|----|----|-----------|\n");
        for row in self.rows() {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {:.3} |\n",
                row.identifier, row.label, row.true_positives, row.false_positives, row.precision
            ));
        }
        report.push('\n');
        report
    }
}

/// Compute quality diagnostics for every non-empty noisy vector.
///
/// Fails with [`NlmError::MissingReference`] when the matrix has no
/// reference vector. An empty table is a valid result.
pub fn compute_quality(matrix: &NoisyLabelMatrix, config: &NlmConfig) -> NlmResult<QualityTable> {
    let reference = matrix.vector_reference().ok_or(NlmError::MissingReference)?;
    let truth = reference_index(reference, config.reference_policy)?;

    for vector in matrix.vectors_noisy().iter().filter(|v| v.is_empty()) {
        warn!(source = vector.identifier(), "Skipping empty source vector");
    }

    let score = |vector: &SourceVector| score_source(vector, &truth, config.reference_policy);
    let sources: Vec<SourceQuality> = if config.parallel {
        matrix
            .vectors_noisy()
            .par_iter()
            .filter(|v| !v.is_empty())
            .map(score)
            .collect()
    } else {
        matrix
            .vectors_noisy()
            .iter()
            .filter(|v| !v.is_empty())
            .map(score)
            .collect()
    };

    let table = QualityTable { sources };
    info!(
        sources = table.sources.len(),
        rows = table.len(),
        reference = reference.identifier(),
        "Computed quality metrics"
    );
    Ok(table)
}

/// Reference labels per record, enforcing the multi-label policy
fn reference_index(
    reference: &SourceVector,
    policy: ReferencePolicy,
) -> NlmResult<HashMap<&str, Vec<&str>>> {
    let index = reference.labels_by_record();
    if policy == ReferencePolicy::Reject {
        // Report the first ambiguous record in reference order
        if let Some(record) = reference
            .associations()
            .iter()
            .map(|a| a.record())
            .find(|record| index.get(record).is_some_and(|labels| labels.len() > 1))
        {
            return Err(NlmError::AmbiguousReference {
                record: record.to_string(),
            });
        }
    }
    Ok(index)
}

fn score_source(
    vector: &SourceVector,
    truth: &HashMap<&str, Vec<&str>>,
    policy: ReferencePolicy,
) -> SourceQuality {
    let mut labels: Vec<(Label, QualityCounts)> = vector
        .labels()
        .into_iter()
        .map(|label| (label.to_string(), QualityCounts::default()))
        .collect();
    let slots: HashMap<String, usize> = labels
        .iter()
        .enumerate()
        .map(|(idx, (label, _))| (label.clone(), idx))
        .collect();

    let mut joined = 0usize;
    for association in vector.distinct() {
        let Some(reference_labels) = truth.get(association.record()) else {
            continue;
        };
        let Some(&slot) = slots.get(association.label()) else {
            continue;
        };
        let counts = &mut labels[slot].1;

        match policy {
            ReferencePolicy::CrossProduct => {
                joined += reference_labels.len();
                for reference_label in reference_labels {
                    if *reference_label == association.label() {
                        counts.true_positives += 1;
                    } else {
                        counts.false_positives += 1;
                    }
                }
            }
            ReferencePolicy::AnyMatch | ReferencePolicy::Reject => {
                joined += 1;
                if reference_labels.contains(&association.label()) {
                    counts.true_positives += 1;
                } else {
                    counts.false_positives += 1;
                }
            }
        }
    }

    debug!(
        source = vector.identifier(),
        labels = labels.len(),
        joined,
        "Scored source against reference"
    );

    SourceQuality {
        identifier: vector.identifier().to_string(),
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Association;

    fn assoc(record: &str, label: &str) -> Association {
        Association::new(record, label)
    }

    fn matrix(noisy: Vec<SourceVector>, reference: Option<SourceVector>) -> NoisyLabelMatrix {
        NoisyLabelMatrix::new(noisy, reference, vec![]).unwrap()
    }

    fn gold() -> SourceVector {
        SourceVector::reference(
            "gold",
            vec![assoc("r1", "spam"), assoc("r2", "ham"), assoc("r3", "spam")],
        )
    }

    #[test]
    fn test_missing_reference() {
        let m = matrix(vec![SourceVector::new("a", vec![assoc("r1", "spam")])], None);
        let err = compute_quality(&m, &NlmConfig::default()).unwrap_err();
        assert!(matches!(err, NlmError::MissingReference));
    }

    #[test]
    fn test_true_and_false_positives() {
        let noisy = SourceVector::new(
            "keyword",
            vec![
                assoc("r1", "spam"),
                assoc("r2", "spam"),
                assoc("r3", "spam"),
                assoc("r9", "spam"),
            ],
        );
        let table = compute_quality(&matrix(vec![noisy], Some(gold())), &NlmConfig::default())
            .unwrap();
        let counts = table.source("keyword").unwrap().counts("spam").unwrap();
        assert_eq!(counts.true_positives, 2);
        assert_eq!(counts.false_positives, 1);
        let precision = table.precision("keyword", "spam").unwrap();
        assert!((precision - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_label_without_overlap_keeps_zero() {
        let noisy = SourceVector::new(
            "keyword",
            vec![assoc("r1", "spam"), assoc("r7", "promo")],
        );
        let table = compute_quality(&matrix(vec![noisy], Some(gold())), &NlmConfig::default())
            .unwrap();
        let rows = table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].label, "promo");
        assert_eq!(rows[1].true_positives, 0);
        assert_eq!(rows[1].false_positives, 0);
        assert_eq!(rows[1].precision, 0.0);
    }

    #[test]
    fn test_empty_vectors_skipped() {
        let table = compute_quality(
            &matrix(vec![SourceVector::new("silent", vec![])], Some(gold())),
            &NlmConfig::default(),
        )
        .unwrap();
        assert!(table.is_empty());
        assert!(table.source("silent").is_none());
    }

    #[test]
    fn test_repeated_pairs_counted_once() {
        let noisy = SourceVector::new("dup", vec![assoc("r1", "spam"), assoc("r1", "spam")]);
        let table = compute_quality(&matrix(vec![noisy], Some(gold())), &NlmConfig::default())
            .unwrap();
        assert_eq!(table.source("dup").unwrap().counts("spam").unwrap().scored(), 1);
    }

    fn ambiguous_gold() -> SourceVector {
        SourceVector::reference("gold", vec![assoc("r1", "spam"), assoc("r1", "ham")])
    }

    #[test]
    fn test_reference_any_match() {
        let noisy = SourceVector::new("a", vec![assoc("r1", "ham")]);
        let config = NlmConfig::default().with_reference_policy(ReferencePolicy::AnyMatch);
        let table = compute_quality(&matrix(vec![noisy], Some(ambiguous_gold())), &config).unwrap();
        let counts = table.source("a").unwrap().counts("ham").unwrap();
        assert_eq!((counts.true_positives, counts.false_positives), (1, 0));
    }

    #[test]
    fn test_multi_labelled_reference_scores_every_pair_by_default() {
        let noisy = SourceVector::new("a", vec![assoc("r1", "ham"), assoc("r2", "spam")]);
        let gold = SourceVector::reference(
            "gold",
            vec![assoc("r1", "spam"), assoc("r1", "ham"), assoc("r2", "spam")],
        );
        let table =
            compute_quality(&matrix(vec![noisy], Some(gold)), &NlmConfig::default()).unwrap();
        let ham = table.source("a").unwrap().counts("ham").unwrap();
        assert_eq!((ham.true_positives, ham.false_positives), (1, 1));
        assert_eq!(table.precision("a", "ham"), Some(0.5));
        let spam = table.source("a").unwrap().counts("spam").unwrap();
        assert_eq!((spam.true_positives, spam.false_positives), (1, 0));
    }

    #[test]
    fn test_reference_reject() {
        let noisy = SourceVector::new("a", vec![assoc("r1", "ham")]);
        let config = NlmConfig::default().with_reference_policy(ReferencePolicy::Reject);
        let err = compute_quality(&matrix(vec![noisy], Some(ambiguous_gold())), &config)
            .unwrap_err();
        assert!(matches!(err, NlmError::AmbiguousReference { record } if record == "r1"));
    }

    #[test]
    fn test_format_report_lists_rows() {
        let noisy = SourceVector::new("keyword", vec![assoc("r1", "spam")]);
        let table = compute_quality(&matrix(vec![noisy], Some(gold())), &NlmConfig::default())
            .unwrap();
        let report = table.format_report();
        assert!(report.contains("| keyword | spam | 1 | 0 | 1.000 |"));
    }
}
