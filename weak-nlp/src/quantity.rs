//! Quantity metrics: coverage, overlaps and conflicts between noisy sources
//!
//! No reference vector is involved. Each source is compared with all other
//! noisy sources on the records it covers.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::config::NlmConfig;
use crate::matrix::NoisyLabelMatrix;
use crate::model::{Label, SourceId, SourceVector};

/// Coverage, overlap and conflict counts for one label of one source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityCounts {
    /// Records this source gave the label
    pub record_coverage: u64,
    /// Records where at least one other source gave the same label
    pub source_overlaps: u64,
    /// Records where other sources disagree with this source or each other
    pub source_conflicts: u64,
}

/// Quantity diagnostics of one source, labels in first-appearance order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQuantity {
    pub identifier: SourceId,
    pub labels: Vec<(Label, QuantityCounts)>,
}

impl SourceQuantity {
    pub fn counts(&self, label: &str) -> Option<QuantityCounts> {
        self.labels
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, counts)| *counts)
    }
}

/// One flattened row of the quantity table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityRow {
    pub identifier: SourceId,
    pub label: Label,
    pub record_coverage: u64,
    pub source_overlaps: u64,
    pub source_conflicts: u64,
}

/// Result of a quantity pass, one entry per non-empty noisy source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantityTable {
    pub sources: Vec<SourceQuantity>,
}

impl QuantityTable {
    /// Flatten into `(identifier, label, coverage, overlaps, conflicts)` rows
    pub fn rows(&self) -> Vec<QuantityRow> {
        self.sources
            .iter()
            .flat_map(|source| {
                source.labels.iter().map(|(label, counts)| QuantityRow {
                    identifier: source.identifier.clone(),
                    label: label.clone(),
                    record_coverage: counts.record_coverage,
                    source_overlaps: counts.source_overlaps,
                    source_conflicts: counts.source_conflicts,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.iter().map(|s| s.labels.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn source(&self, identifier: &str) -> Option<&SourceQuantity> {
        self.sources.iter().find(|s| s.identifier == identifier)
    }

    /// Format as a markdown report
    pub fn format_report(&self) -> String {
        let mut report = String::new();
        report.push_str("## Source Quantity\n\n");
        report.push_str("| Source | Label | Coverage | Overlaps | Conflicts |\n");
        report.push_str("|--------|-------|----------|----------|-----------|\n");
        for row in self.rows() {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                row.identifier,
                row.label,
                row.record_coverage,
                row.source_overlaps,
                row.source_conflicts
            ));
        }
        report.push('\n');
        report
    }
}

/// Labels per record across all noisy sources, tagged with the source position
type RecordVotes<'a> = HashMap<&'a str, Vec<(usize, &'a str)>>;

/// Compute quantity diagnostics for every non-empty noisy vector
pub fn compute_quantity(matrix: &NoisyLabelMatrix, config: &NlmConfig) -> QuantityTable {
    let vectors = matrix.vectors_noisy();

    let mut by_record: RecordVotes<'_> = HashMap::new();
    for (position, vector) in vectors.iter().enumerate() {
        for association in vector.distinct() {
            by_record
                .entry(association.record())
                .or_default()
                .push((position, association.label()));
        }
    }

    let measure = |(position, vector): (usize, &SourceVector)| {
        measure_source(position, vector, &by_record)
    };
    let sources: Vec<SourceQuantity> = if config.parallel {
        vectors
            .par_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_empty())
            .map(measure)
            .collect()
    } else {
        vectors
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_empty())
            .map(measure)
            .collect()
    };

    let table = QuantityTable { sources };
    info!(
        sources = table.sources.len(),
        rows = table.len(),
        records = by_record.len(),
        "Computed quantity metrics"
    );
    table
}

fn measure_source(
    position: usize,
    vector: &SourceVector,
    by_record: &RecordVotes<'_>,
) -> SourceQuantity {
    let mut labels: Vec<(Label, QuantityCounts)> = vector
        .labels()
        .into_iter()
        .map(|label| (label.to_string(), QuantityCounts::default()))
        .collect();
    let slots: HashMap<String, usize> = labels
        .iter()
        .enumerate()
        .map(|(idx, (label, _))| (label.clone(), idx))
        .collect();

    let distinct = vector.distinct();
    for association in &distinct {
        if let Some(&slot) = slots.get(association.label()) {
            labels[slot].1.record_coverage += 1;
        }
    }

    let first_labels = vector.first_labels();
    let mut visited = HashSet::new();
    let mut shared = 0usize;
    for association in &distinct {
        let record = association.record();
        if !visited.insert(record) {
            continue;
        }

        let mut others: Vec<&str> = Vec::new();
        for (other, label) in by_record.get(record).into_iter().flatten() {
            if *other != position && !others.contains(label) {
                others.push(*label);
            }
        }
        if others.is_empty() {
            continue;
        }
        shared += 1;

        let Some(own) = first_labels.get(record) else {
            continue;
        };
        let Some(&slot) = slots.get(*own) else {
            continue;
        };
        let counts = &mut labels[slot].1;
        if others.contains(own) {
            counts.source_overlaps += 1;
        }
        if others.len() > 1 || others[0] != *own {
            counts.source_conflicts += 1;
        }
    }

    debug!(
        source = vector.identifier(),
        labels = labels.len(),
        shared_records = shared,
        "Measured source against peers"
    );

    SourceQuantity {
        identifier: vector.identifier().to_string(),
        labels,
    }
}
