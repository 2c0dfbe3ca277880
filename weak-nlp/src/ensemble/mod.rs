//! Precision-weighted ensemble voting
//!
//! Turns the votes of many noisy sources into one label per record.
//!
//! # Workflow
//!
//! 1. Run the quality pass and index precision by `(source, label)`
//! 2. Every association of every non-empty noisy source casts a vote of
//!    `precision * confidence` for its label on its record
//! 3. Records nobody voted on are dropped; associations on records outside
//!    the matrix universe are ignored
//! 4. Each remaining record is reduced by [`VoteTally::decide`]: the leader
//!    needs a positive margin over the combined weight of all other labels,
//!    and its confidence is `sigmoid(margin)`
//!
//! ```ignore
//! let outcome = matrix.weakly_supervise()?;
//! for (record, label, confidence) in outcome.predictions() {
//!     println!("{record}: {label} ({confidence:.2})");
//! }
//! ```

pub mod voting;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::NlmConfig;
use crate::error::{NlmError, NlmResult};
use crate::matrix::NoisyLabelMatrix;
use crate::model::RecordId;
use crate::quality::{compute_quality, QualityTable};

pub use voting::{sigmoid, Decision, VoteTally};

/// Decision for one record that received at least one vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDecision {
    pub record: RecordId,
    pub decision: Decision,
    /// Leader's vote minus the rest
    pub margin: f64,
}

/// Result of a weak supervision pass, in record-universe order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnsembleOutcome {
    pub decisions: Vec<RecordDecision>,
}

impl EnsembleOutcome {
    /// Labelled records as `(record, label, confidence)`
    pub fn predictions(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.decisions.iter().filter_map(|d| match &d.decision {
            Decision::Label { label, confidence } => {
                Some((d.record.as_str(), label.as_str(), *confidence))
            }
            Decision::Abstain => None,
        })
    }

    /// Decision for one voted record, abstentions included; `None` when the
    /// record got no votes. Use [`predictions`](Self::predictions) for labels only.
    pub fn get(&self, record: &str) -> Option<&Decision> {
        self.decisions
            .iter()
            .find(|d| d.record == record)
            .map(|d| &d.decision)
    }

    /// Number of records that received votes, abstentions included
    pub fn voted(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Number of voted records left without a label
    pub fn abstentions(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.decision.is_abstain())
            .count()
    }

    /// Format as a markdown report
    pub fn format_report(&self) -> String {
        let mut report = String::new();
        report.push_str("## Weak Supervision\n\n");
        report.push_str(&format!(
            "- Voted records: {}\n- Labelled: {}\n- Abstained: {}\n\n",
            self.voted(),
            self.voted() - self.abstentions(),
            self.abstentions()
        ));
        report.push_str("| Record | Label | Confidence | Margin |\n");
        report.push_str("|--------|-------|------------|--------|\n");
        for d in &self.decisions {
            match &d.decision {
                Decision::Label { label, confidence } => report.push_str(&format!(
                    "| {} | {} | {:.3} | {:.3} |\n",
                    d.record, label, confidence, d.margin
                )),
                Decision::Abstain => report.push_str(&format!(
                    "| {} | - | - | {:.3} |\n",
                    d.record, d.margin
                )),
            }
        }
        report.push('\n');
        report
    }
}

/// Run the quality pass and vote with its precisions.
///
/// Fails with [`NlmError::InvalidConfig`] for a config that does not pass
/// [`NlmConfig::validate`], with [`NlmError::EmptyStatistics`] when the
/// quality table has no rows, and propagates [`NlmError::MissingReference`].
pub fn weakly_supervise(
    matrix: &NoisyLabelMatrix,
    config: &NlmConfig,
) -> NlmResult<EnsembleOutcome> {
    config.validate()?;
    let quality = compute_quality(matrix, config)?;
    supervise_with_quality(matrix, &quality, config)
}

/// Vote with precisions from an already computed quality table.
///
/// Every label a non-empty source emits must have a precision in `quality`;
/// a missing pair fails with [`NlmError::PrecisionLookup`].
pub fn supervise_with_quality(
    matrix: &NoisyLabelMatrix,
    quality: &QualityTable,
    config: &NlmConfig,
) -> NlmResult<EnsembleOutcome> {
    config.validate()?;
    if quality.is_empty() {
        return Err(NlmError::EmptyStatistics);
    }
    let precision = quality.precision_lookup();

    let index: HashMap<&str, usize> = matrix
        .records()
        .iter()
        .enumerate()
        .map(|(row, record)| (record.as_str(), row))
        .collect();
    let mut rows: Vec<Option<VoteTally>> = vec![None; index.len()];

    let mut outside = 0usize;
    let mut excluded = 0usize;
    for vector in matrix.vectors_noisy().iter().filter(|v| !v.is_empty()) {
        for association in vector.distinct() {
            let weight = precision
                .get(&(vector.identifier(), association.label()))
                .copied()
                .ok_or_else(|| NlmError::PrecisionLookup {
                    identifier: vector.identifier().to_string(),
                    label: association.label().to_string(),
                })?;
            let Some(confidence) = config.missing_confidence.resolve(association.confidence())
            else {
                excluded += 1;
                continue;
            };
            let Some(&row) = index.get(association.record()) else {
                outside += 1;
                continue;
            };
            rows[row]
                .get_or_insert_with(VoteTally::new)
                .add(association.label(), weight * confidence);
        }
    }
    if outside > 0 {
        debug!(associations = outside, "Ignored votes on records outside the universe");
    }
    if excluded > 0 {
        debug!(associations = excluded, "Excluded votes without confidence");
    }

    let decisions: Vec<RecordDecision> = matrix
        .records()
        .iter()
        .zip(rows)
        .filter_map(|(record, tally)| {
            let tally = tally?;
            let margin = tally.margin().unwrap_or(0.0);
            let decision = match tally.decide() {
                Decision::Label { confidence, .. } if confidence < config.min_confidence => {
                    Decision::Abstain
                }
                decision => decision,
            };
            Some(RecordDecision {
                record: record.clone(),
                decision,
                margin,
            })
        })
        .collect();

    let outcome = EnsembleOutcome { decisions };
    info!(
        records = matrix.records().len(),
        voted = outcome.voted(),
        abstained = outcome.abstentions(),
        "Weak supervision complete"
    );
    Ok(outcome)
}
