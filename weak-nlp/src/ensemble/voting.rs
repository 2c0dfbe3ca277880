//! Weighted vote tally for a single record
//!
//! Votes accumulate per label in first-seen order. The leader is the label
//! with the largest total; among equal totals the first-seen label leads.
//! Any tie at the top leaves a margin of at most zero, so the tie-break only
//! affects [`VoteTally::leader`], never an emitted label.

use serde::{Deserialize, Serialize};

use crate::model::Label;

/// Outcome for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// A label won a strict weighted majority
    Label { label: Label, confidence: f64 },
    /// No label beat the combined weight of its challengers
    Abstain,
}

impl Decision {
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Label { label, .. } => Some(label.as_str()),
            Self::Abstain => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Self::Label { confidence, .. } => Some(*confidence),
            Self::Abstain => None,
        }
    }

    pub fn is_abstain(&self) -> bool {
        matches!(self, Self::Abstain)
    }
}

/// Logistic function with slope 1 centred at 0
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Accumulated weighted votes per label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    votes: Vec<(Label, f64)>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to `label`
    pub fn add(&mut self, label: &str, weight: f64) {
        match self.votes.iter_mut().find(|(l, _)| l == label) {
            Some((_, total)) => *total += weight,
            None => self.votes.push((label.to_string(), weight)),
        }
    }

    /// Sum of all votes
    pub fn total(&self) -> f64 {
        self.votes.iter().map(|(_, w)| w).sum()
    }

    /// Accumulated vote for one label
    pub fn get(&self, label: &str) -> Option<f64> {
        self.votes.iter().find(|(l, _)| l == label).map(|(_, w)| *w)
    }

    /// Labels and their totals in first-seen order
    pub fn votes(&self) -> &[(Label, f64)] {
        &self.votes
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Label with the largest total; the first-seen one among equals
    pub fn leader(&self) -> Option<(&str, f64)> {
        let mut leader: Option<(&str, f64)> = None;
        for (label, weight) in &self.votes {
            match leader {
                Some((_, best)) if *weight <= best => {}
                _ => leader = Some((label.as_str(), *weight)),
            }
        }
        leader
    }

    /// Leader's vote minus the sum of every other label's vote
    pub fn margin(&self) -> Option<f64> {
        let (_, lead) = self.leader()?;
        Some(lead - (self.total() - lead))
    }

    /// Reduce the tally to a decision.
    ///
    /// A positive margin yields the leader with confidence `sigmoid(margin)`.
    /// Margins so small that the confidence rounds to 0.5 count as ties.
    pub fn decide(&self) -> Decision {
        let (Some((label, _)), Some(margin)) = (self.leader(), self.margin()) else {
            return Decision::Abstain;
        };
        if margin <= 0.0 {
            return Decision::Abstain;
        }
        let confidence = sigmoid(margin);
        if confidence <= 0.5 {
            return Decision::Abstain;
        }
        Decision::Label {
            label: label.to_string(),
            confidence,
        }
    }
}
