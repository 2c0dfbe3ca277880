//! Engine configuration
//!
//! Loaded from TOML or built in code. Every field has a default, so an empty
//! file is a valid configuration:
//!
//! ```toml
//! missing_confidence = "neutral"   # or "exclude"
//! reference_policy = "cross_product"   # or "any_match", "reject"
//! parallel = false
//! min_confidence = 0.5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{NlmError, NlmResult};

/// How an association without a confidence takes part in voting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingConfidence {
    /// Counts with weight 1.0
    #[default]
    Neutral,
    /// Casts no vote
    Exclude,
}

impl MissingConfidence {
    /// Resolve an optional confidence to a vote weight, or `None` to skip the vote
    pub fn resolve(self, confidence: Option<f64>) -> Option<f64> {
        match (confidence, self) {
            (Some(value), _) => Some(value),
            (None, Self::Neutral) => Some(1.0),
            (None, Self::Exclude) => None,
        }
    }
}

/// How quality scoring treats a record the reference labels more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Score every reference/noisy pair separately, like an inner join
    #[default]
    CrossProduct,
    /// One count per noisy association; true positive if any reference label matches
    AnyMatch,
    /// Fail with `AmbiguousReference`
    Reject,
}

/// Configuration shared by the quality, quantity and ensemble engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NlmConfig {
    pub missing_confidence: MissingConfidence,
    pub reference_policy: ReferencePolicy,
    /// Compute per-source diagnostics on the rayon pool
    pub parallel: bool,
    /// Decisions whose confidence falls below this are reported as abstentions
    pub min_confidence: f64,
}

impl Default for NlmConfig {
    fn default() -> Self {
        Self {
            missing_confidence: MissingConfidence::Neutral,
            reference_policy: ReferencePolicy::CrossProduct,
            parallel: false,
            min_confidence: 0.5,
        }
    }
}

impl NlmConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> NlmResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> NlmResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| NlmError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject settings the ensemble cannot honour
    pub fn validate(&self) -> NlmResult<()> {
        // Emitted confidences live in (0.5, 1); a floor outside [0.5, 1) is
        // either a no-op or rejects everything.
        if !(0.5..1.0).contains(&self.min_confidence) {
            return Err(NlmError::InvalidConfig(format!(
                "min_confidence must be in [0.5, 1), got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }

    pub fn with_missing_confidence(mut self, policy: MissingConfidence) -> Self {
        self.missing_confidence = policy;
        self
    }

    pub fn with_reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}
