//! Shared helpers for integration tests.

#![allow(dead_code)]

use weak_nlp::{Association, NoisyLabelMatrix, SourceVector};

/// Install a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Association with an explicit confidence
pub fn vote(record: &str, label: &str, confidence: f64) -> Association {
    Association::with_confidence(record, label, confidence).unwrap()
}

/// Noisy source built from `(record, label)` pairs without confidences
pub fn source(identifier: &str, pairs: &[(&str, &str)]) -> SourceVector {
    SourceVector::new(
        identifier,
        pairs
            .iter()
            .map(|(record, label)| Association::new(*record, *label))
            .collect(),
    )
}

/// Reference vector built from `(record, label)` pairs
pub fn reference(pairs: &[(&str, &str)]) -> SourceVector {
    SourceVector::reference(
        "reference",
        pairs
            .iter()
            .map(|(record, label)| Association::new(*record, *label))
            .collect(),
    )
}

/// Load a matrix fixture from `tests/fixtures`
pub fn load_fixture(name: &str) -> NoisyLabelMatrix {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("Invalid fixture {}: {}", name, e))
}
