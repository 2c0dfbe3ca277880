//! End-to-end run over a small clickbait labelling task
//!
//! Three heuristics and one disabled source label seven headlines; a manual
//! reference covers three of them. Expected values are worked out by hand.

mod common;

use common::{init_tracing, load_fixture};
use weak_nlp::{sigmoid, NlmConfig, NlmEngine, QuantityCounts};

const EPS: f64 = 1e-9;

#[test]
fn test_fixture_loads() {
    let matrix = load_fixture("clickbait.json");
    assert_eq!(matrix.vectors_noisy().len(), 4);
    assert_eq!(matrix.records().len(), 7);
    assert_eq!(matrix.vector_reference().unwrap().identifier(), "manual");
    assert!(matrix.vector("lf_disabled").unwrap().is_empty());
}

#[test]
fn test_quality_table() {
    init_tracing();
    let table = load_fixture("clickbait.json").compute_quality().unwrap();

    assert_eq!(table.len(), 5);
    assert!(table.source("lf_disabled").is_none());

    let question = table.source("lf_question").unwrap().counts("clickbait").unwrap();
    assert_eq!((question.true_positives, question.false_positives), (2, 1));
    assert!((table.precision("lf_question", "clickbait").unwrap() - 2.0 / 3.0).abs() < EPS);

    assert_eq!(table.precision("lf_length", "clickbait"), Some(1.0));
    assert_eq!(table.precision("lf_length", "regular"), Some(1.0));
    assert_eq!(table.precision("lf_model", "clickbait"), Some(1.0));
    assert_eq!(table.precision("lf_model", "regular"), Some(0.5));
}

#[test]
fn test_quantity_table() {
    init_tracing();
    let table = load_fixture("clickbait.json").compute_quantity();

    let counts = |source: &str, label: &str| table.source(source).unwrap().counts(label).unwrap();
    let expect = |coverage, overlaps, conflicts| QuantityCounts {
        record_coverage: coverage,
        source_overlaps: overlaps,
        source_conflicts: conflicts,
    };

    assert_eq!(counts("lf_question", "clickbait"), expect(5, 2, 3));
    assert_eq!(counts("lf_length", "clickbait"), expect(1, 1, 0));
    assert_eq!(counts("lf_length", "regular"), expect(3, 1, 2));
    assert_eq!(counts("lf_model", "clickbait"), expect(2, 2, 0));
    assert_eq!(counts("lf_model", "regular"), expect(2, 1, 2));
    assert!(table.source("lf_disabled").is_none());
}

#[test]
fn test_weak_supervision() {
    init_tracing();
    let outcome = load_fixture("clickbait.json").weakly_supervise().unwrap();

    // c8 is in the universe but nobody voted on it
    assert_eq!(outcome.voted(), 6);
    assert!(outcome.get("c8").is_none());
    assert_eq!(outcome.abstentions(), 0);

    let q = 2.0 / 3.0;
    let expected = [
        ("c1", "clickbait", q + 1.0 + 0.9),
        ("c2", "regular", 1.0 + 0.4 - q),
        ("c3", "clickbait", q - 0.3),
        ("c4", "regular", 1.0 - q),
        ("c5", "clickbait", q + 0.7),
        ("c6", "regular", 1.0),
    ];
    let predictions: Vec<_> = outcome.predictions().collect();
    assert_eq!(predictions.len(), expected.len());
    for ((record, label, confidence), (want_record, want_label, margin)) in
        predictions.iter().zip(expected)
    {
        assert_eq!(*record, want_record);
        assert_eq!(*label, want_label, "label for {}", record);
        assert!(
            (confidence - sigmoid(margin)).abs() < EPS,
            "confidence for {}: {} vs {}",
            record,
            confidence,
            sigmoid(margin)
        );
    }
}

#[test]
fn test_parallel_engine_agrees() {
    let matrix = load_fixture("clickbait.json");
    let sequential = NlmEngine::new();
    let parallel = NlmEngine::with_config(NlmConfig::default().with_parallel(true));

    assert_eq!(
        sequential.compute_quality(&matrix).unwrap(),
        parallel.compute_quality(&matrix).unwrap()
    );
    assert_eq!(
        sequential.compute_quantity(&matrix),
        parallel.compute_quantity(&matrix)
    );
    assert_eq!(
        sequential.weakly_supervise(&matrix).unwrap(),
        parallel.weakly_supervise(&matrix).unwrap()
    );
}

#[test]
fn test_reports_render() {
    let matrix = load_fixture("clickbait.json");
    let quality = matrix.compute_quality().unwrap().format_report();
    assert!(quality.contains("| lf_model | regular | 1 | 1 | 0.500 |"));

    let quantity = matrix.compute_quantity().format_report();
    assert!(quantity.contains("| lf_question | clickbait | 5 | 2 | 3 |"));

    let ensemble = matrix.weakly_supervise().unwrap().format_report();
    assert!(ensemble.contains("- Voted records: 6"));
}
