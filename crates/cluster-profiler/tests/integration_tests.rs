//! Integration tests for the cluster profiling pipeline.
//!
//! These tests run the whole pipeline against CSV fixtures.

use cluster_profiler::{
    ClusterProfiler, ClusterSummary, LabelRules, ProfilerConfig, ProfilerError, UNLABELED, io,
    summary,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn profile_fixture(filename: &str) -> Vec<ClusterSummary> {
    let df = io::read_csv(fixtures_path().join(filename)).expect("Failed to read CSV file");
    ClusterProfiler::builder()
        .build()
        .unwrap()
        .profile(&df)
        .expect("Profiling should succeed")
        .summaries
}

fn find(summaries: &[ClusterSummary], cluster: i64) -> &ClusterSummary {
    summaries
        .iter()
        .find(|s| s.cluster == cluster)
        .unwrap_or_else(|| panic!("cluster {} missing", cluster))
}

fn decimals_at_most(value: f64, decimals: i32) -> bool {
    let factor = 10f64.powi(decimals);
    ((value * factor).round() / factor - value).abs() < 1e-12
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_dataset_labels() {
    let summaries = profile_fixture("donors.csv");

    let labels: Vec<(i64, &str)> = summaries
        .iter()
        .map(|s| (s.cluster, s.label.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            (0, "Young First-Time Donors Prefer Sms"),
            (1, "Older Frequent Donors Prefer Email"),
            (2, UNLABELED),
        ]
    );
}

#[test]
fn test_full_dataset_statistics() {
    let summaries = profile_fixture("donors.csv");

    let young = find(&summaries, 0);
    assert_eq!(young.size, 3);
    assert_eq!(young.conversion_rate, 0.667);
    assert_eq!(young.channel_preferences.get("sms"), Some(&0.8));
    assert_eq!(young.channel_preferences.get("email"), Some(&0.13));
    assert_eq!(young.channel_preferences.get("phone"), Some(&0.03));
    assert_eq!(young.channel_preferences.get("whatsapp"), Some(&0.0));

    let older = find(&summaries, 1);
    assert_eq!(older.size, 4);
    assert_eq!(older.conversion_rate, 0.75);
    assert_eq!(older.channel_preferences.get("email"), Some(&0.85));

    // Single member whose missing phone score defaults to 0
    let single = find(&summaries, 2);
    assert_eq!(single.size, 1);
    assert_eq!(single.conversion_rate, 1.0);
    assert_eq!(single.channel_preferences.get("phone"), Some(&0.0));
    assert_eq!(single.channel_preferences.get("whatsapp"), Some(&0.9));
}

#[test]
fn test_sizes_cover_every_record() {
    for fixture in ["donors.csv", "no_converted.csv", "minimal.csv", "ties.csv"] {
        let df = io::read_csv(fixtures_path().join(fixture)).unwrap();
        let summaries = ClusterProfiler::default().profile(&df).unwrap().summaries;

        let total: usize = summaries.iter().map(|s| s.size).sum();
        assert_eq!(total, df.height(), "sizes of {}", fixture);

        let mut clusters: Vec<i64> = summaries.iter().map(|s| s.cluster).collect();
        let ordered = clusters.clone();
        clusters.sort_unstable();
        clusters.dedup();
        assert_eq!(clusters, ordered, "clusters of {} are unique and ascending", fixture);
    }
}

#[test]
fn test_rounding_and_ranges() {
    let summaries = profile_fixture("donors.csv");

    for summary in &summaries {
        assert!((0.0..=1.0).contains(&summary.conversion_rate));
        assert!(decimals_at_most(summary.conversion_rate, 3));
        for value in summary.channel_preferences.values() {
            assert!(decimals_at_most(*value, 2));
        }
    }
}

#[test]
fn test_exact_halves_round_to_even() {
    let summaries = profile_fixture("ties.csv");
    let cluster = find(&summaries, 0);

    // 1 of 16 converted, 2 of 16 engaged by sms
    assert_eq!(cluster.size, 16);
    assert_eq!(cluster.conversion_rate, 0.062);
    assert_eq!(cluster.channel_preferences.get("sms"), Some(&0.12));
    assert_eq!(cluster.label, "Prefer Sms");
}

#[test]
fn test_preferences_keep_column_order() {
    let summaries = profile_fixture("donors.csv");

    for summary in &summaries {
        assert_eq!(
            summary.channel_preferences.keys().collect::<Vec<_>>(),
            vec!["sms", "email", "phone", "whatsapp"]
        );
    }
}

// ============================================================================
// Schema Defaulting Tests
// ============================================================================

#[test]
fn test_converted_synthesized_from_donations() {
    let summaries = profile_fixture("no_converted.csv");

    let first = find(&summaries, 0);
    assert_eq!(first.conversion_rate, 0.667);
    assert_eq!(first.size, 3);
    assert_eq!(first.label, "First-Time Donors");

    let second = find(&summaries, 1);
    assert_eq!(second.conversion_rate, 1.0);
    assert_eq!(second.label, "Young Frequent Donors");
}

#[test]
fn test_only_cluster_column() {
    let summaries = profile_fixture("minimal.csv");

    assert_eq!(summaries.len(), 2);
    for summary in &summaries {
        assert_eq!(summary.label, UNLABELED);
        assert_eq!(summary.conversion_rate, 0.0);
        assert_eq!(
            summary.channel_preferences.keys().collect::<Vec<_>>(),
            vec!["sms", "email", "phone"]
        );
    }
    assert_eq!(find(&summaries, 0).size, 1);
    assert_eq!(find(&summaries, 1).size, 2);
}

#[test]
fn test_missing_cluster_column_is_schema_error() {
    let df = io::read_csv(fixtures_path().join("missing_cluster.csv")).unwrap();
    let err = ClusterProfiler::default().profile(&df).unwrap_err();

    assert!(matches!(err, ProfilerError::MissingColumn(ref c) if c == "cluster_label"));
    assert_eq!(err.error_code(), "SCHEMA_ERROR");
}

// ============================================================================
// Output Tests
// ============================================================================

#[test]
fn test_output_is_idempotent() {
    let df = io::read_csv(fixtures_path().join("donors.csv")).unwrap();
    let profiler = ClusterProfiler::default();

    let first = summary::to_json(&profiler.profile(&df).unwrap().summaries).unwrap();
    let second = summary::to_json(&profiler.profile(&df).unwrap().summaries).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_write_and_read_back() {
    let summaries = profile_fixture("donors.csv");
    let path = std::env::temp_dir()
        .join(format!("cluster-profiler-it-{}", std::process::id()))
        .join("donor_clusters_labeled.json");

    io::write_summaries(&path, &summaries).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let records = value.as_array().expect("top-level array");
    assert_eq!(records.len(), 3);

    let keys: Vec<&str> = records[0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    for field in ["cluster", "label", "size", "conversion_rate", "channel_preferences"] {
        assert!(keys.contains(&field), "missing field {}", field);
    }

    let parsed: Vec<ClusterSummary> = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed, summaries);
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_custom_label_rules() {
    let df = io::read_csv(fixtures_path().join("donors.csv")).unwrap();
    let config = ProfilerConfig::builder()
        .label_rules(LabelRules {
            older_above: 70.0,
            ..LabelRules::default()
        })
        .build()
        .unwrap();

    let summaries = ClusterProfiler::builder()
        .config(config)
        .build()
        .unwrap()
        .profile(&df)
        .unwrap()
        .summaries;

    assert_eq!(find(&summaries, 1).label, "Frequent Donors Prefer Email");
}

#[test]
fn test_renamed_cluster_column() {
    let df = io::read_csv(fixtures_path().join("minimal.csv")).unwrap();
    let config = ProfilerConfig::builder()
        .cluster_column("segment")
        .build()
        .unwrap();

    let err = ClusterProfiler::builder()
        .config(config)
        .build()
        .unwrap()
        .profile(&df)
        .unwrap_err();
    assert!(matches!(err, ProfilerError::MissingColumn(ref c) if c == "segment"));
}
