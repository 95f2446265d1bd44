//! CLI command tests
//!
//! Commands run against a dataset file in a temporary directory and their
//! rendered output is parsed back.

#![cfg(feature = "cli")]

use phenoportal::cli::compare::{self, CompareConfig, CompareTarget};
use phenoportal::cli::comparison_filter::{self, ToggleConfig};
use phenoportal::cli::dataset::Session;
use phenoportal::cli::filter::{self, FilterConfig, ValuesConfig};
use phenoportal::cli::output::{self, OutputFormat};
use phenoportal::engine::{EngineOptions, FilterChange};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const DATASET: &str = r#"{
  "participants": 4,
  "fields": [
    { "id": 31, "type": "Bars", "valueType": "Categorical single", "values": { "0": "Male", "1": "Female" } },
    { "id": 21001, "type": "Histogram", "valueType": "Continuous", "bucket300": true }
  ],
  "values": {
    "31": [
      { "participantId": "p1", "instance": "0", "value": "0" },
      { "participantId": "p2", "instance": "0", "value": "1" },
      { "participantId": "p3", "instance": "0", "value": "1" }
    ],
    "21001": [
      { "participantId": "p1", "instance": "0", "value": 20.0 },
      { "participantId": "p2", "instance": "0", "value": 30.0 }
    ]
  },
  "tiers": [
    { "participantId": "p1", "fullLocation": "1:1000:A:G", "markerId": "m1", "tier": "TIER1", "genotype": "het", "acmgVerdict": "Pathogenic" },
    { "participantId": "p2", "fullLocation": "1:1000:A:G", "markerId": "m1", "tier": "TIER2", "genotype": "hom", "acmgVerdict": "Pathogenic" }
  ],
  "workgroupPatients": [ { "id": "wp1", "workgroupId": "wg1", "patientId": "p1" } ]
}"#;

fn dataset_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.json");
    fs::write(&path, DATASET).unwrap();
    (dir, path)
}

fn session() -> (TempDir, Session) {
    let (dir, path) = dataset_file();
    let session = Session::open(&path, EngineOptions::default()).unwrap();
    (dir, session)
}

#[tokio::test]
async fn test_filter_renders_labelled_rows() {
    let (_dir, session) = session();
    let config = FilterConfig {
        field: "31".to_string(),
        ..Default::default()
    };
    let rendered = filter::run_filter(&session, &config, OutputFormat::Json).await.unwrap();
    let rows: Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(
        rows,
        json!([
            { "key": 0, "count": 1, "total": 3, "label": "Male" },
            { "key": 1, "count": 2, "total": 3, "label": "Female" }
        ])
    );
}

#[tokio::test]
async fn test_filter_table_output() {
    let (_dir, session) = session();
    let config = FilterConfig {
        field: "31".to_string(),
        participants: Some(vec!["p2".to_string()]),
        ..Default::default()
    };
    let rendered = filter::run_filter(&session, &config, OutputFormat::Table).await.unwrap();
    assert!(rendered.contains("Female"));
    assert!(!rendered.contains("Male"));
}

#[tokio::test]
async fn test_blank_population_restricts_to_nobody() {
    let (_dir, session) = session();
    let config = FilterConfig {
        field: "31".to_string(),
        participants: filter::population_arg(Some(vec![String::new()]), false),
        ..Default::default()
    };
    let rendered = filter::run_filter(&session, &config, OutputFormat::Json).await.unwrap();
    assert_eq!(rendered, "[]");
}

#[rstest]
#[case(Some("p2"), 1)]
#[case(None, 3)]
#[tokio::test]
async fn test_values_lists_stored_rows(#[case] participant: Option<&str>, #[case] expected: usize) {
    let (_dir, session) = session();
    let config = ValuesConfig {
        field: "31".to_string(),
        instance: Some("0".to_string()),
        participant: participant.map(str::to_string),
    };
    let rendered = filter::run_values(&session, &config, OutputFormat::Json).await.unwrap();
    let rows: Vec<Value> = serde_json::from_str(&rendered).unwrap();
    assert_eq!(rows.len(), expected);
}

#[tokio::test]
async fn test_compare_variant_and_graph() {
    let (_dir, session) = session();
    let config = CompareConfig {
        field: "31".to_string(),
        target: CompareTarget::Variant("1:1000:A:G".to_string()),
        exclude: None,
    };
    let rendered = compare::run_compare(&session, &config, OutputFormat::Json).await.unwrap();
    let result: Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(result["total"], json!(2));
    assert_eq!(result["existingValues"], json!({ "Male": 1, "Female": 1 }));

    let graph = compare::run_variant_graph(&session, "1:1000:A:G", Some("p1"), OutputFormat::Table)
        .await
        .unwrap();
    assert!(graph.contains("hom"));
    assert!(!graph.contains("het"));
}

#[tokio::test]
async fn test_saved_filter_survives_reload() {
    let (_dir, path) = dataset_file();
    let mut session = Session::open(&path, EngineOptions::default()).unwrap();
    let config = ToggleConfig {
        field: "31".to_string(),
        patient: "wp1".to_string(),
        change: FilterChange::Add,
        save: true,
    };
    comparison_filter::run_toggle(&mut session, &config, OutputFormat::Json)
        .await
        .unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["workgroupPatients"][0]["comparisonFilters"], json!(["31"]));

    let reloaded = Session::open(&path, EngineOptions::default()).unwrap();
    let patient = reloaded
        .engine()
        .remove_comparison_filter(&"31".into(), "wp1")
        .await
        .unwrap();
    assert!(patient.comparison_filters.is_empty());
}

#[tokio::test]
async fn test_unsaved_filter_leaves_file_untouched() {
    let (_dir, path) = dataset_file();
    let mut session = Session::open(&path, EngineOptions::default()).unwrap();
    let config = ToggleConfig {
        field: "31".to_string(),
        patient: "wp1".to_string(),
        change: FilterChange::Add,
        save: false,
    };
    comparison_filter::run_toggle(&mut session, &config, OutputFormat::Json)
        .await
        .unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), DATASET);
}

#[tokio::test]
async fn test_engine_errors_render_with_code() {
    output::setup_colors("never");
    let (_dir, session) = session();
    let config = FilterConfig {
        field: "9999".to_string(),
        ..Default::default()
    };
    let err = filter::run_filter(&session, &config, OutputFormat::Json)
        .await
        .unwrap_err();
    let message = output::format_error(&err);
    assert!(message.contains("PP0100"));
    assert!(message.contains("9999"));
}

#[test]
fn test_missing_dataset_names_the_file() {
    output::setup_colors("never");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = Session::open(&path, EngineOptions::default()).err().unwrap();
    let message = output::format_error(&err);
    assert!(message.contains("Failed to read dataset file"));
    assert!(message.contains("absent.json"));
}
