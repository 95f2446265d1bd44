//! Dataset loading tests
//!
//! A serialized dataset populates every in-memory store, and pipelines run
//! against the loaded collections the same way they run against a database.

use phenoportal_model::memory::Dataset;
use phenoportal_model::{
    AggregateRow, FieldDefinitionStore, FieldId, FieldType, FieldValueStore, Filter, MarkerStore,
    ParticipantCounter, Pipeline, TaxonomyStore, TierCollection, TierStore, ValueType,
    WorkgroupPatientStore, tier_paths, value_paths,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const DATASET: &str = r#"{
  "fields": [
    { "id": 31, "type": "Bars", "valueType": "Categorical single", "values": { "0": "Male", "1": "Female" } },
    { "id": "21001", "type": "Histogram", "valueType": "Continuous", "bucket300": true }
  ],
  "values": {
    "31": [
      { "participantId": "p1", "instance": "0", "value": "0" },
      { "participantId": "p2", "instance": "0", "value": "1" },
      { "participantId": "p2", "instance": "1", "value": "1" }
    ],
    "21001": [
      { "participantId": "p1", "instance": "0", "value": 22.5 },
      { "participantId": "p3", "instance": "0", "value": 31.0 }
    ]
  },
  "taxonomies": {
    "icd10": [ { "coding": "A", "meaning": "Chapter A", "children": [ { "coding": "A1", "meaning": "Block A1" } ] } ]
  },
  "tiers": [
    { "participantId": "p1", "fullLocation": "1:1000:A:G", "markerId": "m1", "tier": "TIER1" },
    { "participantId": "p2", "fullLocation": "1:1000:A:G", "markerId": "m1", "tier": "TIER2" }
  ],
  "locations": [ { "id": "L1", "gene": "BRCA1" } ],
  "markers": [ { "id": "m1", "locationId": "L1", "gene": "BRCA1", "fullLocation": "1:1000:A:G" } ],
  "workgroupPatients": [ { "id": "wp1", "workgroupId": "wg1", "patientId": "p1" } ]
}"#;

#[tokio::test]
async fn test_fields_load_with_numeric_and_string_ids() {
    let stores = Dataset::from_json(DATASET).unwrap().into_stores();

    let sex = stores.fields.find_by_id(&FieldId::from(31u64)).await.unwrap().unwrap();
    assert_eq!(sex.field_type, FieldType::Bars);
    assert_eq!(sex.value_type, ValueType::CategoricalSingle);
    assert_eq!(sex.find_label("1"), "Female");

    let bmi = stores.fields.find_by_id(&FieldId::from("21001")).await.unwrap().unwrap();
    assert!(bmi.has_bucket_flag());
}

#[tokio::test]
async fn test_participant_universe_is_derived_from_values() {
    let stores = Dataset::from_json(DATASET).unwrap().into_stores();
    assert_eq!(stores.participants.estimated_count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_value_queries_and_aggregates() {
    let stores = Dataset::from_json(DATASET).unwrap().into_stores();
    let sex = FieldId::from("31");

    let rows = stores
        .fields
        .query(&sex, &Filter::eq(value_paths::INSTANCE, "1"))
        .await
        .unwrap();
    assert_eq!(rows, vec![json!({"participantId": "p2", "instance": "1", "value": "1"})]);

    let pipeline = Pipeline::new()
        .matching(Filter::eq(value_paths::INSTANCE, "0"))
        .group_by(value_paths::VALUE);
    let grouped = stores.fields.aggregate(&sex, &pipeline).await.unwrap();
    assert_eq!(grouped, vec![AggregateRow::new("0", 1), AggregateRow::new("1", 1)]);
}

#[tokio::test]
async fn test_genomic_and_workgroup_collections() {
    let stores = Dataset::from_json(DATASET).unwrap().into_stores();

    let tree = stores.taxonomies.find_tree_by_coding("icd10").await.unwrap();
    assert_eq!(tree[0].children[0].coding, "A1");
    assert!(tree[0].selectable);

    let locations = stores.markers.find_locations_by_gene("BRCA1").await.unwrap();
    let markers = stores
        .markers
        .find_markers_by_locations(&[locations[0].id.clone()])
        .await
        .unwrap();
    assert_eq!(markers[0].full_location, "1:1000:A:G");

    let pipeline = Pipeline::new().group_by(tier_paths::TIER);
    let own = stores
        .tiers
        .aggregate(&TierCollection::Participant("p2".to_string()), &pipeline)
        .await
        .unwrap();
    assert_eq!(own, vec![AggregateRow::new("TIER2", 1)]);

    let patient = stores.workgroup_patients.find_by_id("wp1").await.unwrap().unwrap();
    assert!(patient.comparison_filters.is_empty());
}
