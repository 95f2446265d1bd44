//! In-memory store implementations

use super::eval::{CompiledFilter, into_rows, run_pipeline};
use crate::field::{FieldDefinition, FieldId};
use crate::genomics::{GenomicLocation, Marker, TierCollection, TierRow};
use crate::pipeline::{Filter, Pipeline, lookup, value_paths};
use crate::provider::{
    FieldDefinitionStore, FieldValueStore, MarkerStore, MedicalTerm, MedicalTermStore,
    ParticipantCounter, StoreError, TaxonomyStore, TierStore, WorkgroupPatientStore,
};
use crate::result::{AggregateRow, RawTreeNode};
use crate::workgroup::WorkgroupPatient;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Build a per-field value row document
pub fn value_row(participant_id: &str, instance: &str, value: impl Into<Value>) -> Value {
    json!({
        "participantId": participant_id,
        "instance": instance,
        "value": value.into(),
    })
}

/// Field definitions together with their value collections
#[derive(Clone, Default)]
pub struct InMemoryFieldStore {
    definitions: Arc<RwLock<IndexMap<FieldId, FieldDefinition>>>,
    values: Arc<RwLock<HashMap<FieldId, Vec<Value>>>>,
}

impl InMemoryFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_field(&self, field: FieldDefinition) {
        self.definitions.write().insert(field.id.clone(), field);
    }

    /// Append value rows (see [`value_row`]) to a field's collection
    pub fn insert_values(&self, field_id: &FieldId, rows: impl IntoIterator<Item = Value>) {
        self.values
            .write()
            .entry(field_id.clone())
            .or_default()
            .extend(rows);
    }

    /// Distinct participant ids across every value collection
    pub fn participant_count(&self) -> u64 {
        let values = self.values.read();
        let ids: HashSet<&str> = values
            .values()
            .flatten()
            .filter_map(|row| lookup(row, value_paths::PARTICIPANT_ID).and_then(Value::as_str))
            .collect();
        ids.len() as u64
    }

    fn rows(&self, field_id: &FieldId) -> Vec<Value> {
        self.values.read().get(field_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl FieldDefinitionStore for InMemoryFieldStore {
    async fn find_by_id(&self, id: &FieldId) -> Result<Option<FieldDefinition>, StoreError> {
        Ok(self.definitions.read().get(id).cloned())
    }

    /// Keys of the value-label map when the field declares one, otherwise the
    /// distinct observed values in first-seen order
    async fn find_distinct_values(&self, id: &FieldId) -> Result<Vec<Value>, StoreError> {
        if let Some(labels) = self
            .definitions
            .read()
            .get(id)
            .and_then(|field| field.values.as_ref())
        {
            return Ok(labels.keys().map(|k| Value::String(k.clone())).collect());
        }

        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        for row in self.rows(id) {
            let values = match lookup(&row, value_paths::VALUE) {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::Null) | None => continue,
                Some(v) => vec![v.clone()],
            };
            for value in values {
                if seen.insert(value.to_string()) {
                    distinct.push(value);
                }
            }
        }
        Ok(distinct)
    }
}

#[async_trait]
impl FieldValueStore for InMemoryFieldStore {
    async fn query(&self, field_id: &FieldId, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let compiled = CompiledFilter::compile(filter)?;
        Ok(self
            .rows(field_id)
            .into_iter()
            .filter(|row| compiled.matches(row))
            .collect())
    }

    async fn aggregate(
        &self,
        field_id: &FieldId,
        pipeline: &Pipeline,
    ) -> Result<Vec<AggregateRow>, StoreError> {
        into_rows(run_pipeline(self.rows(field_id), pipeline)?)
    }
}

/// Taxonomy trees keyed by coding
#[derive(Clone, Default)]
pub struct InMemoryTaxonomyStore {
    trees: Arc<RwLock<HashMap<String, Vec<RawTreeNode>>>>,
}

impl InMemoryTaxonomyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tree(&self, coding: impl Into<String>, roots: Vec<RawTreeNode>) {
        self.trees.write().insert(coding.into(), roots);
    }
}

#[async_trait]
impl TaxonomyStore for InMemoryTaxonomyStore {
    async fn find_tree_by_coding(&self, coding: &str) -> Result<Vec<RawTreeNode>, StoreError> {
        Ok(self.trees.read().get(coding).cloned().unwrap_or_default())
    }
}

/// Tier rows; per-participant collections are the shared rows of that participant
#[derive(Clone, Default)]
pub struct InMemoryTierStore {
    rows: Arc<RwLock<Vec<TierRow>>>,
}

impl InMemoryTierStore {
    pub fn new(rows: Vec<TierRow>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    pub fn insert(&self, row: TierRow) {
        self.rows.write().push(row);
    }

    fn documents(&self, collection: &TierCollection) -> Result<Vec<Value>, StoreError> {
        self.rows
            .read()
            .iter()
            .filter(|row| match collection {
                TierCollection::Shared => true,
                TierCollection::Participant(id) => &row.participant_id == id,
            })
            .map(|row| serde_json::to_value(row).map_err(|e| StoreError::Internal(e.to_string())))
            .collect()
    }
}

#[async_trait]
impl TierStore for InMemoryTierStore {
    async fn find_by_location(&self, location: &str) -> Result<Vec<TierRow>, StoreError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|row| row.full_location == location)
            .cloned()
            .collect())
    }

    async fn aggregate(
        &self,
        collection: &TierCollection,
        pipeline: &Pipeline,
    ) -> Result<Vec<AggregateRow>, StoreError> {
        into_rows(run_pipeline(self.documents(collection)?, pipeline)?)
    }
}

/// Genomic locations and markers
#[derive(Clone, Default)]
pub struct InMemoryMarkerStore {
    locations: Arc<RwLock<Vec<GenomicLocation>>>,
    markers: Arc<RwLock<Vec<Marker>>>,
}

impl InMemoryMarkerStore {
    pub fn new(locations: Vec<GenomicLocation>, markers: Vec<Marker>) -> Self {
        Self {
            locations: Arc::new(RwLock::new(locations)),
            markers: Arc::new(RwLock::new(markers)),
        }
    }
}

#[async_trait]
impl MarkerStore for InMemoryMarkerStore {
    async fn find_locations_by_gene(&self, gene: &str) -> Result<Vec<GenomicLocation>, StoreError> {
        Ok(self
            .locations
            .read()
            .iter()
            .filter(|location| location.gene == gene)
            .cloned()
            .collect())
    }

    async fn find_markers_by_locations(&self, location_ids: &[String]) -> Result<Vec<Marker>, StoreError> {
        Ok(self
            .markers
            .read()
            .iter()
            .filter(|marker| location_ids.contains(&marker.location_id))
            .cloned()
            .collect())
    }
}

/// Medical terms per field
#[derive(Clone, Default)]
pub struct InMemoryMedicalTermStore {
    terms: Arc<RwLock<HashMap<FieldId, Vec<MedicalTerm>>>>,
}

impl InMemoryMedicalTermStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_terms(&self, field_id: &FieldId, terms: impl IntoIterator<Item = MedicalTerm>) {
        self.terms
            .write()
            .entry(field_id.clone())
            .or_default()
            .extend(terms);
    }
}

#[async_trait]
impl MedicalTermStore for InMemoryMedicalTermStore {
    async fn search_by_term(&self, field_id: &FieldId, term: &str) -> Result<Vec<MedicalTerm>, StoreError> {
        let needle = term.to_lowercase();
        Ok(self
            .terms
            .read()
            .get(field_id)
            .map(|terms| {
                terms
                    .iter()
                    .filter(|t| t.meaning.to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Participant universe of a fixed size
#[derive(Debug, Clone, Copy)]
pub struct FixedParticipantCounter(pub u64);

#[async_trait]
impl ParticipantCounter for FixedParticipantCounter {
    async fn estimated_count(&self) -> Result<u64, StoreError> {
        Ok(self.0)
    }
}

/// Workgroup-patient records keyed by id
#[derive(Clone, Default)]
pub struct InMemoryWorkgroupPatientStore {
    records: Arc<RwLock<HashMap<String, WorkgroupPatient>>>,
}

impl InMemoryWorkgroupPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, patient: WorkgroupPatient) {
        self.records.write().insert(patient.id.clone(), patient);
    }
}

#[async_trait]
impl WorkgroupPatientStore for InMemoryWorkgroupPatientStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<WorkgroupPatient>, StoreError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn save(&self, patient: WorkgroupPatient) -> Result<WorkgroupPatient, StoreError> {
        self.records.write().insert(patient.id.clone(), patient.clone());
        Ok(patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldType, ValueType};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_distinct_values_prefer_label_map() {
        let store = InMemoryFieldStore::new();
        let field = FieldDefinition::new("31", FieldType::Bars, ValueType::CategoricalSingle)
            .with_values([("0", "Female"), ("1", "Male")]);
        store.insert_field(field);
        store.insert_values(&FieldId::from("31"), [value_row("p1", "0", "1")]);

        let distinct = store.find_distinct_values(&FieldId::from("31")).await.unwrap();
        assert_eq!(distinct, vec![json!("0"), json!("1")]);
    }

    #[tokio::test]
    async fn test_distinct_values_from_rows() {
        let store = InMemoryFieldStore::new();
        let id = FieldId::from("20002");
        store.insert_values(
            &id,
            [
                value_row("p1", "0", json!(["1065", "1074"])),
                value_row("p2", "0", "1065"),
                value_row("p3", "0", Value::Null),
            ],
        );

        let distinct = store.find_distinct_values(&id).await.unwrap();
        assert_eq!(distinct, vec![json!("1065"), json!("1074")]);
        assert_eq!(store.participant_count(), 3);
    }

    #[tokio::test]
    async fn test_query_filters_rows() {
        let store = InMemoryFieldStore::new();
        let id = FieldId::from("21001");
        store.insert_values(&id, [value_row("p1", "0", 22.5), value_row("p2", "1", 30.1)]);

        let rows = store
            .query(&id, &Filter::eq(value_paths::INSTANCE, "1"))
            .await
            .unwrap();
        assert_eq!(rows, vec![value_row("p2", "1", 30.1)]);
    }

    #[tokio::test]
    async fn test_participant_tier_collection() {
        let store = InMemoryTierStore::new(vec![
            TierRow::new("p1", "1-1-A-T").with_marker("m1"),
            TierRow::new("p2", "1-1-A-T").with_marker("m1"),
        ]);
        let pipeline = Pipeline::new().group_by("participantId");

        let shared = store.aggregate(&TierCollection::Shared, &pipeline).await.unwrap();
        let own = store
            .aggregate(&TierCollection::Participant("p2".into()), &pipeline)
            .await
            .unwrap();
        assert_eq!(shared.len(), 2);
        assert_eq!(own, vec![AggregateRow::new("p2", 1)]);
    }

    #[tokio::test]
    async fn test_medical_search_is_case_insensitive() {
        let store = InMemoryMedicalTermStore::new();
        let id = FieldId::from("41202");
        store.insert_terms(
            &id,
            [
                MedicalTerm { value: json!("E11"), meaning: "Type 2 diabetes mellitus".into() },
                MedicalTerm { value: json!("I10"), meaning: "Essential hypertension".into() },
            ],
        );

        let hits = store.search_by_term(&id, "DIABETES").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, json!("E11"));
    }
}
