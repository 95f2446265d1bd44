//! Store traits consumed by the filter query engine

use crate::field::{FieldDefinition, FieldId};
use crate::genomics::{GenomicLocation, Marker, TierCollection, TierRow};
use crate::pipeline::{Filter, Pipeline};
use crate::result::{AggregateRow, RawTreeNode};
use crate::workgroup::WorkgroupPatient;
use async_trait::async_trait;
use phenoportal_diagnostics::PortalError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field-definition reference data
#[async_trait]
pub trait FieldDefinitionStore: Send + Sync {
    async fn find_by_id(&self, id: &FieldId) -> Result<Option<FieldDefinition>, StoreError>;

    /// Every value the field can take
    async fn find_distinct_values(&self, id: &FieldId) -> Result<Vec<Value>, StoreError>;
}

/// Per-field value collections
#[async_trait]
pub trait FieldValueStore: Send + Sync {
    /// Value rows of a field matching a filter
    async fn query(&self, field_id: &FieldId, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    /// Run a pipeline over a field's value collection
    async fn aggregate(
        &self,
        field_id: &FieldId,
        pipeline: &Pipeline,
    ) -> Result<Vec<AggregateRow>, StoreError>;
}

/// Taxonomy trees backing nested-list fields
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Root nodes of the taxonomy, empty when unknown
    async fn find_tree_by_coding(&self, coding: &str) -> Result<Vec<RawTreeNode>, StoreError>;
}

/// Variant tier and genotype collections
#[async_trait]
pub trait TierStore: Send + Sync {
    /// Rows of the shared collection whose full location equals `location`
    async fn find_by_location(&self, location: &str) -> Result<Vec<TierRow>, StoreError>;

    async fn aggregate(
        &self,
        collection: &TierCollection,
        pipeline: &Pipeline,
    ) -> Result<Vec<AggregateRow>, StoreError>;
}

/// Genomic location and marker lookup
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn find_locations_by_gene(&self, gene: &str) -> Result<Vec<GenomicLocation>, StoreError>;

    async fn find_markers_by_locations(&self, location_ids: &[String]) -> Result<Vec<Marker>, StoreError>;
}

/// Medical term resolved to a raw field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalTerm {
    pub value: Value,
    pub meaning: String,
}

/// Secondary lookup of medical terms per field
#[async_trait]
pub trait MedicalTermStore: Send + Sync {
    /// Case-insensitive substring search over term meanings
    async fn search_by_term(&self, field_id: &FieldId, term: &str) -> Result<Vec<MedicalTerm>, StoreError>;
}

/// Size of the global participant universe
#[async_trait]
pub trait ParticipantCounter: Send + Sync {
    async fn estimated_count(&self) -> Result<u64, StoreError>;
}

/// Workgroup-patient persistence
#[async_trait]
pub trait WorkgroupPatientStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<WorkgroupPatient>, StoreError>;

    async fn save(&self, patient: WorkgroupPatient) -> Result<WorkgroupPatient, StoreError>;
}

/// Store error
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for PortalError {
    fn from(err: StoreError) -> Self {
        PortalError::upstream(err.to_string())
    }
}
