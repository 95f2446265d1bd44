//! Filter engine
//!
//! [`FilterEngine`] is the entry point of the crate. It owns the store
//! handles and options, validates request arguments and runs every public
//! operation through the strategy selector, executor and reshaper.

use crate::comparison::ComparisonEngine;
use crate::executor::AggregateExecutor;
use crate::filters::{FilterChange, apply_filter_change};
use crate::options::EngineOptions;
use crate::plan;
use crate::population::plan_restriction;
use crate::query::FilterDataQuery;
use crate::reshape::ResultReshaper;
use crate::strategy::classify;
use phenoportal_diagnostics::{PortalError, Result};
use phenoportal_model::memory::MemoryStores;
use phenoportal_model::{
    ComparisonResult, FieldDefinitionStore, FieldId, FieldValueStore, FilterDataResult, MarkerStore,
    MedicalTermStore, ParticipantCounter, TaxonomyStore, TierDistribution, TierStore,
    VariantGraphData, WorkgroupPatient, WorkgroupPatientStore, value_paths,
};
use std::sync::Arc;

/// Phenotype filter and comparison engine
#[derive(Clone)]
pub struct FilterEngine {
    fields: Arc<dyn FieldDefinitionStore>,
    values: Arc<dyn FieldValueStore>,
    taxonomies: Arc<dyn TaxonomyStore>,
    tiers: Arc<dyn TierStore>,
    markers: Arc<dyn MarkerStore>,
    medical_terms: Arc<dyn MedicalTermStore>,
    participants: Arc<dyn ParticipantCounter>,
    workgroup_patients: Arc<dyn WorkgroupPatientStore>,
    options: EngineOptions,
}

impl FilterEngine {
    pub fn builder() -> FilterEngineBuilder {
        FilterEngineBuilder::default()
    }

    /// Engine over in-memory stores
    pub fn from_memory(stores: MemoryStores, options: EngineOptions) -> Result<Self> {
        let fields = Arc::new(stores.fields);
        Self::builder()
            .fields(fields.clone())
            .values(fields)
            .taxonomies(Arc::new(stores.taxonomies))
            .tiers(Arc::new(stores.tiers))
            .markers(Arc::new(stores.markers))
            .medical_terms(Arc::new(stores.medical_terms))
            .participants(Arc::new(stores.participants))
            .workgroup_patients(Arc::new(stores.workgroup_patients))
            .options(options)
            .build()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn executor(&self) -> AggregateExecutor<'_> {
        AggregateExecutor::new(self.values.as_ref(), self.medical_terms.as_ref(), &self.options)
    }

    fn comparisons(&self) -> ComparisonEngine<'_> {
        ComparisonEngine {
            fields: self.fields.as_ref(),
            tiers: self.tiers.as_ref(),
            markers: self.markers.as_ref(),
            participants: self.participants.as_ref(),
            executor: self.executor(),
        }
    }

    /// Aggregated, labelled data of one field
    pub async fn get_filter_data(&self, query: &FilterDataQuery) -> Result<FilterDataResult> {
        query.validate()?;
        let field = self
            .fields
            .find_by_id(&query.field)
            .await?
            .ok_or_else(|| PortalError::field_not_found(query.field.as_str()))?;

        let strategy = classify(&field);
        let restriction = plan_restriction(
            self.participants.as_ref(),
            value_paths::PARTICIPANT_ID,
            query.participant_ids.as_deref(),
        )
        .await?;
        let base = plan::base_filter(query.instances.as_deref(), restriction);

        let aggregation = self.executor().execute(strategy, &field, query, base).await?;
        log::debug!("field {} aggregated into {} rows", field.id, aggregation.rows.len());
        ResultReshaper::new(self.taxonomies.as_ref(), &self.options)
            .reshape(&field, aggregation, query.skip_transform)
            .await
    }

    /// Observed versus not-observed values of a field among carriers of a variant
    pub async fn get_comparison_by_field_and_variant(
        &self,
        field_id: &FieldId,
        variant: &str,
        exclude_participant: Option<&str>,
    ) -> Result<ComparisonResult> {
        require_field(field_id)?;
        require("variant", variant)?;
        let comparisons = self.comparisons();
        let population = comparisons.variant_population(variant, exclude_participant).await?;
        log::debug!("variant {} population has {} participants", variant, population.len());
        comparisons.compare(field_id, &population).await
    }

    /// Observed versus not-observed values of a field among carriers of any
    /// variant of a gene
    pub async fn get_comparison_by_field_and_gene(
        &self,
        field_id: &FieldId,
        gene: &str,
        exclude_participant: Option<&str>,
    ) -> Result<ComparisonResult> {
        require_field(field_id)?;
        require("gene", gene)?;
        let comparisons = self.comparisons();
        let population = comparisons.gene_population(gene, exclude_participant).await?;
        log::debug!("gene {} population has {} participants", gene, population.len());
        comparisons.compare(field_id, &population).await
    }

    /// Genotype and ACMG verdict distributions of a variant
    pub async fn get_variant_graph_data(
        &self,
        variant: &str,
        exclude_participant: Option<&str>,
    ) -> Result<VariantGraphData> {
        require("variant", variant)?;
        let comparisons = self.comparisons();
        let population = comparisons.variant_population(variant, exclude_participant).await?;
        comparisons.variant_graph(variant, &population).await
    }

    /// Distinct markers per tier of one participant
    pub async fn get_tier_distribution(&self, participant_id: &str) -> Result<TierDistribution> {
        require("participant", participant_id)?;
        self.comparisons().tier_distribution(participant_id).await
    }

    pub async fn add_comparison_filter(
        &self,
        field_id: &FieldId,
        workgroup_patient_id: &str,
    ) -> Result<WorkgroupPatient> {
        self.change_filter(field_id, workgroup_patient_id, FilterChange::Add).await
    }

    pub async fn remove_comparison_filter(
        &self,
        field_id: &FieldId,
        workgroup_patient_id: &str,
    ) -> Result<WorkgroupPatient> {
        self.change_filter(field_id, workgroup_patient_id, FilterChange::Remove).await
    }

    async fn change_filter(
        &self,
        field_id: &FieldId,
        workgroup_patient_id: &str,
        change: FilterChange,
    ) -> Result<WorkgroupPatient> {
        require_field(field_id)?;
        require("workgroup patient", workgroup_patient_id)?;
        apply_filter_change(
            self.fields.as_ref(),
            self.workgroup_patients.as_ref(),
            field_id,
            workgroup_patient_id,
            change,
        )
        .await
    }
}

fn require_field(field_id: &FieldId) -> Result<()> {
    if field_id.is_empty() {
        return Err(PortalError::missing_identifier("field"));
    }
    Ok(())
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PortalError::missing_identifier(name));
    }
    Ok(())
}

/// Builder for [`FilterEngine`]; every store is required
#[derive(Default)]
pub struct FilterEngineBuilder {
    fields: Option<Arc<dyn FieldDefinitionStore>>,
    values: Option<Arc<dyn FieldValueStore>>,
    taxonomies: Option<Arc<dyn TaxonomyStore>>,
    tiers: Option<Arc<dyn TierStore>>,
    markers: Option<Arc<dyn MarkerStore>>,
    medical_terms: Option<Arc<dyn MedicalTermStore>>,
    participants: Option<Arc<dyn ParticipantCounter>>,
    workgroup_patients: Option<Arc<dyn WorkgroupPatientStore>>,
    options: EngineOptions,
}

impl FilterEngineBuilder {
    pub fn fields(mut self, store: Arc<dyn FieldDefinitionStore>) -> Self {
        self.fields = Some(store);
        self
    }

    pub fn values(mut self, store: Arc<dyn FieldValueStore>) -> Self {
        self.values = Some(store);
        self
    }

    pub fn taxonomies(mut self, store: Arc<dyn TaxonomyStore>) -> Self {
        self.taxonomies = Some(store);
        self
    }

    pub fn tiers(mut self, store: Arc<dyn TierStore>) -> Self {
        self.tiers = Some(store);
        self
    }

    pub fn markers(mut self, store: Arc<dyn MarkerStore>) -> Self {
        self.markers = Some(store);
        self
    }

    pub fn medical_terms(mut self, store: Arc<dyn MedicalTermStore>) -> Self {
        self.medical_terms = Some(store);
        self
    }

    pub fn participants(mut self, counter: Arc<dyn ParticipantCounter>) -> Self {
        self.participants = Some(counter);
        self
    }

    pub fn workgroup_patients(mut self, store: Arc<dyn WorkgroupPatientStore>) -> Self {
        self.workgroup_patients = Some(store);
        self
    }

    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<FilterEngine> {
        self.options.validate()?;
        Ok(FilterEngine {
            fields: required(self.fields, "field definition store")?,
            values: required(self.values, "field value store")?,
            taxonomies: required(self.taxonomies, "taxonomy store")?,
            tiers: required(self.tiers, "tier store")?,
            markers: required(self.markers, "marker store")?,
            medical_terms: required(self.medical_terms, "medical term store")?,
            participants: required(self.participants, "participant counter")?,
            workgroup_patients: required(self.workgroup_patients, "workgroup patient store")?,
            options: self.options,
        })
    }
}

fn required<T: ?Sized>(store: Option<Arc<T>>, name: &str) -> Result<Arc<T>> {
    store.ok_or_else(|| PortalError::config(format!("missing {}", name)))
}
