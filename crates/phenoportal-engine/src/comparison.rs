//! Individual and variant comparison
//!
//! Comparisons aggregate one field over a participant population derived
//! from a variant or a gene and split the field's distinct values into those
//! observed in the population and those not observed.

use crate::executor::AggregateExecutor;
use crate::plan;
use crate::population::plan_restriction;
use indexmap::{IndexMap, IndexSet};
use phenoportal_diagnostics::{PortalError, Result};
use phenoportal_model::{
    AggregateRow, ComparisonResult, FieldDefinition, FieldDefinitionStore, FieldId, Filter, MarkerStore,
    ParticipantCounter, Pipeline, SortKey, Tier, TierCollection, TierDistribution, TierRow, TierStore,
    VariantGraphData, group_paths, key_text, tier_paths, value_paths,
};
use serde_json::Value;

/// Population lookups and comparison aggregates
pub struct ComparisonEngine<'a> {
    pub(crate) fields: &'a dyn FieldDefinitionStore,
    pub(crate) tiers: &'a dyn TierStore,
    pub(crate) markers: &'a dyn MarkerStore,
    pub(crate) participants: &'a dyn ParticipantCounter,
    pub(crate) executor: AggregateExecutor<'a>,
}

impl ComparisonEngine<'_> {
    /// Distinct participants carrying `variant`, minus `exclude`
    pub async fn variant_population(&self, variant: &str, exclude: Option<&str>) -> Result<Vec<String>> {
        let rows = self.tiers.find_by_location(variant).await?;
        Ok(distinct_participants(rows.into_iter().map(|r: TierRow| r.participant_id), exclude))
    }

    /// Distinct participants with a tier row at any marker of `gene`, minus `exclude`
    pub async fn gene_population(&self, gene: &str, exclude: Option<&str>) -> Result<Vec<String>> {
        let location_ids: Vec<String> = self
            .markers
            .find_locations_by_gene(gene)
            .await?
            .into_iter()
            .map(|location| location.id)
            .collect();
        if location_ids.is_empty() {
            log::debug!("gene {} has no genomic locations", gene);
            return Ok(Vec::new());
        }

        let full_locations: IndexSet<String> = self
            .markers
            .find_markers_by_locations(&location_ids)
            .await?
            .into_iter()
            .map(|marker| marker.full_location)
            .collect();
        if full_locations.is_empty() {
            return Ok(Vec::new());
        }

        let pipeline = Pipeline::new()
            .matching(Filter::is_in(tier_paths::FULL_LOCATION, full_locations))
            .group_by(tier_paths::PARTICIPANT_ID);
        let rows = self.tiers.aggregate(&TierCollection::Shared, &pipeline).await?;
        Ok(distinct_participants(
            rows.iter().map(|row| key_text(&row.key).into_owned()),
            exclude,
        ))
    }

    /// Compare `field_id` over an already resolved population
    pub async fn compare(&self, field_id: &FieldId, population: &[String]) -> Result<ComparisonResult> {
        let field = self
            .fields
            .find_by_id(field_id)
            .await?
            .ok_or_else(|| PortalError::field_not_found(field_id.as_str()))?;
        let distinct = self.fields.find_distinct_values(field_id).await?;

        let restriction =
            plan_restriction(self.participants, value_paths::PARTICIPANT_ID, Some(population)).await?;
        let aggregation = self
            .executor
            .normal(&field, plan::base_filter(None, restriction))
            .await?;

        Ok(partition(&field, &distinct, &aggregation.rows, population.len() as u64))
    }

    /// Genotype and ACMG verdict distributions of `variant` over `population`
    pub async fn variant_graph(&self, variant: &str, population: &[String]) -> Result<VariantGraphData> {
        let restriction =
            plan_restriction(self.participants, tier_paths::PARTICIPANT_ID, Some(population)).await?;
        let genotypes = property_distribution(variant, restriction.clone(), tier_paths::GENOTYPE);
        let verdicts = property_distribution(variant, restriction, tier_paths::ACMG_VERDICT);

        let (genotypes, verdicts) = futures::try_join!(
            self.tiers.aggregate(&TierCollection::Shared, &genotypes),
            self.tiers.aggregate(&TierCollection::Shared, &verdicts),
        )?;
        Ok(VariantGraphData {
            genotypes: fold_counts(&genotypes),
            acmg_verdicts: fold_counts(&verdicts),
        })
    }

    /// Distinct markers per tier in one participant's collection
    pub async fn tier_distribution(&self, participant_id: &str) -> Result<TierDistribution> {
        let pipeline = Pipeline::new().group_by_all(&[tier_paths::TIER, tier_paths::MARKER_ID]);
        let collection = TierCollection::Participant(participant_id.to_string());
        let rows = self.tiers.aggregate(&collection, &pipeline).await?;
        Ok(count_tiers(&rows))
    }
}

fn distinct_participants(ids: impl Iterator<Item = String>, exclude: Option<&str>) -> Vec<String> {
    ids.filter(|id| Some(id.as_str()) != exclude)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn property_distribution(variant: &str, restriction: Option<Filter>, property: &str) -> Pipeline {
    Pipeline::new()
        .matching(Filter::and(
            [
                Filter::eq(tier_paths::FULL_LOCATION, variant),
                Filter::exists(property),
            ]
            .into_iter()
            .chain(restriction),
        ))
        .group_by(property)
        .sort(vec![SortKey::desc(group_paths::COUNT), SortKey::asc(group_paths::KEY)])
}

/// Ordered `label -> count` map of grouped rows
pub fn fold_counts(rows: &[AggregateRow]) -> IndexMap<String, u64> {
    let mut counts = IndexMap::with_capacity(rows.len());
    for row in rows {
        *counts.entry(key_text(&row.key).into_owned()).or_insert(0) += row.count;
    }
    counts
}

/// Split every distinct value of `field` by whether the population has it
pub fn partition(
    field: &FieldDefinition,
    distinct: &[Value],
    rows: &[AggregateRow],
    total: u64,
) -> ComparisonResult {
    let observed = fold_counts(rows);
    let codes: IndexSet<String> = distinct.iter().map(|v| key_text(v).into_owned()).collect();

    // Codes sharing a label count as one value.
    let mut by_label: IndexMap<String, u64> = IndexMap::new();
    for code in &codes {
        let count = observed.get(code.as_str()).copied().unwrap_or(0);
        *by_label.entry(field.find_label(code).to_string()).or_insert(0) += count;
    }

    let (existing_values, not_existing_values): (IndexMap<_, _>, IndexMap<_, _>) =
        by_label.into_iter().partition(|(_, count)| *count > 0);

    ComparisonResult {
        total,
        field_id: field.id.clone(),
        existing_values,
        not_existing_values,
    }
}

/// Count distinct markers per tier from rows grouped by `[tier, marker]`
pub fn count_tiers(rows: &[AggregateRow]) -> TierDistribution {
    let mut distribution = TierDistribution::default();
    for row in rows {
        let tier = match &row.key {
            Value::Array(parts) => parts.first().and_then(Value::as_str).and_then(Tier::parse),
            _ => None,
        };
        match tier {
            Some(Tier::Tier1) => distribution.tier1 += 1,
            Some(Tier::Tier2) => distribution.tier2 += 1,
            Some(Tier::Tier3) => distribution.tier3 += 1,
            None => log::debug!("tier row group {} has no tier", row.key),
        }
    }
    distribution
}
