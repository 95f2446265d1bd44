//! Aggregate execution per query strategy

use crate::boundary;
use crate::options::EngineOptions;
use crate::plan;
use crate::query::FilterDataQuery;
use crate::strategy::QueryType;
use phenoportal_diagnostics::{PP0003, PortalError, Result};
use phenoportal_model::{
    AggregateRow, FieldDefinition, FieldValueStore, Filter, MedicalTermStore, Pipeline,
    compare_values, key_text,
};
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Raw aggregate of one field
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub strategy: QueryType,
    pub rows: Vec<AggregateRow>,
    /// Rows come from bucket ranges and are already in boundary order
    pub bucketed: bool,
}

impl Aggregation {
    fn new(strategy: QueryType, rows: Vec<AggregateRow>) -> Self {
        Self {
            strategy,
            rows,
            bucketed: false,
        }
    }

    fn empty(strategy: QueryType) -> Self {
        Self::new(strategy, Vec::new())
    }
}

/// Runs the pipelines of every strategy against the value and term stores
pub struct AggregateExecutor<'a> {
    values: &'a dyn FieldValueStore,
    medical_terms: &'a dyn MedicalTermStore,
    options: &'a EngineOptions,
}

impl<'a> AggregateExecutor<'a> {
    pub fn new(
        values: &'a dyn FieldValueStore,
        medical_terms: &'a dyn MedicalTermStore,
        options: &'a EngineOptions,
    ) -> Self {
        Self {
            values,
            medical_terms,
            options,
        }
    }

    /// Aggregate `field` for `query` under the `base` restriction
    pub async fn execute(
        &self,
        strategy: QueryType,
        field: &FieldDefinition,
        query: &FilterDataQuery,
        base: Filter,
    ) -> Result<Aggregation> {
        log::debug!("field {} uses strategy {}", field.id, strategy);
        match strategy {
            QueryType::Normal => self.normal(field, base).await,
            QueryType::TextSearch => self.text_search(field, query, base).await,
            QueryType::Bucket => self.bucket(field, query, base).await,
            QueryType::Medical => self.medical(field, query, base).await,
        }
    }

    /// Plain grouped aggregation
    pub async fn normal(&self, field: &FieldDefinition, base: Filter) -> Result<Aggregation> {
        let rows = self.run(field, plan::normal(base)).await?;
        Ok(Aggregation::new(QueryType::Normal, rows))
    }

    async fn text_search(
        &self,
        field: &FieldDefinition,
        query: &FilterDataQuery,
        base: Filter,
    ) -> Result<Aggregation> {
        let term = query.trimmed_term().map(|t| plan::term_filter(field, t));
        let pipeline = plan::text_search(base, term, query.pagination);
        let rows = self.run(field, pipeline).await?;
        Ok(Aggregation::new(QueryType::TextSearch, rows))
    }

    async fn bucket(
        &self,
        field: &FieldDefinition,
        query: &FilterDataQuery,
        base: Filter,
    ) -> Result<Aggregation> {
        let boundaries = match &query.buckets {
            Some(buckets) => {
                validate_boundaries(buckets)?;
                buckets.clone()
            }
            None => self.observed_boundaries(field, &base).await?,
        };
        log::debug!("field {} has {} bucket boundaries", field.id, boundaries.len());

        match boundaries.len() {
            0 => Ok(Aggregation::empty(QueryType::Bucket)),
            1 => {
                let rows = self.run(field, plan::normal(base)).await?;
                Ok(Aggregation::new(QueryType::Bucket, rows))
            }
            _ => {
                let rows = self.run(field, plan::bucketed(base, boundaries)).await?;
                Ok(Aggregation {
                    strategy: QueryType::Bucket,
                    rows,
                    bucketed: true,
                })
            }
        }
    }

    /// Boundaries over the current minimum and maximum of the restricted values
    async fn observed_boundaries(&self, field: &FieldDefinition, base: &Filter) -> Result<Vec<Value>> {
        let (Some(min), Some(max)) = (
            self.extreme(field, base, true).await?,
            self.extreme(field, base, false).await?,
        ) else {
            return Ok(Vec::new());
        };

        let steps = self.options.bucket_steps;
        let boundaries = if field.value_type.is_temporal() {
            boundary::boundaries_for_date_in_steps(&key_text(&min), &key_text(&max), steps)
                .map(|days| days.into_iter().map(Value::String).collect())
        } else {
            match (as_number(&min), as_number(&max)) {
                (Some(min), Some(max)) => boundary::boundaries_for_number_in_steps(min, max, steps)
                    .map(|b| b.into_iter().filter_map(Number::from_f64).map(Value::Number).collect()),
                _ => None,
            }
        };
        if boundaries.is_none() {
            log::warn!("field {} has no usable range between {} and {}", field.id, min, max);
        }
        Ok(boundaries.unwrap_or_default())
    }

    async fn extreme(&self, field: &FieldDefinition, base: &Filter, ascending: bool) -> Result<Option<Value>> {
        let rows = self.run(field, plan::extreme_value(base.clone(), ascending)).await?;
        Ok(rows.into_iter().next().map(|row| row.key))
    }

    async fn medical(
        &self,
        field: &FieldDefinition,
        query: &FilterDataQuery,
        base: Filter,
    ) -> Result<Aggregation> {
        let Some(term) = query
            .trimmed_term()
            .filter(|t| t.chars().count() >= self.options.min_medical_term_len)
        else {
            log::debug!("medical search on field {} skipped: term too short", field.id);
            return Ok(Aggregation::empty(QueryType::Medical));
        };

        let terms = self.medical_terms.search_by_term(&field.id, term).await?;
        if terms.is_empty() {
            return Ok(Aggregation::empty(QueryType::Medical));
        }
        let values = terms.into_iter().map(|t| t.value).collect();
        let rows = self.run(field, plan::restricted_to_values(base, values)).await?;
        Ok(Aggregation::new(QueryType::Medical, rows))
    }

    async fn run(&self, field: &FieldDefinition, pipeline: Pipeline) -> Result<Vec<AggregateRow>> {
        log::trace!("field {} pipeline ({} stages): {:?}", field.id, pipeline.len(), pipeline);
        Ok(self.values.aggregate(&field.id, &pipeline).await?)
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Caller-supplied boundaries must be strictly ascending
pub fn validate_boundaries(boundaries: &[Value]) -> Result<()> {
    let ascending = boundaries
        .windows(2)
        .all(|pair| compare_values(&pair[0], &pair[1]) == Ordering::Less);
    if ascending {
        Ok(())
    } else {
        Err(PortalError::illegal_argument(
            PP0003,
            "bucket boundaries must be strictly ascending",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phenoportal_model::memory::{InMemoryFieldStore, InMemoryMedicalTermStore, value_row};
    use phenoportal_model::{FieldType, MEDICAL_ITEM_TYPE, MedicalTerm, ValueType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store_with(field: &FieldDefinition, values: Vec<Value>) -> InMemoryFieldStore {
        let store = InMemoryFieldStore::new();
        store.insert_field(field.clone());
        store.insert_values(
            &field.id,
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| value_row(&format!("p{}", i), "0", v)),
        );
        store
    }

    #[test]
    fn test_validate_boundaries() {
        assert!(validate_boundaries(&[json!(1), json!(2), json!(5)]).is_ok());
        assert!(validate_boundaries(&[json!(1)]).is_ok());
        let err = validate_boundaries(&[json!(2), json!(2)]).unwrap_err();
        assert_eq!(err.code(), PP0003);
    }

    #[tokio::test]
    async fn test_bucket_over_observed_range() {
        let field = FieldDefinition::new("21001", FieldType::Histogram, ValueType::Continuous)
            .with_buckets(true, false);
        let store = store_with(&field, vec![json!(10.0), json!(20.0), json!(30.0)]);
        let terms = InMemoryMedicalTermStore::new();
        let options = EngineOptions::builder().bucket_steps(2).build().unwrap();
        let executor = AggregateExecutor::new(&store, &terms, &options);

        let query = FilterDataQuery::new("21001");
        let result = executor
            .execute(QueryType::Bucket, &field, &query, Filter::All)
            .await
            .unwrap();

        assert!(result.bucketed);
        assert_eq!(result.rows.iter().map(|r| r.count).sum::<u64>(), 3);
        assert_eq!(result.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_bucket_single_value_falls_back_to_grouping() {
        let field = FieldDefinition::new("21001", FieldType::Histogram, ValueType::Integer)
            .with_buckets(false, true);
        let store = store_with(&field, vec![json!(7), json!(7)]);
        let terms = InMemoryMedicalTermStore::new();
        let options = EngineOptions::default();
        let executor = AggregateExecutor::new(&store, &terms, &options);

        let result = executor
            .execute(QueryType::Bucket, &field, &FilterDataQuery::new("21001"), Filter::All)
            .await
            .unwrap();

        assert!(!result.bucketed);
        assert_eq!(result.rows, vec![AggregateRow::new(7, 2)]);
    }

    #[tokio::test]
    async fn test_bucket_without_values_is_empty() {
        let field = FieldDefinition::new("21001", FieldType::Histogram, ValueType::Date)
            .with_buckets(true, false);
        let store = store_with(&field, vec![]);
        let terms = InMemoryMedicalTermStore::new();
        let options = EngineOptions::default();
        let executor = AggregateExecutor::new(&store, &terms, &options);

        let result = executor
            .execute(QueryType::Bucket, &field, &FilterDataQuery::new("21001"), Filter::All)
            .await
            .unwrap();
        assert!(result.rows.is_empty());
    }

    #[tokio::test]
    async fn test_medical_short_term_is_empty() {
        let field = FieldDefinition::new("41270", FieldType::Bars, ValueType::CategoricalMultiple)
            .with_description_item_type(MEDICAL_ITEM_TYPE);
        let store = store_with(&field, vec![json!("C34")]);
        let terms = InMemoryMedicalTermStore::new();
        terms.insert_terms(
            &field.id,
            [MedicalTerm {
                value: json!("C34"),
                meaning: "Lung cancer".to_string(),
            }],
        );
        let options = EngineOptions::default();
        let executor = AggregateExecutor::new(&store, &terms, &options);

        let short = FilterDataQuery::new("41270").with_term("l");
        let result = executor
            .execute(QueryType::Medical, &field, &short, Filter::All)
            .await
            .unwrap();
        assert!(result.rows.is_empty());

        let long = FilterDataQuery::new("41270").with_term("lung");
        let result = executor
            .execute(QueryType::Medical, &field, &long, Filter::All)
            .await
            .unwrap();
        assert_eq!(result.rows, vec![AggregateRow::new("C34", 1)]);
    }
}
