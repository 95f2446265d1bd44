//! Reshaping raw aggregates into filter results

use crate::executor::Aggregation;
use crate::options::EngineOptions;
use crate::tree::TaxonomyTree;
use phenoportal_diagnostics::Result;
use phenoportal_model::{
    AggregateResult, AggregateRow, FieldDefinition, FieldType, FilterDataResult, TaxonomyStore,
    key_text, total_count,
};
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Turns aggregates into labelled rows or taxonomy trees
pub struct ResultReshaper<'a> {
    taxonomies: &'a dyn TaxonomyStore,
    options: &'a EngineOptions,
}

impl<'a> ResultReshaper<'a> {
    pub fn new(taxonomies: &'a dyn TaxonomyStore, options: &'a EngineOptions) -> Self {
        Self { taxonomies, options }
    }

    pub async fn reshape(
        &self,
        field: &FieldDefinition,
        aggregation: Aggregation,
        skip_transform: bool,
    ) -> Result<FilterDataResult> {
        if skip_transform {
            return Ok(FilterDataResult::Rows(raw_results(aggregation.rows)));
        }
        if field.is_nested_list() {
            return self.reshape_tree(field, &aggregation.rows).await;
        }
        Ok(FilterDataResult::Rows(reshape_rows(
            field,
            aggregation.rows,
            aggregation.bucketed,
            self.normalizes(field),
        )))
    }

    fn normalizes(&self, field: &FieldDefinition) -> bool {
        field.field_type != FieldType::Bars || self.options.normalize_bars_keys
    }

    async fn reshape_tree(&self, field: &FieldDefinition, rows: &[AggregateRow]) -> Result<FilterDataResult> {
        let total = total_count(rows);
        let Some(coding) = field.coding.as_deref() else {
            log::warn!("nested list field {} has no coding", field.id);
            return Ok(self.render(&TaxonomyTree::default(), total));
        };

        let raw = self.taxonomies.find_tree_by_coding(coding).await?;
        if raw.is_empty() {
            log::warn!("no taxonomy for coding {} of field {}", coding, field.id);
        }
        let mut tree = TaxonomyTree::from_raw(&raw);
        let unmatched = tree.apply_counts(rows);
        if unmatched > 0 {
            log::warn!("{} rows of field {} match no code in {}", unmatched, field.id, coding);
        }
        tree.roll_up();
        log::debug!("field {} tree has {} nodes", field.id, tree.len());
        Ok(self.render(&tree, total))
    }

    fn render(&self, tree: &TaxonomyTree, total: u64) -> FilterDataResult {
        if self.options.flatten_tree {
            FilterDataResult::FlatTree(tree.render_flat(total))
        } else {
            FilterDataResult::Tree(tree.render_nested(total))
        }
    }
}

/// Rows with totals only
pub fn raw_results(rows: Vec<AggregateRow>) -> Vec<AggregateResult> {
    let total = total_count(&rows);
    rows.into_iter()
        .map(|row| AggregateResult::new(row.key, row.count, total, None))
        .collect()
}

/// Labelled rows; bucketed rows keep their order, others are sorted by key
pub fn reshape_rows(
    field: &FieldDefinition,
    rows: Vec<AggregateRow>,
    bucketed: bool,
    normalize: bool,
) -> Vec<AggregateResult> {
    let total = total_count(&rows);
    let mut results: Vec<AggregateResult> = rows
        .into_iter()
        .map(|row| {
            let label = field.label_for(&row.key);
            let key = if normalize && !bucketed {
                numeric_key(&row.key).unwrap_or(row.key)
            } else {
                row.key
            };
            AggregateResult::new(key, row.count, total, Some(label))
        })
        .collect();

    if !bucketed {
        if normalize {
            results.sort_by(|a, b| compare_numeric(&a.key, &b.key));
        } else {
            results.sort_by(|a, b| compare_leading_int(&a.key, &b.key));
        }
    }
    results
}

/// Numeric form of a key that is a number or a string holding one
pub fn numeric_key(key: &Value) -> Option<Value> {
    match key {
        Value::Number(_) => Some(key.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(int) = s.parse::<i64>() {
                Some(Value::from(int))
            } else {
                s.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            }
        }
        _ => None,
    }
}

/// Numbers ascending, then non-numeric keys by text
pub fn compare_numeric(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => key_text(a).cmp(&key_text(b)),
    }
}

/// First run of digits in a key, skipping any non-digit prefix
pub fn leading_int(text: &str) -> Option<i64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Leading integers ascending, then unparseable keys by text
pub fn compare_leading_int(a: &Value, b: &Value) -> Ordering {
    let (a, b) = (key_text(a), key_text(b));
    match (leading_int(&a), leading_int(&b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(&b),
    }
}
