//! Pipeline evaluation over in-memory documents

use crate::pipeline::{Filter, Pipeline, SortKey, SortOrder, Stage, compare_values, group_paths, lookup};
use crate::provider::StoreError;
use crate::result::AggregateRow;
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Filter with its regular expressions compiled once
pub(crate) enum CompiledFilter {
    All,
    And(Vec<CompiledFilter>),
    Eq(String, Value),
    In(String, Vec<Value>),
    Regex(String, Regex),
    Exists(String),
}

impl CompiledFilter {
    pub(crate) fn compile(filter: &Filter) -> Result<Self, StoreError> {
        Ok(match filter {
            Filter::All => Self::All,
            Filter::And(parts) => Self::And(
                parts
                    .iter()
                    .map(Self::compile)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Filter::Eq { path, value } => Self::Eq(path.clone(), value.clone()),
            Filter::In { path, values } => Self::In(path.clone(), values.clone()),
            Filter::Regex {
                path,
                pattern,
                case_insensitive,
            } => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(*case_insensitive)
                    .build()
                    .map_err(|e| StoreError::InvalidPipeline(format!("bad regex '{}': {}", pattern, e)))?;
                Self::Regex(path.clone(), regex)
            }
            Filter::Exists { path } => Self::Exists(path.clone()),
        })
    }

    pub(crate) fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::All => true,
            Self::And(parts) => parts.iter().all(|p| p.matches(doc)),
            Self::Eq(path, expected) => {
                any_element(lookup(doc, path), |v| values_equal(v, expected))
            }
            Self::In(path, values) => any_element(lookup(doc, path), |v| {
                values.iter().any(|candidate| values_equal(v, candidate))
            }),
            Self::Regex(path, regex) => any_element(lookup(doc, path), |v| match v {
                Value::String(s) => regex.is_match(s),
                Value::Number(n) => regex.is_match(&n.to_string()),
                _ => false,
            }),
            Self::Exists(path) => lookup(doc, path).is_some_and(|v| !v.is_null()),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

/// Array-valued paths match when any element does
fn any_element(value: Option<&Value>, pred: impl Fn(&Value) -> bool) -> bool {
    match value {
        Some(Value::Array(items)) => items.iter().any(&pred),
        Some(v) => pred(v),
        None => false,
    }
}

/// Run every stage of a pipeline over the documents
pub(crate) fn run_pipeline(docs: Vec<Value>, pipeline: &Pipeline) -> Result<Vec<Value>, StoreError> {
    pipeline
        .stages()
        .iter()
        .try_fold(docs, |docs, stage| apply_stage(docs, stage))
}

fn apply_stage(mut docs: Vec<Value>, stage: &Stage) -> Result<Vec<Value>, StoreError> {
    match stage {
        Stage::Match(filter) => {
            let compiled = CompiledFilter::compile(filter)?;
            docs.retain(|doc| compiled.matches(doc));
            Ok(docs)
        }
        Stage::Unwind { path } => Ok(unwind(docs, path)),
        Stage::Group { by } => Ok(group(&docs, by)),
        Stage::Bucket {
            path,
            boundaries,
            default,
        } => bucket(&docs, path, boundaries, default),
        Stage::Sort(keys) => {
            docs.sort_by(|a, b| compare_by_keys(a, b, keys));
            Ok(docs)
        }
        Stage::Skip(n) => Ok(docs.into_iter().skip(*n as usize).collect()),
        Stage::Limit(n) => {
            docs.truncate(*n as usize);
            Ok(docs)
        }
    }
}

fn unwind(docs: Vec<Value>, path: &str) -> Vec<Value> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        let items = match lookup(&doc, path) {
            Some(Value::Array(items)) => Some(items.clone()),
            _ => None,
        };
        let Some(items) = items else {
            out.push(doc);
            continue;
        };
        for item in items {
            let mut copy = doc.clone();
            if let Some(slot) = lookup_mut(&mut copy, path) {
                *slot = item;
            }
            out.push(copy);
        }
    }
    out
}

fn lookup_mut<'a>(doc: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.').try_fold(doc, |current, segment| match current {
        Value::Object(map) => map.get_mut(segment),
        _ => None,
    })
}

fn group(docs: &[Value], by: &[String]) -> Vec<Value> {
    let mut groups: IndexMap<String, (Value, u64)> = IndexMap::new();
    for doc in docs {
        let key = match by {
            [single] => lookup(doc, single).cloned().unwrap_or(Value::Null),
            many => Value::Array(
                many.iter()
                    .map(|path| lookup(doc, path).cloned().unwrap_or(Value::Null))
                    .collect(),
            ),
        };
        groups
            .entry(key.to_string())
            .or_insert_with(|| (key, 0))
            .1 += 1;
    }
    groups
        .into_values()
        .map(|(key, count)| group_doc(key, count))
        .collect()
}

fn group_doc(key: Value, count: u64) -> Value {
    let mut doc = Map::new();
    doc.insert(group_paths::KEY.to_string(), key);
    doc.insert(group_paths::COUNT.to_string(), Value::from(count));
    Value::Object(doc)
}

fn bucket(
    docs: &[Value],
    path: &str,
    boundaries: &[Value],
    default: &str,
) -> Result<Vec<Value>, StoreError> {
    if boundaries.len() < 2 {
        return Err(StoreError::InvalidPipeline(
            "bucket stage needs at least two boundaries".to_string(),
        ));
    }
    if boundaries
        .windows(2)
        .any(|w| compare_values(&w[0], &w[1]) != Ordering::Less)
    {
        return Err(StoreError::InvalidPipeline(
            "bucket boundaries must be strictly ascending".to_string(),
        ));
    }

    let mut counts = vec![0u64; boundaries.len() - 1];
    let mut other = 0u64;
    for doc in docs {
        let slot = lookup(doc, path).and_then(|value| {
            boundaries.windows(2).position(|w| {
                compare_values(value, &w[0]) != Ordering::Less
                    && compare_values(value, &w[1]) == Ordering::Less
            })
        });
        match slot {
            Some(i) => counts[i] += 1,
            None => other += 1,
        }
    }

    let mut out: Vec<Value> = counts
        .iter()
        .zip(boundaries)
        .filter(|(count, _)| **count > 0)
        .map(|(count, lower)| group_doc(lower.clone(), *count))
        .collect();
    if other > 0 {
        out.push(group_doc(Value::String(default.to_string()), other));
    }
    Ok(out)
}

fn compare_by_keys(a: &Value, b: &Value, keys: &[SortKey]) -> Ordering {
    keys.iter()
        .map(|key| {
            let left = lookup(a, &key.path).unwrap_or(&Value::Null);
            let right = lookup(b, &key.path).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            match key.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        })
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Read `{ key, count }` documents produced by a grouping stage
pub(crate) fn into_rows(docs: Vec<Value>) -> Result<Vec<AggregateRow>, StoreError> {
    docs.into_iter()
        .map(|mut doc| {
            let count = lookup(&doc, group_paths::COUNT).and_then(Value::as_u64);
            let key = doc
                .as_object_mut()
                .and_then(|map| map.remove(group_paths::KEY));
            match (key, count) {
                (Some(key), Some(count)) => Ok(AggregateRow { key, count }),
                _ => Err(StoreError::InvalidPipeline(
                    "pipeline output is not grouped into key/count rows".to_string(),
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SortKey;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn docs() -> Vec<Value> {
        vec![
            json!({"participantId": "p1", "value": 3}),
            json!({"participantId": "p2", "value": 7}),
            json!({"participantId": "p3", "value": 3}),
            json!({"participantId": "p4", "value": 42}),
            json!({"participantId": "p5", "value": "n/a"}),
        ]
    }

    #[test]
    fn test_group_counts_in_first_seen_order() {
        let pipeline = Pipeline::new().group_by("value");
        let rows = into_rows(run_pipeline(docs(), &pipeline).unwrap()).unwrap();
        assert_eq!(
            rows,
            vec![
                AggregateRow::new(3, 2),
                AggregateRow::new(7, 1),
                AggregateRow::new(42, 1),
                AggregateRow::new("n/a", 1),
            ]
        );
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let pipeline = Pipeline::new()
            .matching(Filter::is_in("participantId", Vec::<String>::new()))
            .group_by("value");
        assert!(run_pipeline(docs(), &pipeline).unwrap().is_empty());
    }

    #[test]
    fn test_bucket_with_other() {
        let pipeline = Pipeline::new().bucket("value", vec![json!(0), json!(5), json!(10)]);
        let rows = into_rows(run_pipeline(docs(), &pipeline).unwrap()).unwrap();
        assert_eq!(
            rows,
            vec![
                AggregateRow::new(0, 2),
                AggregateRow::new(5, 1),
                AggregateRow::new("Other", 2),
            ]
        );
    }

    #[test]
    fn test_bucket_rejects_unordered_boundaries() {
        let pipeline = Pipeline::new().bucket("value", vec![json!(5), json!(1)]);
        assert!(matches!(
            run_pipeline(docs(), &pipeline),
            Err(StoreError::InvalidPipeline(_))
        ));
    }

    #[test]
    fn test_sort_skip_limit_after_group() {
        let pipeline = Pipeline::new()
            .group_by("value")
            .sort(vec![SortKey::desc("count"), SortKey::asc("key")])
            .skip(1)
            .limit(2);
        let rows = into_rows(run_pipeline(docs(), &pipeline).unwrap()).unwrap();
        assert_eq!(rows, vec![AggregateRow::new(7, 1), AggregateRow::new(42, 1)]);
    }

    #[test]
    fn test_unwind_then_group() {
        let docs = vec![
            json!({"participantId": "p1", "value": ["E11", "I10"]}),
            json!({"participantId": "p2", "value": "I10"}),
            json!({"participantId": "p3", "value": []}),
        ];
        let pipeline = Pipeline::new().unwind("value").group_by("value");
        let rows = into_rows(run_pipeline(docs, &pipeline).unwrap()).unwrap();
        assert_eq!(rows, vec![AggregateRow::new("E11", 1), AggregateRow::new("I10", 2)]);
    }

    #[test]
    fn test_regex_is_case_insensitive() {
        let filter = CompiledFilter::compile(&Filter::regex("value", "N/A", true)).unwrap();
        assert!(filter.matches(&json!({"value": "n/a"})));
        assert!(!filter.matches(&json!({"value": 3})));
    }

    #[test]
    fn test_array_values_match_any_element() {
        let filter = CompiledFilter::compile(&Filter::eq("value", "E11")).unwrap();
        assert!(filter.matches(&json!({"value": ["I10", "E11"]})));
    }

    #[test]
    fn test_ungrouped_output_is_rejected() {
        assert!(into_rows(docs()).is_err());
    }
}
