//! Aggregation pipeline description
//!
//! A pipeline is an ordered list of stages evaluated over documents. Stages
//! before a grouping stage see stored documents; grouping stages emit
//! `{ "key": .., "count": .. }` documents which later stages sort, skip and
//! limit. Every store accepting a [`Pipeline`] returns the final documents as
//! [`AggregateRow`](crate::AggregateRow)s.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Document paths of per-field value rows
pub mod value_paths {
    pub const PARTICIPANT_ID: &str = "participantId";
    pub const INSTANCE: &str = "instance";
    pub const ARRAY: &str = "array";
    pub const VALUE: &str = "value";
}

/// Paths of documents emitted by grouping stages
pub mod group_paths {
    pub const KEY: &str = "key";
    pub const COUNT: &str = "count";
}

/// Key of the trailing bucket that catches values outside every boundary
pub const OTHER_BUCKET: &str = "Other";

/// Document predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    /// Matches every document
    All,
    And(Vec<Filter>),
    Eq { path: String, value: Value },
    /// Membership; an empty list matches nothing
    In { path: String, values: Vec<Value> },
    Regex {
        path: String,
        pattern: String,
        case_insensitive: bool,
    },
    /// Path present and not null
    Exists { path: String },
}

impl Filter {
    pub fn eq(path: &str, value: impl Into<Value>) -> Self {
        Self::Eq {
            path: path.to_string(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(path: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            path: path.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn regex(path: &str, pattern: impl Into<String>, case_insensitive: bool) -> Self {
        Self::Regex {
            path: path.to_string(),
            pattern: pattern.into(),
            case_insensitive,
        }
    }

    pub fn exists(path: &str) -> Self {
        Self::Exists {
            path: path.to_string(),
        }
    }

    /// Conjunction that drops `All` and flattens nested conjunctions
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.remove(0),
            _ => Filter::And(parts),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub path: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn asc(path: &str) -> Self {
        Self {
            path: path.to_string(),
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(path: &str) -> Self {
        Self {
            path: path.to_string(),
            order: SortOrder::Descending,
        }
    }
}

/// Pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Match(Filter),
    /// Emit one document per element of an array at `path`
    Unwind { path: String },
    /// Group by the given paths and count; a single path yields its value as
    /// key, several paths yield an array key
    Group { by: Vec<String> },
    /// Group values at `path` into `[b(i), b(i+1))` ranges keyed by the lower
    /// boundary; values outside every range go to `default`
    Bucket {
        path: String,
        boundaries: Vec<Value>,
        default: String,
    },
    Sort(Vec<SortKey>),
    Skip(u64),
    Limit(u64),
}

/// Ordered list of stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a match stage; `Filter::All` adds nothing
    pub fn matching(mut self, filter: Filter) -> Self {
        if filter != Filter::All {
            self.stages.push(Stage::Match(filter));
        }
        self
    }

    pub fn unwind(mut self, path: &str) -> Self {
        self.stages.push(Stage::Unwind {
            path: path.to_string(),
        });
        self
    }

    pub fn group_by(mut self, path: &str) -> Self {
        self.stages.push(Stage::Group {
            by: vec![path.to_string()],
        });
        self
    }

    pub fn group_by_all(mut self, paths: &[&str]) -> Self {
        self.stages.push(Stage::Group {
            by: paths.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn bucket(mut self, path: &str, boundaries: Vec<Value>) -> Self {
        self.stages.push(Stage::Bucket {
            path: path.to_string(),
            boundaries,
            default: OTHER_BUCKET.to_string(),
        });
        self
    }

    pub fn sort(mut self, keys: Vec<SortKey>) -> Self {
        self.stages.push(Stage::Sort(keys));
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        if n > 0 {
            self.stages.push(Stage::Skip(n));
        }
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.stages.push(Stage::Limit(n));
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Resolve a dotted path inside a document
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order over JSON values: null < numbers < strings < objects < arrays < booleans
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(xs), Value::Array(ys)) => xs
            .iter()
            .zip(ys.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| xs.len().cmp(&ys.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_and_flattens() {
        let filter = Filter::and([
            Filter::All,
            Filter::and([Filter::exists("a"), Filter::exists("b")]),
            Filter::eq("c", 1),
        ]);
        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::exists("a"),
                Filter::exists("b"),
                Filter::eq("c", 1),
            ])
        );
        assert_eq!(Filter::and([Filter::All]), Filter::All);
        assert_eq!(Filter::and([Filter::exists("a")]), Filter::exists("a"));
    }

    #[test]
    fn test_matching_all_adds_no_stage() {
        let pipeline = Pipeline::new().matching(Filter::All).group_by("value");
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn test_lookup_paths() {
        let doc = json!({"a": {"b": [10, 20]}});
        assert_eq!(lookup(&doc, "a.b.1"), Some(&json!(20)));
        assert_eq!(lookup(&doc, "a.c"), None);
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("2"), &json!("10")), Ordering::Greater);
        assert_eq!(compare_values(&json!(5), &json!("1")), Ordering::Less);
        assert_eq!(compare_values(&json!(null), &json!(0)), Ordering::Less);
        assert_eq!(
            compare_values(&json!(["TIER1", "m2"]), &json!(["TIER1", "m1"])),
            Ordering::Greater
        );
    }
}
