//! Pipeline planning for each query strategy

use crate::query::Pagination;
use crate::reshape::numeric_key;
use phenoportal_model::{
    FieldDefinition, Filter, Pipeline, SortKey, group_paths, value_paths,
};
use serde_json::Value;

/// Instance and population restriction shared by every strategy
pub fn base_filter(instances: Option<&[String]>, population: Option<Filter>) -> Filter {
    Filter::and(
        instances
            .filter(|i| !i.is_empty())
            .map(|i| Filter::is_in(value_paths::INSTANCE, i.iter().cloned()))
            .into_iter()
            .chain(population),
    )
}

/// Plain grouping by value
pub fn normal(base: Filter) -> Pipeline {
    Pipeline::new()
        .matching(base)
        .unwind(value_paths::VALUE)
        .group_by(value_paths::VALUE)
}

/// Grouping restricted to an exact set of values
pub fn restricted_to_values(base: Filter, values: Vec<Value>) -> Pipeline {
    Pipeline::new()
        .matching(Filter::and([
            base,
            Filter::is_in(value_paths::VALUE, values.iter().cloned()),
        ]))
        .unwind(value_paths::VALUE)
        .matching(Filter::is_in(value_paths::VALUE, values))
        .group_by(value_paths::VALUE)
}

/// Value filter for a text-search term
///
/// Fields with a value-label map match the term against labels and filter by
/// the matching raw codes, in both text and numeric form; other fields match
/// the term against raw values.
pub fn term_filter(field: &FieldDefinition, term: &str) -> Filter {
    match field.values.as_ref().filter(|v| !v.is_empty()) {
        Some(labels) => {
            let needle = term.to_lowercase();
            let keys: Vec<Value> = labels
                .iter()
                .filter(|(_, label)| label.to_lowercase().contains(&needle))
                .flat_map(|(key, _)| {
                    let text = Value::String(key.clone());
                    let number = numeric_key(&text);
                    std::iter::once(text).chain(number)
                })
                .collect();
            Filter::is_in(value_paths::VALUE, keys)
        }
        None => Filter::regex(value_paths::VALUE, regex::escape(term), true),
    }
}

/// Grouped text search, paginated after grouping
pub fn text_search(base: Filter, term: Option<Filter>, pagination: Option<Pagination>) -> Pipeline {
    let mut pipeline = Pipeline::new()
        .matching(base)
        .unwind(value_paths::VALUE);
    if let Some(term) = term {
        pipeline = pipeline.matching(term);
    }
    pipeline = pipeline
        .group_by(value_paths::VALUE)
        .sort(vec![SortKey::desc(group_paths::COUNT), SortKey::asc(group_paths::KEY)]);
    match pagination {
        Some(page) => pipeline.skip(page.skip()).limit(page.page_size),
        None => pipeline,
    }
}

/// Single-row pipeline whose key is the smallest (`ascending`) or largest value
pub fn extreme_value(base: Filter, ascending: bool) -> Pipeline {
    let order = if ascending {
        SortKey::asc(value_paths::VALUE)
    } else {
        SortKey::desc(value_paths::VALUE)
    };
    Pipeline::new()
        .matching(Filter::and([base, Filter::exists(value_paths::VALUE)]))
        .unwind(value_paths::VALUE)
        .sort(vec![order])
        .limit(1)
        .group_by(value_paths::VALUE)
}

/// Bucketed grouping with a trailing catch-all bucket
pub fn bucketed(base: Filter, boundaries: Vec<Value>) -> Pipeline {
    Pipeline::new()
        .matching(base)
        .unwind(value_paths::VALUE)
        .bucket(value_paths::VALUE, boundaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phenoportal_model::{FieldType, Stage, ValueType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_base_filter_combines_restrictions() {
        let instances = vec!["0".to_string(), "2".to_string()];
        let population = Filter::is_in(value_paths::PARTICIPANT_ID, ["p1"]);
        assert_eq!(
            base_filter(Some(&instances), Some(population.clone())),
            Filter::And(vec![
                Filter::is_in(value_paths::INSTANCE, ["0", "2"]),
                population,
            ])
        );
        assert_eq!(base_filter(Some(&[]), None), Filter::All);
    }

    #[test]
    fn test_term_filter_matches_labels() {
        let field = FieldDefinition::new("1", FieldType::TextSearch, ValueType::Text)
            .with_values([("1", "Lung cancer"), ("2", "Breast cancer"), ("3", "Asthma")]);
        assert_eq!(
            term_filter(&field, "CANCER"),
            Filter::is_in(value_paths::VALUE, [json!("1"), json!(1), json!("2"), json!(2)])
        );
    }

    #[test]
    fn test_term_filter_escapes_raw_terms() {
        let field = FieldDefinition::new("1", FieldType::TextSearch, ValueType::Text);
        assert_eq!(
            term_filter(&field, "a+b"),
            Filter::regex(value_paths::VALUE, r"a\+b", true)
        );
    }

    #[test]
    fn test_text_search_paginates_after_grouping() {
        let pipeline = text_search(Filter::All, None, Some(Pagination::new(10, 3)));
        let stages = pipeline.stages();
        assert!(matches!(stages[1], Stage::Group { .. }));
        assert_eq!(stages[stages.len() - 2], Stage::Skip(20));
        assert_eq!(stages[stages.len() - 1], Stage::Limit(10));
    }
}
