//! Filter data and raw value commands

use super::dataset::Session;
use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use phenoportal_diagnostics::PortalError;
use phenoportal_engine::FilterDataQuery;
use phenoportal_model::{FieldId, FieldValueStore, Filter, value_paths};
use serde_json::Value;

/// Filter command configuration
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub field: String,
    pub instances: Vec<String>,
    /// Population restriction; `None` means the whole universe
    pub participants: Option<Vec<String>>,
    pub term: Option<String>,
    /// Page size and one-based page number
    pub page: Option<(u64, u64)>,
    /// Bucket boundaries as JSON literals
    pub buckets: Vec<String>,
    pub raw: bool,
}

impl FilterConfig {
    /// Build the engine query described by this configuration
    pub fn to_query(&self) -> FilterDataQuery {
        let mut query = FilterDataQuery::new(self.field.as_str());
        if !self.instances.is_empty() {
            query = query.with_instances(self.instances.iter().cloned());
        }
        if let Some(participants) = &self.participants {
            query = query.with_participants(participants.iter().cloned());
        }
        if let Some(term) = &self.term {
            query = query.with_term(term.clone());
        }
        if let Some((size, number)) = self.page {
            query = query.with_pagination(size, number);
        }
        if !self.buckets.is_empty() {
            let buckets = self.buckets.iter().map(|b| parse_literal(b)).collect();
            query = query.with_buckets(buckets);
        }
        if self.raw {
            query = query.skip_transform();
        }
        query
    }
}

/// Population from the command line: `nobody` or a blank list restricts to
/// no participant, no flag at all leaves the query unrestricted
pub fn population_arg(participants: Option<Vec<String>>, nobody: bool) -> Option<Vec<String>> {
    if nobody {
        return Some(Vec::new());
    }
    participants.map(|ids| {
        ids.into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect()
    })
}

/// Numbers and JSON literals parse as such; anything else is a string
fn parse_literal(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Run a filter-data query and render its result
pub async fn run_filter(session: &Session, config: &FilterConfig, format: OutputFormat) -> Result<String> {
    let query = config.to_query();
    let result = session.engine().get_filter_data(&query).await?;
    output::render(&result, output::filter_table(&result), format)
}

/// Values command configuration
#[derive(Debug, Clone, Default)]
pub struct ValuesConfig {
    pub field: String,
    pub instance: Option<String>,
    pub participant: Option<String>,
}

/// List the raw value rows of one field
pub async fn run_values(session: &Session, config: &ValuesConfig, format: OutputFormat) -> Result<String> {
    let field = FieldId::from(config.field.as_str());
    let mut parts = Vec::new();
    if let Some(instance) = &config.instance {
        parts.push(Filter::eq(value_paths::INSTANCE, instance.as_str()));
    }
    if let Some(participant) = &config.participant {
        parts.push(Filter::eq(value_paths::PARTICIPANT_ID, participant.as_str()));
    }

    let rows = session
        .stores()
        .fields
        .query(&field, &Filter::and(parts))
        .await
        .map_err(PortalError::from)
        .with_context(|| format!("Failed to read values of field {}", field))?;
    output::render(&rows, None, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_query_from_config() {
        let config = FilterConfig {
            field: "21001".to_string(),
            instances: vec!["0".to_string()],
            participants: Some(vec!["p1".to_string()]),
            page: Some((10, 2)),
            buckets: vec!["20".to_string(), "30.5".to_string(), "2020-01-01".to_string()],
            ..Default::default()
        };
        let query = config.to_query();
        assert_eq!(query.instances, Some(vec!["0".to_string()]));
        assert_eq!(query.participant_ids, Some(vec!["p1".to_string()]));
        assert_eq!(query.pagination.map(|p| p.skip()), Some(10));
        assert_eq!(
            query.buckets,
            Some(vec![json!(20), json!(30.5), json!("2020-01-01")])
        );
        assert!(!query.skip_transform);
    }

    #[test]
    fn test_population_arg() {
        assert_eq!(population_arg(None, false), None);
        assert_eq!(population_arg(None, true), Some(vec![]));
        assert_eq!(population_arg(Some(vec![String::new()]), false), Some(vec![]));
        assert_eq!(
            population_arg(Some(vec![" p1".to_string(), "p2".to_string()]), false),
            Some(vec!["p1".to_string(), "p2".to_string()])
        );
    }

    #[test]
    fn test_participants_none_means_unrestricted() {
        let config = FilterConfig {
            field: "31".to_string(),
            ..Default::default()
        };
        assert_eq!(config.to_query().participant_ids, None);
    }
}
