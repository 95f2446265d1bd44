//! Filter-data query input

use phenoportal_diagnostics::{PP0002, PortalError, Result};
use phenoportal_model::FieldId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page of a text-search result; page numbers start at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_size: u64,
    #[serde(default = "first_page")]
    pub page_number: u64,
}

fn first_page() -> u64 {
    1
}

impl Pagination {
    pub fn new(page_size: u64, page_number: u64) -> Self {
        Self {
            page_size,
            page_number,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(PortalError::illegal_argument(PP0002, "page size must be at least 1"));
        }
        if self.page_number == 0 {
            return Err(PortalError::illegal_argument(PP0002, "page numbers start at 1"));
        }
        Ok(())
    }

    pub fn skip(&self) -> u64 {
        self.page_number.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Request for the aggregated data of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDataQuery {
    pub field: FieldId,
    /// Restrict to these instance identifiers
    #[serde(default)]
    pub instances: Option<Vec<String>>,
    /// Restrict to this participant population
    #[serde(default)]
    pub participant_ids: Option<Vec<String>>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub term: Option<String>,
    /// Explicit bucket boundaries, replacing the computed ones
    #[serde(default)]
    pub buckets: Option<Vec<Value>>,
    /// Return raw rows with totals, without labels, sorting or trees
    #[serde(default)]
    pub skip_transform: bool,
}

impl FilterDataQuery {
    pub fn new(field: impl Into<FieldId>) -> Self {
        Self {
            field: field.into(),
            instances: None,
            participant_ids: None,
            pagination: None,
            term: None,
            buckets: None,
            skip_transform: false,
        }
    }

    pub fn with_instances<I, S>(mut self, instances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instances = Some(instances.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participant_ids = Some(participants.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_pagination(mut self, page_size: u64, page_number: u64) -> Self {
        self.pagination = Some(Pagination::new(page_size, page_number));
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn with_buckets(mut self, buckets: Vec<Value>) -> Self {
        self.buckets = Some(buckets);
        self
    }

    pub fn skip_transform(mut self) -> Self {
        self.skip_transform = true;
        self
    }

    /// Reject malformed input before any store is touched
    pub fn validate(&self) -> Result<()> {
        if self.field.is_empty() {
            return Err(PortalError::missing_identifier("field"));
        }
        if let Some(pagination) = &self.pagination {
            pagination.validate()?;
        }
        Ok(())
    }

    /// Search term with surrounding whitespace removed, `None` when blank
    pub fn trimmed_term(&self) -> Option<&str> {
        self.term.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_from_page() {
        assert_eq!(Pagination::new(20, 1).skip(), 0);
        assert_eq!(Pagination::new(20, 3).skip(), 40);
    }

    #[test]
    fn test_validate() {
        assert!(FilterDataQuery::new("31").validate().is_ok());
        assert!(FilterDataQuery::new("").validate().is_err());
        let err = FilterDataQuery::new("31")
            .with_pagination(0, 1)
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), PP0002);
    }

    #[test]
    fn test_deserialize_request() {
        let query: FilterDataQuery = serde_json::from_str(
            r#"{"field": 20001, "term": " lung ", "pagination": {"pageSize": 10}}"#,
        )
        .unwrap();
        assert_eq!(query.field, FieldId::from("20001"));
        assert_eq!(query.trimmed_term(), Some("lung"));
        assert_eq!(query.pagination, Some(Pagination::new(10, 1)));
        assert!(!query.skip_transform);
    }
}
