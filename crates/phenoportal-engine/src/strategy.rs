//! Query strategy selection

use phenoportal_model::{FieldDefinition, FieldType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation strategy for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    TextSearch,
    Bucket,
    Medical,
    Normal,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryType::TextSearch => "TEXT_SEARCH",
            QueryType::Bucket => "BUCKET",
            QueryType::Medical => "MEDICAL",
            QueryType::Normal => "NORMAL",
        };
        f.write_str(name)
    }
}

/// Classify a field; the first matching rule wins
///
/// A bucketed histogram that is also flagged medical goes to `Medical`,
/// never `Bucket`.
pub fn classify(field: &FieldDefinition) -> QueryType {
    if field.field_type == FieldType::TextSearch {
        QueryType::TextSearch
    } else if field.field_type == FieldType::Histogram && field.has_bucket_flag() && !field.is_medical() {
        QueryType::Bucket
    } else if field.is_medical() {
        QueryType::Medical
    } else {
        QueryType::Normal
    }
}
