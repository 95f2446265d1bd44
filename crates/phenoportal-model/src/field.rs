//! Phenotype field definitions

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Identifier of a phenotype field
///
/// Field ids are numeric in most deployments and strings in some, so both
/// forms are accepted on deserialization and normalised to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FieldId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for FieldId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// Display type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Bars,
    Histogram,
    TextSearch,
    NestedList,
    #[serde(other)]
    Other,
}

/// Type of the values stored for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Continuous,
    Integer,
    Date,
    Time,
    #[serde(rename = "Categorical single")]
    CategoricalSingle,
    #[serde(rename = "Categorical multiple")]
    CategoricalMultiple,
    Text,
    Compound,
    #[serde(other)]
    Unknown,
}

impl ValueType {
    /// Whether values are calendar dates or timestamps
    pub fn is_temporal(&self) -> bool {
        matches!(self, ValueType::Date | ValueType::Time)
    }
}

/// Description item type that routes a field to the medical-term search path
pub const MEDICAL_ITEM_TYPE: &str = "Medical";

/// Definition of one phenotype field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: FieldId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub value_type: ValueType,
    #[serde(default, rename = "bucket300")]
    pub bucket_300: bool,
    #[serde(default, rename = "bucket500")]
    pub bucket_500: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_item_type: Option<String>,
    /// Raw value code to display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<IndexMap<String, String>>,
    /// Taxonomy tree backing a nested-list field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coding: Option<String>,
}

impl FieldDefinition {
    pub fn new(id: impl Into<FieldId>, field_type: FieldType, value_type: ValueType) -> Self {
        Self {
            id: id.into(),
            name: None,
            field_type,
            value_type,
            bucket_300: false,
            bucket_500: false,
            description_item_type: None,
            values: None,
            coding: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_values<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values = Some(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_coding(mut self, coding: impl Into<String>) -> Self {
        self.coding = Some(coding.into());
        self
    }

    pub fn with_buckets(mut self, bucket_300: bool, bucket_500: bool) -> Self {
        self.bucket_300 = bucket_300;
        self.bucket_500 = bucket_500;
        self
    }

    pub fn with_description_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.description_item_type = Some(item_type.into());
        self
    }

    pub fn is_medical(&self) -> bool {
        self.description_item_type.as_deref() == Some(MEDICAL_ITEM_TYPE)
    }

    pub fn is_nested_list(&self) -> bool {
        self.field_type == FieldType::NestedList
    }

    pub fn has_bucket_flag(&self) -> bool {
        self.bucket_300 || self.bucket_500
    }

    pub fn has_value_labels(&self) -> bool {
        self.values.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// Display label for a raw value code, or the code itself when unmapped
    pub fn find_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.values
            .as_ref()
            .and_then(|values| values.get(key))
            .map(String::as_str)
            .unwrap_or(key)
    }

    /// Display label for a raw aggregate key
    pub fn label_for(&self, key: &Value) -> String {
        let text = key_text(key);
        self.find_label(&text).to_string()
    }
}

/// Text form of a raw value used for label lookup and key matching
pub fn key_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}
