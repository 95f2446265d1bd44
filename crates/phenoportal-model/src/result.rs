//! Aggregate, tree and comparison result types

use crate::field::FieldId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw `(key, count)` row produced by a grouping aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: Value,
    pub count: u64,
}

impl AggregateRow {
    pub fn new(key: impl Into<Value>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Sum of counts over a set of aggregate rows
pub fn total_count(rows: &[AggregateRow]) -> u64 {
    rows.iter().map(|row| row.count).sum()
}

/// One reshaped aggregate row with its result-set total and display label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub key: Value,
    pub count: u64,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl AggregateResult {
    pub fn new(key: Value, count: u64, total: u64, label: Option<String>) -> Self {
        Self {
            key,
            count,
            total,
            label,
        }
    }
}

/// Persisted taxonomy node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTreeNode {
    /// Code of this node within its taxonomy
    pub coding: String,
    pub meaning: String,
    #[serde(default = "default_selectable")]
    pub selectable: bool,
    #[serde(default)]
    pub children: Vec<RawTreeNode>,
}

fn default_selectable() -> bool {
    true
}

impl RawTreeNode {
    pub fn new(coding: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            coding: coding.into(),
            meaning: meaning.into(),
            selectable: true,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<RawTreeNode>) -> Self {
        self.children = children;
        self
    }

    pub fn unselectable(mut self) -> Self {
        self.selectable = false;
        self
    }
}

/// Taxonomy node with rolled-up counts, rendered as a nested tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedTreeNode {
    pub code: String,
    pub label: String,
    pub count: u64,
    pub total: u64,
    pub selectable: bool,
    pub children: Vec<NestedTreeNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
}

/// Taxonomy node with rolled-up counts, rendered as a flat map entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatTreeNode {
    pub code: String,
    pub label: String,
    pub count: u64,
    pub total: u64,
    pub selectable: bool,
    /// Codes of the direct children
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
}

/// Response of a filter-data query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterDataResult {
    Rows(Vec<AggregateResult>),
    Tree(Vec<NestedTreeNode>),
    FlatTree(IndexMap<String, FlatTreeNode>),
}

impl FilterDataResult {
    pub fn empty() -> Self {
        Self::Rows(Vec::new())
    }

    pub fn rows(&self) -> Option<&[AggregateResult]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn tree(&self) -> Option<&[NestedTreeNode]> {
        match self {
            Self::Tree(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn flat_tree(&self) -> Option<&IndexMap<String, FlatTreeNode>> {
        match self {
            Self::FlatTree(nodes) => Some(nodes),
            _ => None,
        }
    }
}

/// Observed versus not-observed label counts for one field over a population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Size of the participant population
    pub total: u64,
    pub field_id: FieldId,
    pub existing_values: IndexMap<String, u64>,
    pub not_existing_values: IndexMap<String, u64>,
}

/// Genotype and ACMG verdict distributions for one variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantGraphData {
    pub genotypes: IndexMap<String, u64>,
    pub acmg_verdicts: IndexMap<String, u64>,
}

/// Number of distinct markers per tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDistribution {
    pub tier1: u64,
    pub tier2: u64,
    pub tier3: u64,
}
