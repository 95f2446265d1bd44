//! Phenotype Filter Query Engine
//!
//! This crate turns a field definition plus optional population constraints
//! into aggregated, labelled counts. It provides:
//!
//! - **Strategy selection**: text search, bucketed histogram, medical term
//!   search or plain grouping, chosen from the field definition
//! - **Bucket boundaries**: numeric and day-precision date ranges computed
//!   from the observed minimum and maximum
//! - **Aggregate execution**: pipelines run against the field value store
//! - **Result reshaping**: labels, key ordering and taxonomy trees with
//!   rolled-up counts
//! - **Comparisons**: observed and not-observed values over gene- or
//!   variant-derived populations, variant genotype/ACMG distributions and
//!   per-participant tier distributions
//!
//! # Example
//!
//! ```ignore
//! use phenoportal_engine::{EngineOptions, FilterDataQuery, FilterEngine};
//! use phenoportal_model::memory::Dataset;
//!
//! let stores = Dataset::from_json(&json)?.into_stores();
//! let engine = FilterEngine::from_memory(stores, EngineOptions::default())?;
//!
//! let query = FilterDataQuery::new("31").with_participants(["p1", "p2"]);
//! let result = engine.get_filter_data(&query).await?;
//! ```
//!
//! # Architecture
//!
//! - `FilterEngine`: owns the store handles and runs every public operation
//! - `strategy`: maps a field definition to a `QueryType`
//! - `plan`: builds the pipeline of each strategy
//! - `executor`: runs pipelines, computing bucket boundaries on demand
//! - `reshape` and `tree`: build the final result
//! - `comparison` and `filters`: comparison aggregates and filter toggles

pub mod boundary;
pub mod comparison;
pub mod engine;
pub mod executor;
pub mod filters;
pub mod options;
pub mod plan;
pub mod population;
pub mod query;
pub mod reshape;
pub mod strategy;
pub mod tree;

// Re-export main types
pub use boundary::{boundaries_for_date, boundaries_for_number};
pub use comparison::ComparisonEngine;
pub use engine::{FilterEngine, FilterEngineBuilder};
pub use executor::{AggregateExecutor, Aggregation};
pub use filters::FilterChange;
pub use options::{EngineOptions, EngineOptionsBuilder};
pub use query::{FilterDataQuery, Pagination};
pub use reshape::ResultReshaper;
pub use strategy::{QueryType, classify};
pub use tree::TaxonomyTree;
