//! Phenotype portal filter and comparison engine
//!
//! This crate bundles the portal crates:
//! - Field definitions, result types and store traits (`model`)
//! - The filter query and comparison engine (`engine`)
//! - Error types and codes (`diagnostics`)
//!
//! # Example
//!
//! ```ignore
//! use phenoportal::{EngineOptions, FilterDataQuery, FilterEngine};
//! use phenoportal::model::memory::Dataset;
//!
//! let stores = Dataset::from_json(&json)?.into_stores();
//! let engine = FilterEngine::from_memory(stores, EngineOptions::default())?;
//! let result = engine.get_filter_data(&FilterDataQuery::new("31")).await?;
//! ```

// Re-export all public APIs from internal crates
pub use phenoportal_diagnostics as diagnostics;
pub use phenoportal_engine as engine;
pub use phenoportal_model as model;

// Convenience re-exports
pub use phenoportal_diagnostics::{PortalError, Result};
pub use phenoportal_engine::{EngineOptions, FilterDataQuery, FilterEngine};
pub use phenoportal_model::{FieldId, FilterDataResult};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
