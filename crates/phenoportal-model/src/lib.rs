//! Phenoportal data model
//!
//! This crate provides:
//! - Phenotype field definitions and value-label translation
//! - Aggregate, tree and comparison result types
//! - Genomic tier, marker and location records
//! - An aggregation pipeline description shared by all stores
//! - Async store traits for every backing collection
//! - In-memory store implementations

pub mod field;
pub mod genomics;
pub mod memory;
pub mod pipeline;
pub mod provider;
pub mod result;
pub mod workgroup;

pub use field::*;
pub use genomics::*;
pub use pipeline::*;
pub use provider::*;
pub use result::*;
pub use workgroup::*;
