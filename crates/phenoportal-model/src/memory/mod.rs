//! In-memory stores
//!
//! These stores evaluate pipelines directly over `serde_json::Value`
//! documents. They back the test suites and the command-line tool, where a
//! whole portal dataset is loaded from a single JSON file.

mod dataset;
mod eval;
mod stores;

pub use dataset::{Dataset, MemoryStores};
pub use stores::*;
