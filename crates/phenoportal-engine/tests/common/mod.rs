//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use phenoportal_engine::{EngineOptions, FilterEngine};
use phenoportal_model::memory::{Dataset, MemoryStores};

pub const PORTAL: &str = include_str!("../fixtures/portal.json");

pub fn stores() -> MemoryStores {
    Dataset::from_json(PORTAL)
        .expect("fixture dataset parses")
        .into_stores()
}

pub fn engine() -> FilterEngine {
    engine_with(EngineOptions::default())
}

pub fn engine_with(options: EngineOptions) -> FilterEngine {
    FilterEngine::from_memory(stores(), options).expect("fixture engine builds")
}
