//! Dataset files and the engine session built on them

use anyhow::{Context, Result};
use phenoportal_engine::{EngineOptions, FilterEngine};
use phenoportal_model::WorkgroupPatient;
use phenoportal_model::memory::{Dataset, MemoryStores};
use std::fs;
use std::path::{Path, PathBuf};

/// A loaded dataset together with the engine answering queries over it
pub struct Session {
    path: PathBuf,
    dataset: Dataset,
    stores: MemoryStores,
    engine: FilterEngine,
}

impl Session {
    /// Load the dataset at `path` and build an engine over in-memory stores
    pub fn open(path: &Path, options: EngineOptions) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;
        let dataset = Dataset::from_json(&content)
            .with_context(|| format!("Invalid dataset file: {}", path.display()))?;
        log::debug!(
            "loaded {} fields and {} tier rows from {}",
            dataset.fields.len(),
            dataset.tiers.len(),
            path.display()
        );

        let stores = dataset.clone().into_stores();
        let engine = FilterEngine::from_memory(stores.clone(), options)?;
        Ok(Self {
            path: path.to_path_buf(),
            dataset,
            stores,
            engine,
        })
    }

    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    pub fn stores(&self) -> &MemoryStores {
        &self.stores
    }

    /// Replace the stored copy of `patient` and rewrite the dataset file
    pub fn persist_patient(&mut self, patient: &WorkgroupPatient) -> Result<()> {
        match self
            .dataset
            .workgroup_patients
            .iter_mut()
            .find(|p| p.id == patient.id)
        {
            Some(existing) => *existing = patient.clone(),
            None => self.dataset.workgroup_patients.push(patient.clone()),
        }

        let content =
            serde_json::to_string_pretty(&self.dataset).context("Failed to serialize dataset")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write dataset file: {}", self.path.display()))?;
        log::info!("saved workgroup patient {} to {}", patient.id, self.path.display());
        Ok(())
    }
}
