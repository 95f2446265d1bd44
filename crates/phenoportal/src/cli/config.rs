//! Engine options loaded from a config file and command-line flags

use anyhow::{Context, Result};
use phenoportal_engine::EngineOptions;
use std::fs;
use std::path::Path;

/// Option values given on the command line; unset flags keep the file value
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub flatten_tree: bool,
    pub raw_bars_keys: bool,
    pub bucket_steps: Option<usize>,
    pub min_medical_term_len: Option<usize>,
}

impl OptionOverrides {
    fn apply(&self, mut options: EngineOptions) -> EngineOptions {
        if self.flatten_tree {
            options.flatten_tree = true;
        }
        if self.raw_bars_keys {
            options.normalize_bars_keys = false;
        }
        if let Some(steps) = self.bucket_steps {
            options.bucket_steps = steps;
        }
        if let Some(len) = self.min_medical_term_len {
            options.min_medical_term_len = len;
        }
        options
    }
}

/// Read options from `path` (JSON, camelCase keys) or start from the defaults
pub fn load_options(path: Option<&Path>, overrides: &OptionOverrides) -> Result<EngineOptions> {
    let base = match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        }
        None => EngineOptions::default(),
    };

    let options = overrides.apply(base);
    options.validate()?;
    log::debug!("engine options: {:?}", options);
    Ok(options)
}
