//! Engine options

use phenoportal_diagnostics::{PortalError, Result};
use serde::{Deserialize, Serialize};

/// Number of equal steps a bucketed range is divided into
pub const DEFAULT_BUCKET_STEPS: usize = 50;

/// Shortest medical search term that reaches the term store
pub const DEFAULT_MIN_MEDICAL_TERM_LEN: usize = 2;

/// Options that shape query planning and result rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Render nested-list results as a flat `code -> node` map
    pub flatten_tree: bool,
    /// Cast `Bars` keys to numbers before sorting; when false they are
    /// ordered by their leading integer instead
    pub normalize_bars_keys: bool,
    pub bucket_steps: usize,
    pub min_medical_term_len: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            flatten_tree: false,
            normalize_bars_keys: true,
            bucket_steps: DEFAULT_BUCKET_STEPS,
            min_medical_term_len: DEFAULT_MIN_MEDICAL_TERM_LEN,
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_steps == 0 {
            return Err(PortalError::config("bucketSteps must be at least 1"));
        }
        Ok(())
    }
}

/// Builder for [`EngineOptions`]
#[derive(Debug, Default)]
pub struct EngineOptionsBuilder {
    options: EngineOptions,
}

impl EngineOptionsBuilder {
    pub fn flatten_tree(mut self, flatten: bool) -> Self {
        self.options.flatten_tree = flatten;
        self
    }

    pub fn normalize_bars_keys(mut self, normalize: bool) -> Self {
        self.options.normalize_bars_keys = normalize;
        self
    }

    pub fn bucket_steps(mut self, steps: usize) -> Self {
        self.options.bucket_steps = steps;
        self
    }

    pub fn min_medical_term_len(mut self, len: usize) -> Self {
        self.options.min_medical_term_len = len;
        self
    }

    pub fn build(self) -> Result<EngineOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert!(!options.flatten_tree);
        assert!(options.normalize_bars_keys);
        assert_eq!(options.bucket_steps, 50);
        assert_eq!(options.min_medical_term_len, 2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: EngineOptions = serde_json::from_str(r#"{"flattenTree": true}"#).unwrap();
        assert!(options.flatten_tree);
        assert_eq!(options.bucket_steps, DEFAULT_BUCKET_STEPS);
    }

    #[test]
    fn test_zero_steps_rejected() {
        let err = EngineOptions::builder().bucket_steps(0).build().unwrap_err();
        assert!(err.code().is_config_error());
    }
}
