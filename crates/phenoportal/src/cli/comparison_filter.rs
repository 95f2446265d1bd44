//! Comparison filter toggles on workgroup patients

use super::dataset::Session;
use super::output::{self, OutputFormat};
use anyhow::Result;
use phenoportal_engine::FilterChange;
use phenoportal_model::FieldId;

/// Toggle command configuration
#[derive(Debug, Clone)]
pub struct ToggleConfig {
    pub field: String,
    pub patient: String,
    pub change: FilterChange,
    /// Write the updated record back into the dataset file
    pub save: bool,
}

/// Add or remove a comparison filter and render the updated patient
pub async fn run_toggle(session: &mut Session, config: &ToggleConfig, format: OutputFormat) -> Result<String> {
    let field = FieldId::from(config.field.as_str());
    let patient = match config.change {
        FilterChange::Add => {
            session
                .engine()
                .add_comparison_filter(&field, &config.patient)
                .await?
        }
        FilterChange::Remove => {
            session
                .engine()
                .remove_comparison_filter(&field, &config.patient)
                .await?
        }
    };
    if config.save {
        session.persist_patient(&patient)?;
    }
    output::render(&patient, None, format)
}
