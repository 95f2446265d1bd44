//! Comparison filter toggles on workgroup patients

use phenoportal_diagnostics::{PortalError, Result};
use phenoportal_model::{FieldDefinitionStore, FieldId, WorkgroupPatient, WorkgroupPatientStore};

/// Change applied to a patient's comparison filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterChange {
    Add,
    Remove,
}

/// Resolve both records, apply `change` idempotently and persist the record
pub async fn apply_filter_change(
    fields: &dyn FieldDefinitionStore,
    patients: &dyn WorkgroupPatientStore,
    field_id: &FieldId,
    workgroup_patient_id: &str,
    change: FilterChange,
) -> Result<WorkgroupPatient> {
    if fields.find_by_id(field_id).await?.is_none() {
        return Err(PortalError::field_not_found(field_id.as_str()));
    }
    let mut patient = patients
        .find_by_id(workgroup_patient_id)
        .await?
        .ok_or_else(|| PortalError::workgroup_patient_not_found(workgroup_patient_id))?;

    let changed = match change {
        FilterChange::Add => patient.add_comparison_filter(field_id),
        FilterChange::Remove => patient.remove_comparison_filter(field_id),
    };
    log::debug!(
        "{:?} filter {} on workgroup patient {}: {}",
        change,
        field_id,
        workgroup_patient_id,
        if changed { "changed" } else { "unchanged" }
    );
    Ok(patients.save(patient).await?)
}
