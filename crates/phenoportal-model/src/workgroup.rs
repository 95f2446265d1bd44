//! Workgroup-patient records

use crate::field::FieldId;
use serde::{Deserialize, Serialize};

/// A patient as seen from one workgroup, with its active comparison filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkgroupPatient {
    pub id: String,
    pub workgroup_id: String,
    pub patient_id: String,
    #[serde(default)]
    pub comparison_filters: Vec<FieldId>,
}

impl WorkgroupPatient {
    pub fn new(
        id: impl Into<String>,
        workgroup_id: impl Into<String>,
        patient_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            workgroup_id: workgroup_id.into(),
            patient_id: patient_id.into(),
            comparison_filters: Vec::new(),
        }
    }

    /// Add a comparison filter; returns false if it was already active
    pub fn add_comparison_filter(&mut self, field_id: &FieldId) -> bool {
        if self.comparison_filters.contains(field_id) {
            return false;
        }
        self.comparison_filters.push(field_id.clone());
        true
    }

    /// Remove a comparison filter; returns false if it was not active
    pub fn remove_comparison_filter(&mut self, field_id: &FieldId) -> bool {
        let before = self.comparison_filters.len();
        self.comparison_filters.retain(|id| id != field_id);
        before != self.comparison_filters.len()
    }
}
