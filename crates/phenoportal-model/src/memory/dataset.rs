//! Portal dataset loaded in one piece

use super::stores::{
    FixedParticipantCounter, InMemoryFieldStore, InMemoryMarkerStore, InMemoryMedicalTermStore,
    InMemoryTaxonomyStore, InMemoryTierStore, InMemoryWorkgroupPatientStore,
};
use crate::field::{FieldDefinition, FieldId};
use crate::genomics::{GenomicLocation, Marker, TierRow};
use crate::provider::MedicalTerm;
use crate::result::RawTreeNode;
use crate::workgroup::WorkgroupPatient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Serialized form of every collection the engine reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    pub fields: Vec<FieldDefinition>,
    /// Value rows per field id
    pub values: HashMap<FieldId, Vec<Value>>,
    /// Taxonomy roots per coding
    pub taxonomies: HashMap<String, Vec<RawTreeNode>>,
    pub medical_terms: HashMap<FieldId, Vec<MedicalTerm>>,
    pub tiers: Vec<TierRow>,
    pub locations: Vec<GenomicLocation>,
    pub markers: Vec<Marker>,
    pub workgroup_patients: Vec<WorkgroupPatient>,
    /// Size of the participant universe; derived from the value rows when absent
    pub participants: Option<u64>,
}

/// In-memory stores populated from a [`Dataset`]
#[derive(Clone)]
pub struct MemoryStores {
    pub fields: InMemoryFieldStore,
    pub taxonomies: InMemoryTaxonomyStore,
    pub medical_terms: InMemoryMedicalTermStore,
    pub tiers: InMemoryTierStore,
    pub markers: InMemoryMarkerStore,
    pub workgroup_patients: InMemoryWorkgroupPatientStore,
    pub participants: FixedParticipantCounter,
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn into_stores(self) -> MemoryStores {
        let fields = InMemoryFieldStore::new();
        for field in self.fields {
            fields.insert_field(field);
        }
        for (field_id, rows) in self.values {
            fields.insert_values(&field_id, rows);
        }

        let taxonomies = InMemoryTaxonomyStore::new();
        for (coding, roots) in self.taxonomies {
            taxonomies.insert_tree(coding, roots);
        }

        let medical_terms = InMemoryMedicalTermStore::new();
        for (field_id, terms) in self.medical_terms {
            medical_terms.insert_terms(&field_id, terms);
        }

        let workgroup_patients = InMemoryWorkgroupPatientStore::new();
        for patient in self.workgroup_patients {
            workgroup_patients.insert(patient);
        }

        let participants = FixedParticipantCounter(
            self.participants
                .unwrap_or_else(|| fields.participant_count()),
        );
        log::debug!("loaded dataset with {} participants", participants.0);

        MemoryStores {
            fields,
            taxonomies,
            medical_terms,
            tiers: InMemoryTierStore::new(self.tiers),
            markers: InMemoryMarkerStore::new(self.locations, self.markers),
            workgroup_patients,
            participants,
        }
    }
}
