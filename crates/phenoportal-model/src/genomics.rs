//! Genomic tier, marker and location records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Document paths of tier rows as seen by pipelines
pub mod tier_paths {
    pub const PARTICIPANT_ID: &str = "participantId";
    pub const FULL_LOCATION: &str = "fullLocation";
    pub const MARKER_ID: &str = "markerId";
    pub const TIER: &str = "tier";
    pub const GENOTYPE: &str = "genotype";
    pub const ACMG_VERDICT: &str = "acmgVerdict";
}

/// Variant classification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "TIER1")]
    Tier1,
    #[serde(rename = "TIER2")]
    Tier2,
    #[serde(rename = "TIER3")]
    Tier3,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Tier1 => "TIER1",
            Tier::Tier2 => "TIER2",
            Tier::Tier3 => "TIER3",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TIER1" => Some(Tier::Tier1),
            "TIER2" => Some(Tier::Tier2),
            "TIER3" => Some(Tier::Tier3),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One participant's classification of one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRow {
    pub participant_id: String,
    /// Variant location, e.g. `1-11856378-G-A`
    pub full_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genotype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acmg_verdict: Option<String>,
}

impl TierRow {
    pub fn new(participant_id: impl Into<String>, full_location: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            full_location: full_location.into(),
            marker_id: None,
            tier: None,
            genotype: None,
            acmg_verdict: None,
        }
    }

    pub fn with_marker(mut self, marker_id: impl Into<String>) -> Self {
        self.marker_id = Some(marker_id.into());
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_genotype(mut self, genotype: impl Into<String>) -> Self {
        self.genotype = Some(genotype.into());
        self
    }

    pub fn with_acmg_verdict(mut self, verdict: impl Into<String>) -> Self {
        self.acmg_verdict = Some(verdict.into());
        self
    }
}

/// Physical tier collection a pipeline runs against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TierCollection {
    /// Cross-participant collection
    Shared,
    /// Collection holding a single participant's rows
    Participant(String),
}

impl fmt::Display for TierCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierCollection::Shared => write!(f, "tiers"),
            TierCollection::Participant(id) => write!(f, "tiers_{}", id),
        }
    }
}

/// Genomic location annotated with its gene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenomicLocation {
    pub id: String,
    pub gene: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chromosome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
}

/// Variant marker at a genomic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub location_id: String,
    pub gene: String,
    pub full_location: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tier_row_serializes_pipeline_paths() {
        let row = TierRow::new("p1", "1-100-A-G")
            .with_tier(Tier::Tier2)
            .with_marker("m1");

        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({
                "participantId": "p1",
                "fullLocation": "1-100-A-G",
                "markerId": "m1",
                "tier": "TIER2"
            })
        );
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(Tier::parse("TIER3"), Some(Tier::Tier3));
        assert_eq!(Tier::parse("tier3"), None);
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(TierCollection::Shared.to_string(), "tiers");
        assert_eq!(TierCollection::Participant("p9".into()).to_string(), "tiers_p9");
    }
}
