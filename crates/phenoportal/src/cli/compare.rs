//! Comparison, variant graph and tier commands

use super::dataset::Session;
use super::output::{self, OutputFormat};
use anyhow::Result;
use phenoportal_model::FieldId;

/// What a comparison population is drawn from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareTarget {
    Variant(String),
    Gene(String),
}

/// Compare command configuration
#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub field: String,
    pub target: CompareTarget,
    pub exclude: Option<String>,
}

/// Compare a field's values within a variant or gene population
pub async fn run_compare(session: &Session, config: &CompareConfig, format: OutputFormat) -> Result<String> {
    let field = FieldId::from(config.field.as_str());
    let exclude = config.exclude.as_deref();
    let engine = session.engine();
    let result = match &config.target {
        CompareTarget::Variant(variant) => {
            engine
                .get_comparison_by_field_and_variant(&field, variant, exclude)
                .await?
        }
        CompareTarget::Gene(gene) => {
            engine
                .get_comparison_by_field_and_gene(&field, gene, exclude)
                .await?
        }
    };
    output::render(&result, Some(output::comparison_table(&result)), format)
}

/// Genotype and ACMG verdict distribution of one variant
pub async fn run_variant_graph(
    session: &Session,
    variant: &str,
    exclude: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let graph = session.engine().get_variant_graph_data(variant, exclude).await?;
    output::render(&graph, Some(output::variant_graph_table(&graph)), format)
}

/// Tier counts of one participant's own variants
pub async fn run_tiers(session: &Session, participant: &str, format: OutputFormat) -> Result<String> {
    let distribution = session.engine().get_tier_distribution(participant).await?;
    output::render(&distribution, Some(output::tier_table(&distribution)), format)
}
