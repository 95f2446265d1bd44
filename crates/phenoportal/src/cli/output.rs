//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use phenoportal_diagnostics::PortalError;
use phenoportal_model::{
    AggregateResult, ComparisonResult, FilterDataResult, FlatTreeNode, TierDistribution,
    VariantGraphData,
};
use serde::Serialize;
use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    Table,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "table" => Self::Table,
            _ => Self::JsonPretty,
        }
    }
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(std::io::stderr().is_terminal()),
    }
}

/// Install the log subscriber; `RUST_LOG` wins over the verbosity flag
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    // A second initialisation in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error) -> String {
    match error.downcast_ref::<PortalError>() {
        Some(portal) => portal.to_diagnostic().render_colored(),
        None => format!("{} {:#}", "Error:".red().bold(), error),
    }
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!("{}", format_success(&format!("Output written to {}", path.display())));
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Render `value` as JSON, or as `table` when a table was requested and one exists
pub fn render<T: Serialize>(value: &T, table: Option<String>, format: OutputFormat) -> Result<String> {
    match (format, table) {
        (OutputFormat::Table, Some(table)) => Ok(table),
        (OutputFormat::Json, _) => serde_json::to_string(value).context("Failed to serialize JSON"),
        _ => serde_json::to_string_pretty(value).context("Failed to serialize JSON"),
    }
}

fn table<R: Tabled>(rows: Vec<R>) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows).with(Style::modern()).to_string()
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Count")]
    count: u64,
    #[tabled(rename = "Total")]
    total: u64,
}

#[derive(Tabled)]
struct TreeRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Count")]
    count: u64,
    #[tabled(rename = "Parent")]
    parent: String,
}

#[derive(Tabled)]
struct LabelRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Count")]
    count: u64,
}

fn count_rows(rows: &[AggregateResult]) -> Vec<CountRow> {
    rows.iter()
        .map(|r| CountRow {
            key: phenoportal_model::key_text(&r.key).into_owned(),
            label: r.label.clone().unwrap_or_default(),
            count: r.count,
            total: r.total,
        })
        .collect()
}

fn tree_row(node: &FlatTreeNode) -> TreeRow {
    TreeRow {
        code: node.code.clone(),
        label: node.label.clone(),
        count: node.count,
        parent: node.parent_code.clone().unwrap_or_default(),
    }
}

/// Table of a filter result; nested trees have no table form
pub fn filter_table(result: &FilterDataResult) -> Option<String> {
    match result {
        FilterDataResult::Rows(rows) => Some(table(count_rows(rows))),
        FilterDataResult::FlatTree(nodes) => Some(table(nodes.values().map(tree_row).collect())),
        FilterDataResult::Tree(_) => None,
    }
}

fn label_rows<'a>(
    group: &'a str,
    counts: impl IntoIterator<Item = (&'a String, &'a u64)> + 'a,
) -> impl Iterator<Item = LabelRow> + 'a {
    counts.into_iter().map(move |(label, count)| LabelRow {
        group: group.to_string(),
        label: label.clone(),
        count: *count,
    })
}

pub fn comparison_table(result: &ComparisonResult) -> String {
    table(
        label_rows("existing", &result.existing_values)
            .chain(label_rows("not existing", &result.not_existing_values))
            .collect(),
    )
}

pub fn variant_graph_table(graph: &VariantGraphData) -> String {
    table(
        label_rows("genotype", &graph.genotypes)
            .chain(label_rows("ACMG verdict", &graph.acmg_verdicts))
            .collect(),
    )
}

pub fn tier_table(distribution: &TierDistribution) -> String {
    table(vec![
        LabelRow {
            group: "tier".to_string(),
            label: "TIER1".to_string(),
            count: distribution.tier1,
        },
        LabelRow {
            group: "tier".to_string(),
            label: "TIER2".to_string(),
            count: distribution.tier2,
        },
        LabelRow {
            group: "tier".to_string(),
            label: "TIER3".to_string(),
            count: distribution.tier3,
        },
    ])
}
