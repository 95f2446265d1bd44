//! Phenotype portal command-line interface

use anyhow::Result;
use clap::{Parser, Subcommand};
use phenoportal::cli::compare::{self, CompareConfig, CompareTarget};
use phenoportal::cli::comparison_filter::{self, ToggleConfig};
use phenoportal::cli::config::{self, OptionOverrides};
use phenoportal::cli::dataset::Session;
use phenoportal::cli::filter::{self, FilterConfig, ValuesConfig};
use phenoportal::cli::output::{self, OutputFormat};
use phenoportal::engine::FilterChange;
use std::path::PathBuf;

/// Phenotype portal command-line tool
#[derive(Parser)]
#[command(name = "phenoportal")]
#[command(author, version, about = "Phenotype filter and variant comparison queries", long_about = None)]
struct Cli {
    /// Dataset file (JSON)
    #[arg(short, long, global = true, default_value = "dataset.json")]
    dataset: PathBuf,

    /// Engine options file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Render nested lists as a flat code map
    #[arg(long, global = true)]
    flatten_tree: bool,

    /// Keep Bars keys as stored instead of casting them to numbers
    #[arg(long, global = true)]
    raw_bars_keys: bool,

    /// Number of steps a bucketed range is divided into
    #[arg(long, global = true)]
    bucket_steps: Option<usize>,

    /// Shortest medical search term
    #[arg(long, global = true)]
    min_term_len: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, table, pretty)
    #[arg(short = 'f', long, global = true)]
    format: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate the values of a field
    Filter {
        /// Field id
        field: String,

        /// Instance identifiers
        #[arg(short, long = "instance")]
        instances: Vec<String>,

        /// Restrict to these participants (comma separated; blank restricts to nobody)
        #[arg(short, long, value_delimiter = ',')]
        participants: Option<Vec<String>>,

        /// Restrict to an empty population
        #[arg(long, conflicts_with = "participants")]
        no_participants: bool,

        /// Search term for text and medical fields
        #[arg(short, long)]
        term: Option<String>,

        /// Page size for text search
        #[arg(long, requires = "page")]
        page_size: Option<u64>,

        /// One-based page number for text search
        #[arg(long, requires = "page_size")]
        page: Option<u64>,

        /// Explicit bucket boundaries (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        buckets: Vec<String>,

        /// Return raw aggregate rows
        #[arg(long)]
        raw: bool,
    },

    /// List the stored value rows of a field
    Values {
        /// Field id
        field: String,

        #[arg(short, long)]
        instance: Option<String>,

        #[arg(short, long)]
        participant: Option<String>,
    },

    /// Compare field values among carriers of a variant
    CompareVariant {
        field: String,
        /// Full location, e.g. 1:1000:A:G
        variant: String,
        #[arg(short, long)]
        exclude: Option<String>,
    },

    /// Compare field values among carriers of any variant of a gene
    CompareGene {
        field: String,
        gene: String,
        #[arg(short, long)]
        exclude: Option<String>,
    },

    /// Genotype and ACMG verdict counts of a variant
    VariantGraph {
        variant: String,
        #[arg(short, long)]
        exclude: Option<String>,
    },

    /// Tier counts of a participant
    Tiers { participant: String },

    /// Add a comparison filter to a workgroup patient
    AddFilter {
        field: String,
        patient: String,
        /// Write the change back into the dataset file
        #[arg(long)]
        save: bool,
    },

    /// Remove a comparison filter from a workgroup patient
    RemoveFilter {
        field: String,
        patient: String,
        /// Write the change back into the dataset file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Set up color output
    output::setup_colors(&cli.color);
    output::init_logging(cli.verbose);

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = OptionOverrides {
        flatten_tree: cli.flatten_tree,
        raw_bars_keys: cli.raw_bars_keys,
        bucket_steps: cli.bucket_steps,
        min_medical_term_len: cli.min_term_len,
    };
    let options = config::load_options(cli.config.as_deref(), &overrides)?;
    let mut session = Session::open(&cli.dataset, options)?;
    let format = cli
        .format
        .as_deref()
        .map(OutputFormat::parse)
        .unwrap_or(OutputFormat::JsonPretty);

    let rendered = match cli.command {
        Commands::Filter {
            field,
            instances,
            participants,
            no_participants,
            term,
            page_size,
            page,
            buckets,
            raw,
        } => {
            let config = FilterConfig {
                field,
                instances,
                participants: filter::population_arg(participants, no_participants),
                term,
                page: page_size.zip(page),
                buckets,
                raw,
            };
            filter::run_filter(&session, &config, format).await?
        }

        Commands::Values {
            field,
            instance,
            participant,
        } => {
            let config = ValuesConfig {
                field,
                instance,
                participant,
            };
            filter::run_values(&session, &config, format).await?
        }

        Commands::CompareVariant {
            field,
            variant,
            exclude,
        } => {
            let config = CompareConfig {
                field,
                target: CompareTarget::Variant(variant),
                exclude,
            };
            compare::run_compare(&session, &config, format).await?
        }

        Commands::CompareGene {
            field,
            gene,
            exclude,
        } => {
            let config = CompareConfig {
                field,
                target: CompareTarget::Gene(gene),
                exclude,
            };
            compare::run_compare(&session, &config, format).await?
        }

        Commands::VariantGraph { variant, exclude } => {
            compare::run_variant_graph(&session, &variant, exclude.as_deref(), format).await?
        }

        Commands::Tiers { participant } => {
            compare::run_tiers(&session, &participant, format).await?
        }

        Commands::AddFilter {
            field,
            patient,
            save,
        } => {
            let config = ToggleConfig {
                field,
                patient,
                change: FilterChange::Add,
                save,
            };
            comparison_filter::run_toggle(&mut session, &config, format).await?
        }

        Commands::RemoveFilter {
            field,
            patient,
            save,
        } => {
            let config = ToggleConfig {
                field,
                patient,
                change: FilterChange::Remove,
                save,
            };
            comparison_filter::run_toggle(&mut session, &config, format).await?
        }
    };

    output::write_output(&rendered, cli.output.as_deref())
}
