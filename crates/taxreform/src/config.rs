//! Command-line configuration

use crate::client::RetryPolicy;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "taxreform",
    version,
    about = "Resolve noisy scientific names against Global Names and the Open Tree of Life"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve every name of a CSV table
    Batch(BatchArgs),
    /// Serve single-name lookups over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// CSV table with a `name` column
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Prefix for `<prefix>_matched.csv` and `<prefix>_unmatched.csv`
    #[arg(short, long, default_value = "output", env = "TAXREFORM_OUTPUT")]
    pub output: String,

    /// Keep genus-only answers for records that carry a species epithet
    #[arg(long)]
    pub genus_search: bool,

    #[command(flatten)]
    pub resolver: ResolverArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, default_value = "8080", env = "PORT")]
    pub port: u16,

    #[command(flatten)]
    pub resolver: ResolverArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserKind {
    /// External gnparser binary
    Gnparser,
    /// Built-in whitespace splitter for canonical names
    Builtin,
}

/// Settings shared by every subcommand
#[derive(Args, Debug)]
pub struct ResolverArgs {
    /// Taxonomic context for exact matching (e.g. "Insects", "Arthropods")
    #[arg(short, long, default_value = "All life", env = "TAXREFORM_CONTEXT")]
    pub context: String,

    /// Comma-separated higher taxa a fuzzy candidate should belong to
    #[arg(short = 'f', long, env = "TAXREFORM_TAXON_FILTER")]
    pub taxon_filter: Option<String>,

    /// Path to the gnparser binary
    #[arg(short = 'p', long, default_value = "gnparser", env = "GNPARSER_PATH")]
    pub gnparser: PathBuf,

    #[arg(long, value_enum, default_value = "gnparser", env = "TAXREFORM_PARSER")]
    pub parser: ParserKind,

    /// Seconds to wait before retrying an unavailable service
    #[arg(long, default_value = "600", env = "TAXREFORM_RETRY_WAIT")]
    pub retry_wait: u64,

    /// Give up after this many attempts (retries forever if unset)
    #[arg(long, env = "TAXREFORM_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Fall back to the fuzzy source's classification when OTT has no lineage
    #[arg(long, env = "TAXREFORM_ACCEPT_UNVERIFIED_LINEAGE")]
    pub accept_unverified_lineage: bool,

    #[arg(long, env = "OTOL_API_URL")]
    pub otol_api_url: Option<String>,

    #[arg(long, env = "GNAMES_API_URL")]
    pub gnames_api_url: Option<String>,
}

impl ResolverArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            wait: Duration::from_secs(self.retry_wait),
            max_attempts: self.max_retries,
        }
    }

    /// Filter taxa, trimmed and without empty entries
    pub fn taxon_filter(&self) -> Vec<String> {
        self.taxon_filter
            .as_deref()
            .map(split_taxa)
            .unwrap_or_default()
    }
}

fn split_taxa(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
