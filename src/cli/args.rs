//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const QUICK_START: &str = "Quick Start:
  $ streetscape init                          # Create .streetscape/settings.toml
  $ streetscape cluster                       # Cluster the default analysis results
  $ streetscape cluster -n 8 --seed 7 --json  # Machine-readable run report
  $ streetscape describe --cluster 2          # Prompt context for one cluster";

/// Group image analyses into visual themes
#[derive(Parser)]
#[command(
    name = "streetscape",
    version = env!("CARGO_PKG_VERSION"),
    about = "Group image analyses into visual themes",
    long_about = "Cluster per-image vision-model analyses into visual themes and \
                  summarize each theme for prompt generation.",
    next_line_help = true,
    styles = clap_cargo_style(),
    before_help = QUICK_START
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .streetscape directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings (defaults, settings.toml, environment)")]
    Config,

    /// Cluster analysis results into themes
    #[command(
        about = "Cluster analysis results and write per-cluster summaries",
        after_help = "Examples:\n  streetscape cluster\n  streetscape cluster --input-file runs/analysis_results.json -n 8\n  streetscape cluster --output-dir out --no-projection\n\nJSON paths:\n  cluster --json    .data.cluster_sizes[]\n  cluster --json    .data.skipped[].reason"
    )]
    Cluster {
        /// Analysis results file (overrides paths.input_file)
        #[arg(short, long, value_name = "FILE")]
        input_file: Option<PathBuf>,

        /// Number of clusters (overrides clustering.n_clusters)
        #[arg(short, long, value_name = "K")]
        n_clusters: Option<usize>,

        /// Output directory (overrides paths.output_dir)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Seed for centroid initialisation (overrides clustering.seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Skip writing the 2-D projection file
        #[arg(long)]
        no_projection: bool,

        /// Output the run report as a JSON envelope
        #[arg(long)]
        json: bool,
    },

    /// Show summaries from a previous run
    #[command(
        about = "Print the prompt context of each cluster in a results file",
        after_help = "Examples:\n  streetscape describe\n  streetscape describe results/cluster_results/cluster_analysis_results.json\n  streetscape describe --cluster 3 --json"
    )]
    Describe {
        /// Results file (defaults to the configured output directory)
        #[arg(value_name = "RESULTS")]
        results: Option<PathBuf>,

        /// Only show this cluster
        #[arg(long, value_name = "ID")]
        cluster: Option<u32>,

        /// Output as a JSON envelope
        #[arg(long)]
        json: bool,
    },
}
