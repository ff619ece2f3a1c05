use anyhow::{Context, anyhow};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

use streetscape::Settings;
use streetscape::cli::commands::{self, cluster::ClusterArgs};
use streetscape::cli::{Cli, Commands};
use streetscape::logging;

/// Load settings from an explicit file, or discover `.streetscape/settings.toml`.
///
/// An explicit file must exist and parse. A broken discovered file only
/// produces a warning and the defaults.
fn load_settings(config: Option<&Path>) -> anyhow::Result<Settings> {
    match config {
        Some(path) => {
            if !path.is_file() {
                return Err(anyhow!("config file not found: {}", path.display()));
            }
            Settings::load_from(path)
                .map_err(|e| anyhow!("{e}"))
                .with_context(|| format!("failed to load settings from {}", path.display()))
        }
        None => Ok(Settings::load().unwrap_or_else(|e| {
            eprintln!("Warning: ignoring settings.toml: {e}");
            Settings::default()
        })),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => commands::init::run_init(force),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Cluster {
            input_file,
            n_clusters,
            output_dir,
            seed,
            no_projection,
            json,
        } => commands::cluster::run(
            ClusterArgs {
                input_file,
                n_clusters,
                output_dir,
                seed,
                no_projection,
                json,
            },
            &settings,
        ),
        Commands::Describe {
            results,
            cluster,
            json,
        } => commands::describe::run(results, cluster, json, &settings),
    }
}
