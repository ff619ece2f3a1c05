//! Cluster command - run the pipeline and report cluster sizes.

use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use super::{dim, heading, report_error};
use crate::config::Settings;
use crate::io::{Envelope, PayloadKind};
use crate::pipeline::{Pipeline, PipelineConfig, RunReport};

/// Skipped records listed individually before the output is abbreviated.
const MAX_SKIPPED_LISTED: usize = 10;

/// Command-line overrides for a clustering run.
#[derive(Debug, Default)]
pub struct ClusterArgs {
    pub input_file: Option<PathBuf>,
    pub n_clusters: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub no_projection: bool,
    pub json: bool,
}

/// Run the cluster command.
pub fn run(args: ClusterArgs, settings: &Settings) -> ExitCode {
    let input = args
        .input_file
        .unwrap_or_else(|| settings.resolve(&settings.paths.input_file));
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| settings.resolve(&settings.paths.output_dir));

    let mut config = PipelineConfig::from_settings(settings);
    if let Some(k) = args.n_clusters {
        config = config.with_clusters(k);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.no_projection {
        config = config.with_projection(false);
    }

    tracing::debug!(
        target: "cli",
        "clustering {} into {} clusters, output {}",
        input.display(),
        config.n_clusters,
        output_dir.display()
    );

    let start = Instant::now();
    let report = match Pipeline::new(config).run(&input, &output_dir) {
        Ok(report) => report,
        Err(e) => return report_error(&e, args.json),
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if args.json {
        print_json(report, elapsed_ms)
    } else {
        print_text(&report);
        ExitCode::SUCCESS
    }
}

fn print_json(report: RunReport, elapsed_ms: u64) -> ExitCode {
    let processed = report.processed;
    let envelope = if report.skipped.is_empty() {
        let message = format!(
            "Clustered {processed} records into {} clusters",
            report.n_clusters
        );
        Envelope::success(report).with_message(message)
    } else {
        let message = format!(
            "Clustered {processed} records into {} clusters, {} skipped",
            report.n_clusters,
            report.skipped.len()
        );
        Envelope::partial(report, message)
    };

    match envelope
        .with_payload(PayloadKind::RunReport)
        .with_count(processed)
        .with_duration_ms(elapsed_ms)
        .to_json()
    {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: failed to render JSON output: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_text(report: &RunReport) {
    println!(
        "{} {} records into {} clusters ({} features, {} skipped)",
        heading("Clustered"),
        report.processed,
        report.n_clusters,
        report.dimension,
        report.skipped.len()
    );

    for skipped in report.skipped.iter().take(MAX_SKIPPED_LISTED) {
        let line = format!(
            "  skipped entry {} ({}): {}",
            skipped.position,
            skipped.path.as_deref().unwrap_or("no path"),
            skipped.reason
        );
        println!("{}", dim(&line));
    }
    if report.skipped.len() > MAX_SKIPPED_LISTED {
        let more = format!(
            "  ... and {} more",
            report.skipped.len() - MAX_SKIPPED_LISTED
        );
        println!("{}", dim(&more));
    }

    println!();
    println!("{}", size_table(report));
    println!();
    println!("Results:    {}", report.results_path.display());
    if let Some(path) = &report.projection_path {
        println!("Projection: {}", path.display());
    }
}

fn size_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Cluster", "Images", "Share"]);

    for (cluster, size) in &report.cluster_sizes {
        let share = if report.processed > 0 {
            *size as f64 / report.processed as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(cluster),
            Cell::new(size).set_alignment(CellAlignment::Right),
            Cell::new(format!("{share:.1}%")).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClusterId;

    #[test]
    fn test_size_table_lists_every_cluster() {
        let report = RunReport {
            processed: 4,
            skipped: Vec::new(),
            n_clusters: 2,
            dimension: 10,
            inertia: 0.5,
            cluster_sizes: vec![(ClusterId::new(0), 3), (ClusterId::new(1), 1)],
            results_path: PathBuf::from("out/cluster_analysis_results.json"),
            projection_path: None,
            stages: Vec::new(),
        };
        let rendered = size_table(&report).to_string();
        assert!(rendered.contains("Images"));
        assert!(rendered.contains("75.0%"));
        assert!(rendered.contains("25.0%"));
    }
}
