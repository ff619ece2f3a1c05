//! Describe command - print cluster summaries from a results file.

use indexmap::IndexMap;
use std::path::PathBuf;
use std::process::ExitCode;

use super::{dim, heading, report_error};
use crate::config::Settings;
use crate::error::ClusterError;
use crate::io::{Envelope, PayloadKind};
use crate::pipeline::{ClusterSummaries, load_summaries};
use crate::types::ClusterId;

/// Run the describe command.
pub fn run(
    results: Option<PathBuf>,
    cluster: Option<u32>,
    json: bool,
    settings: &Settings,
) -> ExitCode {
    let path = results
        .unwrap_or_else(|| settings.results_path(&settings.resolve(&settings.paths.output_dir)));

    let summaries = match load_summaries(&path).and_then(|all| select(all, cluster)) {
        Ok(summaries) => summaries,
        Err(e) => return report_error(&e, json),
    };

    if json {
        let count = summaries.len();
        let payload = if cluster.is_some() {
            PayloadKind::ClusterSummary
        } else {
            PayloadKind::ClusterSummaries
        };
        return match Envelope::success(summaries)
            .with_message(format!("{count} clusters from {}", path.display()))
            .with_payload(payload)
            .with_count(count)
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
        };
    }

    for (i, (id, summary)) in summaries.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!(
            "{}",
            heading(&format!("Cluster {id} ({} images)", summary.size))
        );
        if summary.size == 0 {
            println!("{}", dim("(no members)"));
            continue;
        }
        println!("{}", summary.prompt_context());
        if !summary.sample_paths.is_empty() {
            println!("{}", dim(&format!("Samples: {}", summary.sample_paths.join(", "))));
        }
    }
    ExitCode::SUCCESS
}

/// Keep only the requested cluster, if any.
fn select(
    summaries: ClusterSummaries,
    cluster: Option<u32>,
) -> Result<ClusterSummaries, ClusterError> {
    let Some(id) = cluster else {
        return Ok(summaries);
    };
    let available = summaries.len();
    let ClusterSummaries(mut map) = summaries;
    match map.shift_remove_entry(&ClusterId::new(id)) {
        Some((key, summary)) => Ok(ClusterSummaries(IndexMap::from([(key, summary)]))),
        None => Err(ClusterError::ClusterNotFound { id, available }),
    }
}
