//! Clustering pipeline
//!
//! Turns per-image analysis results into cluster summaries.
//!
//! ## Architecture
//!
//! ```text
//! LOAD → EXTRACT → PARTITION → SUMMARIZE → PROJECT → WRITE
//!   │        │          │           │          │        │
//!   ▼        ▼          ▼           ▼          ▼        ▼
//! [records] [matrix] [labels]  [summaries] [2-D view] JSON files
//! ```
//!
//! ### Stage Overview
//!
//! - **LOAD**: Reads the analysis results, validates and skips bad records
//! - **EXTRACT**: Normalizes text, builds weighted per-attribute TF-IDF blocks
//! - **PARTITION**: Standardises columns, runs seeded k-means
//! - **SUMMARIZE**: Collects distinct attribute values per cluster
//! - **PROJECT**: Optional PCA projection of records and centroids
//! - **WRITE**: Atomic JSON output
//!
//! ## Usage
//!
//! ```ignore
//! use streetscape::pipeline::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::from_settings(&settings).with_clusters(4);
//! let report = Pipeline::new(config).run(input, output_dir)?;
//! ```

pub mod config;
pub mod metrics;
pub mod stages;
pub mod types;

pub use config::PipelineConfig;
pub use metrics::{StageMetrics, StageTimer};
pub use stages::{load_summaries, normalize};
pub use types::{
    ClusterSummaries, ClusterSummary, FeatureMatrix, LoadedRecords, Partition, Projection,
    RunReport, SkippedRecord,
};

use crate::error::{ClusterError, ClusterResult};
use stages::{
    ExtractStage, LoadStage, PartitionStage, ProjectStage, remove_stale, summarize,
    write_json_atomic,
};
use std::path::Path;

/// One configured clustering run.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on `input`, writing results into `output_dir`.
    ///
    /// Fatal errors stop the run before anything is written. Records that
    /// fail validation are reported in [`RunReport::skipped`].
    pub fn run(&self, input: &Path, output_dir: &Path) -> ClusterResult<RunReport> {
        self.config.validate()?;
        let mut stages = Vec::with_capacity(6);

        // LOAD
        let timer = StageTimer::start("LOAD");
        let loaded = LoadStage::new(input).run()?;
        stages.push(timer.finish_with(loaded.len(), loaded.skipped.len(), "skipped"));
        if loaded.is_empty() {
            return Err(ClusterError::NoValidRecords {
                path: input.to_path_buf(),
                skipped: loaded.skipped.len(),
            });
        }
        let LoadedRecords { records, skipped } = loaded;

        // Checked before any numeric work
        if self.config.n_clusters == 0 || self.config.n_clusters > records.len() {
            return Err(ClusterError::InvalidClusterCount {
                k: self.config.n_clusters,
                records: records.len(),
            });
        }

        // EXTRACT
        let timer = StageTimer::start("EXTRACT");
        let matrix = ExtractStage::from_config(&self.config).run(&records);
        stages.push(timer.finish_with(matrix.rows.len(), matrix.dimension(), "columns"));

        // PARTITION
        let timer = StageTimer::start("PARTITION");
        let partition = PartitionStage::new(self.config.kmeans_params()).run(&matrix)?;
        stages.push(timer.finish_with(matrix.rows.len(), partition.iterations, "iterations"));

        // SUMMARIZE
        let timer = StageTimer::start("SUMMARIZE");
        let summaries = summarize(&records, &partition.labels, partition.k())?;
        stages.push(timer.finish(summaries.len()));

        // PROJECT
        let projection = if self.config.write_projection {
            let timer = StageTimer::start("PROJECT");
            let projection = ProjectStage::new(self.config.top_features, self.config.power_iterations)
                .run(&records, &matrix, &partition);
            stages.push(timer.finish(projection.as_ref().map_or(0, |p| p.points.len())));
            projection
        } else {
            None
        };

        // WRITE
        let timer = StageTimer::start("WRITE");
        let results_path = output_dir.join(&self.config.results_file);
        write_json_atomic(&results_path, &summaries, "cluster summaries")?;
        let path = output_dir.join(&self.config.projection_file);
        let projection_path = match &projection {
            Some(projection) => {
                write_json_atomic(&path, projection, "cluster projection")?;
                Some(path)
            }
            // A projection from an earlier run would describe other clusters
            None => {
                remove_stale(&path)?;
                None
            }
        };
        stages.push(timer.finish(1 + usize::from(projection_path.is_some())));

        tracing::info!(
            target: "pipeline",
            "clustered {} records into {} clusters ({} skipped), results in {}",
            records.len(),
            summaries.len(),
            skipped.len(),
            results_path.display()
        );
        if self.config.pipeline_tracing {
            metrics::log_summary(&stages);
        }

        Ok(RunReport {
            processed: records.len(),
            skipped,
            n_clusters: summaries.len(),
            dimension: matrix.dimension(),
            inertia: partition.inertia,
            cluster_sizes: summaries.sizes(),
            results_path,
            projection_path,
            stages,
        })
    }
}
