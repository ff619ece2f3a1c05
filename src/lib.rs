//! Streetscape: cluster per-image vision analyses into visual themes.
//!
//! The [`pipeline`] turns the analysis results file into weighted TF-IDF
//! features, partitions them with seeded k-means and writes one summary per
//! cluster. [`vector`] holds the numeric building blocks.

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod vector;

pub use config::Settings;
pub use error::{ClusterError, ClusterResult, RecordError};
pub use pipeline::{
    ClusterSummaries, ClusterSummary, Pipeline, PipelineConfig, RunReport, normalize,
};
pub use types::{AnalysisRecord, Attribute, Attributes, ClusterId, RecordId};
