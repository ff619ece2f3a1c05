//! Error types for the clustering pipeline.
//!
//! Uses `thiserror` for structured errors with actionable messages. Each
//! fatal error carries a stable status code for JSON output and a list of
//! recovery suggestions the CLI prints after the message.
//!
//! Per-record problems are [`RecordError`]s: they are logged and counted by
//! the loader, never returned from a pipeline run.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Attribute;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Failed to read input file '{path}': {source}")]
    InputRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Input file '{path}' is not a JSON array of analysis results: {reason}")]
    InputFormat { path: PathBuf, reason: String },

    #[error("No valid analysis records in '{path}' ({skipped} skipped)")]
    NoValidRecords { path: PathBuf, skipped: usize },

    #[error("Invalid cluster count {k}: must satisfy 1 <= k <= {records} (number of valid records)")]
    InvalidClusterCount { k: usize, records: usize },

    #[error("Feature row of record {record} has {actual} columns, expected {expected}")]
    DimensionMismatch {
        record: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cluster assignment for '{path}' is invalid: {reason}")]
    Assignment { path: String, reason: String },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialization {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("Failed to load cluster results from '{path}': {reason}")]
    ResultsLoad { path: PathBuf, reason: String },

    #[error("Cluster {id} not found ({available} clusters in results)")]
    ClusterNotFound { id: u32, available: usize },

    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },
}

impl ClusterError {
    /// Stable status code for programmatic error handling.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::InputRead { .. } => "INPUT_READ_ERROR",
            Self::InputFormat { .. } => "INPUT_FORMAT_ERROR",
            Self::NoValidRecords { .. } => "NO_VALID_RECORDS",
            Self::InvalidClusterCount { .. } => "INVALID_CLUSTER_COUNT",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::Assignment { .. } => "ASSIGNMENT_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::ResultsLoad { .. } => "RESULTS_LOAD_ERROR",
            Self::ClusterNotFound { .. } => "CLUSTER_NOT_FOUND",
            Self::ConfigError { .. } => "CONFIG_ERROR",
        }
    }

    /// Concrete next steps for the user.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::InputRead { .. } => vec![
                "Check that the analysis results file exists and is readable",
                "Pass the file explicitly with --input-file",
            ],
            Self::InputFormat { .. } => vec![
                "The input must be the JSON array written by the image analysis step",
            ],
            Self::NoValidRecords { .. } => vec![
                "Every record was skipped; run with RUST_LOG=loader=warn to see why",
                "Each record needs 'original_path' and an 'analysis' JSON string",
            ],
            Self::InvalidClusterCount { .. } => vec![
                "Lower --n-clusters to at most the number of valid records",
                "Cluster count must be at least 1",
            ],
            Self::FileWrite { .. } => vec![
                "Check disk space and permissions in the output directory",
                "Any previous results file was left untouched",
            ],
            Self::ResultsLoad { .. } => vec![
                "Run 'streetscape cluster' to produce a results file first",
            ],
            Self::ConfigError { .. } => vec![
                "Run 'streetscape init --force' to regenerate settings.toml",
            ],
            _ => vec![],
        }
    }
}

/// Reasons a single input record is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("entry is not a valid analysis result: {0}")]
    MalformedEntry(String),

    #[error("analysis payload is malformed: {0}")]
    MalformedAnalysis(String),

    #[error("analysis payload is missing required attribute '{0}'")]
    MissingAttribute(Attribute),

    #[error("duplicate original_path, first seen as record {first}")]
    DuplicatePath { first: u32 },
}

/// Result type alias for pipeline operations.
pub type ClusterResult<T> = Result<T, ClusterError>;
