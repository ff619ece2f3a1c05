//! Data passed between pipeline stages.
//!
//! Every per-record structure is an `IndexMap` keyed by [`RecordId`], kept in
//! input order. Stages look rows and labels up by id instead of relying on
//! parallel vectors staying aligned.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::RecordError;
use crate::pipeline::metrics::StageMetrics;
use crate::types::{AnalysisRecord, Attribute, ClusterId, RecordId};
use crate::vector::StandardScaler;

/// Output of the LOAD stage.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    /// Valid records in input order.
    pub records: IndexMap<RecordId, AnalysisRecord>,
    /// Entries that failed validation.
    pub skipped: Vec<SkippedRecord>,
}

impl LoadedRecords {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An input entry rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Zero-based position in the input array.
    pub position: usize,
    /// `original_path`, when the entry had one.
    pub path: Option<String>,
    #[serde(serialize_with = "serialize_display")]
    pub reason: RecordError,
}

fn serialize_display<S: serde::Serializer>(
    value: &RecordError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Location and weight of one attribute's columns in the feature matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureBlock {
    pub attribute: Attribute,
    pub offset: usize,
    pub width: usize,
    pub weight: f64,
}

impl FeatureBlock {
    pub fn columns(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width
    }
}

/// Output of the EXTRACT stage: one weighted TF-IDF row per record.
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    pub rows: IndexMap<RecordId, Vec<f64>>,
    /// Global column names, `"{attribute}_{term}"`.
    pub feature_names: Vec<String>,
    pub blocks: Vec<FeatureBlock>,
}

impl FeatureMatrix {
    /// Number of columns.
    pub fn dimension(&self) -> usize {
        self.feature_names.len()
    }

    pub fn block(&self, attribute: Attribute) -> Option<&FeatureBlock> {
        self.blocks.iter().find(|b| b.attribute == attribute)
    }

    /// Rows in record order, for the numeric routines.
    pub fn dense(&self) -> Vec<Vec<f64>> {
        self.rows.values().cloned().collect()
    }
}

/// Output of the PARTITION stage.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Cluster per record, in record order.
    pub labels: IndexMap<RecordId, ClusterId>,
    /// `k` centroids in standardised feature space.
    pub centroids: Vec<Vec<f64>>,
    /// Scaler fitted on the feature matrix, to map centroids back.
    pub scaler: StandardScaler,
    pub inertia: f64,
    pub iterations: usize,
}

impl Partition {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn label(&self, id: RecordId) -> Option<ClusterId> {
        self.labels.get(&id).copied()
    }

    /// Member count per cluster id, including empty clusters.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for cluster in self.labels.values() {
            if let Some(size) = sizes.get_mut(cluster.index()) {
                *size += 1;
            }
        }
        sizes
    }
}

/// Reduced, human-readable description of one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub size: usize,
    pub common_labels: Vec<String>,
    pub common_styles: Vec<String>,
    pub common_elements: Vec<String>,
    pub common_materials: Vec<String>,
    pub common_moods: Vec<String>,
    pub common_colors: Vec<String>,
    pub sample_paths: Vec<String>,
}

impl ClusterSummary {
    /// Maximum number of member paths kept as thumbnails.
    pub const MAX_SAMPLES: usize = 3;

    /// Render the summary as the text block handed to prompt synthesis.
    ///
    /// Empty sets are omitted; remaining lines appear in a fixed order.
    pub fn prompt_context(&self) -> String {
        [
            ("Common Labels", &self.common_labels),
            ("Styles", &self.common_styles),
            ("Key Elements", &self.common_elements),
            ("Materials", &self.common_materials),
            ("Moods", &self.common_moods),
            ("Colors", &self.common_colors),
        ]
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(heading, values)| format!("{heading}: {}", values.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Accumulates one cluster's members into a [`ClusterSummary`].
#[derive(Debug, Default)]
pub(crate) struct SummaryBuilder {
    size: usize,
    labels: IndexSet<String>,
    styles: IndexSet<String>,
    elements: IndexSet<String>,
    materials: IndexSet<String>,
    moods: IndexSet<String>,
    colors: IndexSet<String>,
    sample_paths: Vec<String>,
}

impl SummaryBuilder {
    pub(crate) fn add(&mut self, record: &AnalysisRecord) {
        let attr = |a: Attribute| record.attribute(a).to_string();
        self.size += 1;
        self.labels.insert(attr(Attribute::ShortDescriptiveLabel));
        self.styles.insert(attr(Attribute::ArchitecturalStyle));
        self.elements.insert(attr(Attribute::FuturisticElements));
        self.materials.insert(attr(Attribute::DominantMaterials));
        self.moods.insert(attr(Attribute::Mood));
        self.colors.insert(attr(Attribute::ColorPalette));
        if self.sample_paths.len() < ClusterSummary::MAX_SAMPLES {
            self.sample_paths.push(record.source_path.clone());
        }
    }

    pub(crate) fn build(self) -> ClusterSummary {
        ClusterSummary {
            size: self.size,
            common_labels: self.labels.into_iter().collect(),
            common_styles: self.styles.into_iter().collect(),
            common_elements: self.elements.into_iter().collect(),
            common_materials: self.materials.into_iter().collect(),
            common_moods: self.moods.into_iter().collect(),
            common_colors: self.colors.into_iter().collect(),
            sample_paths: self.sample_paths,
        }
    }
}

/// All cluster summaries of a run, keyed `0..k` in order.
///
/// Serializes as a JSON object keyed by the string form of each id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterSummaries(pub IndexMap<ClusterId, ClusterSummary>);

impl ClusterSummaries {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: ClusterId) -> Option<&ClusterSummary> {
        self.0.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClusterId, &ClusterSummary)> {
        self.0.iter()
    }

    /// `(cluster, size)` pairs in id order.
    pub fn sizes(&self) -> Vec<(ClusterId, usize)> {
        self.0.iter().map(|(id, s)| (*id, s.size)).collect()
    }
}

/// A record's position in the 2-D projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub source_path: String,
    pub cluster: ClusterId,
    pub x: f64,
    pub y: f64,
}

/// A fitted centroid in the 2-D projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCentroid {
    pub cluster: ClusterId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub score: f64,
}

/// Output of the PROJECT stage, written next to the summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub generated_at: String,
    pub explained_variance_ratio: Vec<f64>,
    pub points: Vec<ProjectedPoint>,
    pub centroids: Vec<ProjectedCentroid>,
    pub feature_importance: Vec<FeatureImportance>,
}

/// What a full pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub processed: usize,
    pub skipped: Vec<SkippedRecord>,
    pub n_clusters: usize,
    pub dimension: usize,
    pub inertia: f64,
    pub cluster_sizes: Vec<(ClusterId, usize)>,
    pub results_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_path: Option<PathBuf>,
    #[serde(skip)]
    pub stages: Vec<StageMetrics>,
}
