//! Project stage - 2-D view of records and centroids for visualisation
//!
//! PCA is fitted on the weighted (unstandardised) feature matrix. Centroids
//! live in standardised space, so they are mapped back through the
//! partition's scaler and projected with the same fitted PCA.

use indexmap::IndexMap;

use crate::pipeline::types::{
    FeatureImportance, FeatureMatrix, Partition, ProjectedCentroid, ProjectedPoint, Projection,
};
use crate::types::{AnalysisRecord, ClusterId, RecordId};
use crate::utils::utc_now_rfc3339;
use crate::vector::Pca;

/// Stage that computes the projection written next to the summaries.
pub struct ProjectStage {
    top_features: usize,
    power_iterations: usize,
}

impl ProjectStage {
    pub fn new(top_features: usize, power_iterations: usize) -> Self {
        Self {
            top_features,
            power_iterations,
        }
    }

    /// Returns None when there is nothing to project: fewer than two records
    /// or no feature columns.
    pub fn run(
        &self,
        records: &IndexMap<RecordId, AnalysisRecord>,
        matrix: &FeatureMatrix,
        partition: &Partition,
    ) -> Option<Projection> {
        let Some(pca) = Pca::fit(&matrix.dense(), 2, self.power_iterations) else {
            tracing::debug!(
                target: "pipeline",
                "skipping projection: {} rows, {} columns",
                matrix.rows.len(),
                matrix.dimension()
            );
            return None;
        };

        let points = matrix
            .rows
            .iter()
            .filter_map(|(id, row)| {
                let record = records.get(id)?;
                let cluster = partition.label(*id)?;
                let (x, y) = xy(&pca.transform(row));
                Some(ProjectedPoint {
                    source_path: record.source_path.clone(),
                    cluster,
                    x,
                    y,
                })
            })
            .collect();

        let centroids = partition
            .centroids
            .iter()
            .enumerate()
            .map(|(i, centroid)| {
                let (x, y) = xy(&pca.transform(&partition.scaler.inverse_transform(centroid)));
                ProjectedCentroid {
                    cluster: ClusterId::from(i),
                    x,
                    y,
                }
            })
            .collect();

        let mut ranked: Vec<FeatureImportance> = matrix
            .feature_names
            .iter()
            .zip(pca.feature_importance())
            .map(|(feature, score)| FeatureImportance {
                feature: feature.clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.top_features);

        Some(Projection {
            generated_at: utc_now_rfc3339(),
            explained_variance_ratio: pca.explained_variance_ratio(),
            points,
            centroids,
            feature_importance: ranked,
        })
    }
}

/// A single-column matrix yields one component; its second axis is zero.
fn xy(coords: &[f64]) -> (f64, f64) {
    (
        coords.first().copied().unwrap_or(0.0),
        coords.get(1).copied().unwrap_or(0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stages::PartitionStage;
    use crate::types::Attributes;
    use crate::vector::KMeansParams;

    fn fixture(rows: &[Vec<f64>]) -> (IndexMap<RecordId, AnalysisRecord>, FeatureMatrix) {
        let mut records = IndexMap::new();
        let mut matrix = FeatureMatrix {
            feature_names: (0..rows[0].len()).map(|i| format!("mood_t{i}")).collect(),
            ..Default::default()
        };
        for (i, row) in rows.iter().enumerate() {
            let id = RecordId::from_u32(i as u32 + 1).unwrap();
            let attrs = Attributes {
                architectural_style: String::new(),
                futuristic_elements: String::new(),
                mood: String::new(),
                color_palette: String::new(),
                dominant_materials: String::new(),
                short_descriptive_label: String::new(),
            };
            records.insert(id, AnalysisRecord::new(id, format!("{i}.jpg"), attrs));
            matrix.rows.insert(id, row.clone());
        }
        (records, matrix)
    }

    #[test]
    fn test_projection_covers_records_and_centroids() {
        let (records, matrix) = fixture(&[
            vec![0.0, 0.0, 1.0],
            vec![0.1, 0.0, 1.0],
            vec![3.0, 3.0, 0.0],
            vec![3.0, 3.1, 0.0],
        ]);
        let partition = PartitionStage::new(KMeansParams::new(2)).run(&matrix).unwrap();
        let projection = ProjectStage::new(2, 500)
            .run(&records, &matrix, &partition)
            .unwrap();

        assert_eq!(projection.points.len(), 4);
        assert_eq!(projection.centroids.len(), 2);
        assert_eq!(projection.feature_importance.len(), 2);
        assert_eq!(projection.explained_variance_ratio.len(), 2);
        assert!(projection.explained_variance_ratio[0] > 0.9);
        assert!(
            projection.feature_importance[0].score >= projection.feature_importance[1].score
        );

        // A centroid of two points sits between their projections
        let cluster = projection.points[0].cluster;
        let centroid = projection
            .centroids
            .iter()
            .find(|c| c.cluster == cluster)
            .unwrap();
        let mid_x = (projection.points[0].x + projection.points[1].x) / 2.0;
        assert!((centroid.x - mid_x).abs() < 1e-6);
    }

    #[test]
    fn test_single_record_has_no_projection() {
        let (records, matrix) = fixture(&[vec![1.0, 2.0]]);
        let partition = PartitionStage::new(KMeansParams::new(1)).run(&matrix).unwrap();
        assert!(ProjectStage::new(30, 500)
            .run(&records, &matrix, &partition)
            .is_none());
    }

    #[test]
    fn test_single_column_projects_onto_x() {
        let (records, matrix) = fixture(&[vec![0.0], vec![1.0], vec![5.0]]);
        let partition = PartitionStage::new(KMeansParams::new(2)).run(&matrix).unwrap();
        let projection = ProjectStage::new(30, 500)
            .run(&records, &matrix, &partition)
            .unwrap();
        assert!(projection.points.iter().all(|p| p.y == 0.0));
        assert_eq!(projection.feature_importance.len(), 1);
    }
}
