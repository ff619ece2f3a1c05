//! Partition stage - standardise features and assign clusters
//!
//! Columns are standardised to zero mean and unit variance before k-means so
//! the attribute weights act on comparable scales. The fitted scaler is kept
//! on the result so centroids can be mapped back to feature space.

use indexmap::IndexMap;

use crate::error::{ClusterError, ClusterResult};
use crate::pipeline::types::{FeatureMatrix, Partition};
use crate::types::ClusterId;
use crate::vector::{ClusteringError, KMeansParams, StandardScaler, kmeans};

/// Stage that runs k-means on the feature matrix.
pub struct PartitionStage {
    params: KMeansParams,
}

impl PartitionStage {
    pub fn new(params: KMeansParams) -> Self {
        Self { params }
    }

    /// Cluster every row of `matrix` into `k` groups.
    ///
    /// Fails with [`ClusterError::InvalidClusterCount`] unless
    /// `1 <= k <= rows`. Identical inputs and seed give identical labels.
    pub fn run(&self, matrix: &FeatureMatrix) -> ClusterResult<Partition> {
        let n = matrix.rows.len();
        let k = self.params.k;
        if k == 0 || k > n {
            return Err(ClusterError::InvalidClusterCount { k, records: n });
        }

        let expected = matrix.dimension();
        if let Some((id, row)) = matrix.rows.iter().find(|(_, row)| row.len() != expected) {
            return Err(ClusterError::DimensionMismatch {
                record: id.to_string(),
                expected,
                actual: row.len(),
            });
        }

        let scaler = StandardScaler::fit(&matrix.rows.values().collect::<Vec<_>>());
        let scaled: Vec<Vec<f64>> = matrix.rows.values().map(|row| scaler.transform(row)).collect();

        let model = kmeans::fit(&scaled, &self.params).map_err(|e| match e {
            ClusteringError::InvalidClusterCount { k, n } => {
                ClusterError::InvalidClusterCount { k, records: n }
            }
            ClusteringError::EmptyData => ClusterError::InvalidClusterCount { k, records: 0 },
            ClusteringError::DimensionMismatch {
                index,
                expected,
                actual,
            } => ClusterError::DimensionMismatch {
                record: matrix
                    .rows
                    .get_index(index)
                    .map(|(id, _)| id.to_string())
                    .unwrap_or_default(),
                expected,
                actual,
            },
        })?;

        let labels: IndexMap<_, _> = matrix
            .rows
            .keys()
            .zip(&model.labels)
            .map(|(id, label)| (*id, ClusterId::from(*label)))
            .collect();

        tracing::debug!(
            target: "partition",
            "k={k}: inertia {:.4} after {} iterations",
            model.inertia,
            model.iterations
        );

        Ok(Partition {
            labels,
            centroids: model.centroids,
            scaler,
            inertia: model.inertia,
            iterations: model.iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;

    fn matrix(rows: &[[f64; 2]]) -> FeatureMatrix {
        FeatureMatrix {
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, r)| (RecordId::from_u32(i as u32 + 1).unwrap(), r.to_vec()))
                .collect(),
            feature_names: vec!["a".to_string(), "b".to_string()],
            blocks: Vec::new(),
        }
    }

    #[test]
    fn test_every_record_gets_a_label_in_range() {
        let m = matrix(&[[0.0, 0.0], [0.1, 0.0], [5.0, 5.0], [5.1, 5.0], [9.0, 0.0]]);
        let partition = PartitionStage::new(KMeansParams::new(3)).run(&m).unwrap();

        assert_eq!(partition.labels.len(), 5);
        assert_eq!(partition.k(), 3);
        assert!(partition.labels.values().all(|c| c.index() < 3));
        assert_eq!(partition.sizes().iter().sum::<usize>(), 5);
        assert!(partition.labels.keys().eq(m.rows.keys()));
    }

    #[test]
    fn test_separated_groups_share_labels() {
        let m = matrix(&[[0.0, 0.0], [0.0, 0.2], [10.0, 10.0], [10.2, 10.0]]);
        let partition = PartitionStage::new(KMeansParams::new(2)).run(&m).unwrap();
        let labels: Vec<_> = partition.labels.values().copied().collect();

        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let m = matrix(&[[1.0, 2.0], [1.5, 1.8], [5.0, 8.0], [8.0, 8.0], [1.0, 0.6], [9.0, 11.0]]);
        let stage = PartitionStage::new(KMeansParams::new(2).with_seed(7));
        let first = stage.run(&m).unwrap();
        let second = stage.run(&m).unwrap();
        assert_eq!(first.labels, second.labels);
        assert_eq!(first.centroids, second.centroids);
    }

    #[test]
    fn test_rejects_bad_cluster_counts() {
        let m = matrix(&[[0.0, 0.0], [1.0, 1.0]]);
        for k in [0, 3] {
            let err = PartitionStage::new(KMeansParams::new(k)).run(&m).unwrap_err();
            assert!(matches!(
                err,
                ClusterError::InvalidClusterCount { records: 2, .. }
            ));
        }
    }

    #[test]
    fn test_k_equals_n() {
        let m = matrix(&[[0.0, 0.0], [1.0, 1.0], [4.0, 0.0]]);
        let partition = PartitionStage::new(KMeansParams::new(3)).run(&m).unwrap();
        let mut sizes = partition.sizes();
        sizes.sort();
        assert_eq!(sizes, vec![1, 1, 1]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let mut m = matrix(&[[0.0, 0.0], [1.0, 1.0]]);
        m.rows.get_index_mut(1).unwrap().1.push(3.0);
        let err = PartitionStage::new(KMeansParams::new(1)).run(&m).unwrap_err();
        assert!(matches!(err, ClusterError::DimensionMismatch { actual: 3, .. }));
    }
}
