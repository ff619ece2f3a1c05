//! Summarize stage - reduce each cluster to its distinct attribute values

use indexmap::IndexMap;

use crate::error::{ClusterError, ClusterResult};
use crate::pipeline::types::{ClusterSummaries, SummaryBuilder};
use crate::types::{AnalysisRecord, ClusterId, RecordId};

/// Build one summary per cluster id in `0..k`, in id order.
///
/// Clusters without members still get an entry of size zero. Value sets keep
/// first-seen order and de-duplicate on exact string equality. Every record
/// must carry a label below `k`.
pub fn summarize(
    records: &IndexMap<RecordId, AnalysisRecord>,
    labels: &IndexMap<RecordId, ClusterId>,
    k: usize,
) -> ClusterResult<ClusterSummaries> {
    let mut builders: Vec<SummaryBuilder> = (0..k).map(|_| SummaryBuilder::default()).collect();

    for (id, record) in records {
        let Some(cluster) = labels.get(id) else {
            return Err(ClusterError::Assignment {
                path: record.source_path.clone(),
                reason: "record has no cluster label".to_string(),
            });
        };
        let Some(builder) = builders.get_mut(cluster.index()) else {
            return Err(ClusterError::Assignment {
                path: record.source_path.clone(),
                reason: format!("label {cluster} is outside 0..{k}"),
            });
        };
        builder.add(record);
    }

    let summaries: IndexMap<_, _> = builders
        .into_iter()
        .enumerate()
        .map(|(i, builder)| (ClusterId::from(i), builder.build()))
        .collect();

    let empty = summaries.values().filter(|s| s.size == 0).count();
    if empty > 0 {
        tracing::debug!(target: "summary", "{empty} of {k} clusters have no members");
    }

    Ok(ClusterSummaries(summaries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attributes;

    fn record(id: u32, style: &str, label: &str) -> (RecordId, AnalysisRecord) {
        let id = RecordId::from_u32(id).unwrap();
        let record = AnalysisRecord::new(
            id,
            format!("{label}.jpg"),
            Attributes {
                architectural_style: style.to_string(),
                futuristic_elements: "drones".to_string(),
                mood: "calm".to_string(),
                color_palette: "gray".to_string(),
                dominant_materials: "concrete".to_string(),
                short_descriptive_label: label.to_string(),
            },
        );
        (id, record)
    }

    fn labels(records: &IndexMap<RecordId, AnalysisRecord>, ids: &[u32]) -> IndexMap<RecordId, ClusterId> {
        records.keys().zip(ids).map(|(r, c)| (*r, ClusterId::new(*c))).collect()
    }

    #[test]
    fn test_one_entry_per_cluster_including_empty() {
        let records: IndexMap<_, _> = [record(1, "gothic", "a"), record(2, "gothic", "b")]
            .into_iter()
            .collect();
        let summaries = summarize(&records, &labels(&records, &[0, 2]), 4).unwrap();

        assert_eq!(summaries.len(), 4);
        let ids: Vec<u32> = summaries.iter().map(|(id, _)| id.value()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(summaries.get(ClusterId::new(1)).unwrap().size, 0);
        assert!(summaries.get(ClusterId::new(3)).unwrap().common_styles.is_empty());
        let sizes: usize = summaries.sizes().iter().map(|(_, s)| s).sum();
        assert_eq!(sizes, 2);
    }

    #[test]
    fn test_values_deduplicated_in_first_seen_order() {
        let records: IndexMap<_, _> = [
            record(1, "gothic", "spire"),
            record(2, "brutalist", "slab"),
            record(3, "gothic", "spire"),
        ]
        .into_iter()
        .collect();
        let summaries = summarize(&records, &labels(&records, &[0, 0, 0]), 1).unwrap();
        let summary = summaries.get(ClusterId::new(0)).unwrap();

        assert_eq!(summary.size, 3);
        assert_eq!(summary.common_styles, vec!["gothic", "brutalist"]);
        assert_eq!(summary.common_labels, vec!["spire", "slab"]);
        assert_eq!(summary.common_moods, vec!["calm"]);
        assert_eq!(summary.sample_paths, vec!["spire.jpg", "slab.jpg", "spire.jpg"]);
    }

    #[test]
    fn test_missing_or_out_of_range_label_is_an_error() {
        let records: IndexMap<_, _> = [record(1, "gothic", "a"), record(2, "gothic", "b")]
            .into_iter()
            .collect();

        let mut partial = labels(&records, &[0, 0]);
        partial.pop();
        assert!(matches!(
            summarize(&records, &partial, 1),
            Err(ClusterError::Assignment { .. })
        ));

        let out_of_range = labels(&records, &[0, 5]);
        let err = summarize(&records, &out_of_range, 2).unwrap_err();
        assert!(matches!(err, ClusterError::Assignment { ref path, .. } if path == "b.jpg"));
    }
}
