//! End-to-end runs of the clustering pipeline through the library API.

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use streetscape::pipeline::{Pipeline, PipelineConfig, Projection, load_summaries};
use streetscape::{ClusterError, ClusterId};
use tempfile::TempDir;

fn entry(
    path: &str,
    style: &str,
    elements: &str,
    mood: &str,
    color: &str,
    materials: &str,
    label: &str,
) -> Value {
    let analysis = json!({
        "architectural_style": style,
        "futuristic_elements": elements,
        "mood": mood,
        "color_palette": color,
        "dominant_materials": materials,
        "short_descriptive_label": label,
    });
    json!({
        "original_path": path,
        "processed_path": format!("processed/{path}"),
        "analysis": analysis.to_string(),
        "timestamp": "2024-05-01T12:00:00",
    })
}

fn brutalist(path: &str) -> Value {
    entry(path, "brutalist", "fog drones", "melancholic", "gray", "concrete", "foggy slab")
}

fn solarpunk(path: &str) -> Value {
    entry(path, "solarpunk", "vertical gardens", "hopeful", "green", "timber", "garden tower")
}

fn write_input(dir: &Path, entries: &[Value]) -> PathBuf {
    let path = dir.join("analysis_results.json");
    std::fs::write(&path, serde_json::to_string_pretty(entries).unwrap()).unwrap();
    path
}

fn six_records() -> Vec<Value> {
    vec![
        brutalist("img/b1.jpg"),
        solarpunk("img/s1.jpg"),
        brutalist("img/b2.jpg"),
        solarpunk("img/s2.jpg"),
        solarpunk("img/s3.jpg"),
        solarpunk("img/s4.jpg"),
    ]
}

#[test]
fn test_two_themes_split_into_two_clusters() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(temp_dir.path(), &six_records());
    let out = temp_dir.path().join("cluster_results");

    let report = Pipeline::new(PipelineConfig::default().with_clusters(2))
        .run(&input, &out)
        .unwrap();
    assert_eq!(report.processed, 6);
    assert!(report.skipped.is_empty());

    let summaries = load_summaries(&report.results_path).unwrap();
    assert_eq!(summaries.len(), 2);

    let mut sizes: Vec<usize> = summaries.iter().map(|(_, s)| s.size).collect();
    sizes.sort();
    assert_eq!(sizes, vec![2, 4]);

    for (_, summary) in summaries.iter() {
        for set in [
            &summary.common_labels,
            &summary.common_styles,
            &summary.common_elements,
            &summary.common_materials,
            &summary.common_moods,
            &summary.common_colors,
        ] {
            assert_eq!(set.len(), 1, "mixed values in {summary:?}");
        }
        let expected_style = if summary.size == 2 { "brutalist" } else { "solarpunk" };
        assert_eq!(summary.common_styles[0], expected_style);
        assert_eq!(
            summary.sample_paths.len(),
            summary.size.min(3),
            "sample paths capped at three"
        );
    }
}

#[test]
fn test_results_file_shape() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(temp_dir.path(), &six_records());
    let out = temp_dir.path().join("out");

    Pipeline::new(PipelineConfig::default().with_clusters(2))
        .run(&input, &out)
        .unwrap();

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("cluster_analysis_results.json")).unwrap())
            .unwrap();
    let obj = raw.as_object().unwrap();
    let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["0", "1"]);
    for key in [
        "size",
        "common_labels",
        "common_styles",
        "common_elements",
        "common_materials",
        "common_moods",
        "common_colors",
        "sample_paths",
    ] {
        assert!(obj["0"].get(key).is_some(), "missing {key}");
    }
}

#[test]
fn test_more_clusters_than_distinct_points() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(
        temp_dir.path(),
        &[
            brutalist("a.jpg"),
            brutalist("b.jpg"),
            brutalist("c.jpg"),
            solarpunk("d.jpg"),
        ],
    );

    let report = Pipeline::new(PipelineConfig::default().with_clusters(4))
        .run(&input, temp_dir.path())
        .unwrap();
    let summaries = load_summaries(&report.results_path).unwrap();

    assert_eq!(summaries.len(), 4);
    for id in 0..4 {
        assert!(summaries.get(ClusterId::new(id)).is_some());
    }
    let total: usize = summaries.iter().map(|(_, s)| s.size).sum();
    assert_eq!(total, 4);
}

#[test]
fn test_same_seed_same_result() {
    let temp_dir = TempDir::new().unwrap();
    let mut entries = six_records();
    entries.push(entry("m1.jpg", "art deco", "neon signage", "tense", "gold", "brass", "lobby"));
    entries.push(entry("m2.jpg", "art deco revival", "neon", "tense glamorous", "gold and black", "brass", "hall"));
    let input = write_input(temp_dir.path(), &entries);

    let run = |dir: &str| {
        let out = temp_dir.path().join(dir);
        let config = PipelineConfig::default().with_clusters(3).with_seed(11);
        let report = Pipeline::new(config).run(&input, &out).unwrap();
        load_summaries(&report.results_path).unwrap()
    };
    assert_eq!(run("first"), run("second"));
}

#[test]
fn test_malformed_records_skipped_and_counted() {
    let temp_dir = TempDir::new().unwrap();
    let mut entries = six_records();
    entries.insert(1, json!({"original_path": "bad.jpg", "analysis": "I could not see the image"}));
    entries.push(json!({"original_path": "img/b1.jpg", "analysis": "{}"}));
    entries.push(json!("not an object"));
    let input = write_input(temp_dir.path(), &entries);

    let report = Pipeline::new(PipelineConfig::default().with_clusters(2))
        .run(&input, temp_dir.path())
        .unwrap();

    assert_eq!(report.processed, 6);
    assert_eq!(report.skipped.len(), 3);
    assert_eq!(report.skipped[0].path.as_deref(), Some("bad.jpg"));
    assert_eq!(report.skipped[0].position, 1);
}

#[test]
fn test_projection_reuses_fitted_centroids() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(temp_dir.path(), &six_records());
    let out = temp_dir.path().join("out");

    let report = Pipeline::new(PipelineConfig::default().with_clusters(2))
        .run(&input, &out)
        .unwrap();
    let path = report.projection_path.unwrap();
    let projection: Projection =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(projection.points.len(), 6);
    assert_eq!(projection.centroids.len(), 2);
    assert!(projection.feature_importance.len() <= 30);

    // Members of a cluster are identical here, so each projected centroid
    // coincides with its members
    for centroid in &projection.centroids {
        let member = projection
            .points
            .iter()
            .find(|p| p.cluster == centroid.cluster)
            .unwrap();
        assert!((member.x - centroid.x).abs() < 1e-6);
        assert!((member.y - centroid.y).abs() < 1e-6);
    }
}

#[test]
fn test_cluster_count_above_record_count_fails_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(temp_dir.path(), &six_records());
    let out = temp_dir.path().join("out");

    let err = Pipeline::new(PipelineConfig::default().with_clusters(7))
        .run(&input, &out)
        .unwrap_err();
    assert!(matches!(
        err,
        ClusterError::InvalidClusterCount { k: 7, records: 6 }
    ));
    assert!(!out.exists());
}
