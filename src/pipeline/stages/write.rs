//! Write stage - persist results atomically
//!
//! Output is serialized into a temp file in the destination directory and
//! renamed over the target, so a failed run never leaves a truncated file and
//! never clobbers the previous one.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{ClusterError, ClusterResult};
use crate::pipeline::types::ClusterSummaries;

/// Serialize `value` as pretty JSON to `path`, replacing it atomically.
pub fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
    what: &'static str,
) -> ClusterResult<()> {
    // Serialize before touching the filesystem
    let json = serde_json::to_vec_pretty(value)
        .map_err(|source| ClusterError::Serialization { what, source })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let write_err = |source: std::io::Error| ClusterError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(&parent).map_err(write_err)?;
    let mut temp = NamedTempFile::new_in(&parent).map_err(write_err)?;
    temp.write_all(&json).map_err(write_err)?;
    temp.write_all(b"\n").map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    tracing::debug!(
        target: "persist",
        "wrote {what} ({} bytes) to {}",
        json.len() + 1,
        path.display()
    );
    Ok(())
}

/// Remove an output file a previous run left behind.
///
/// Returns whether a file was removed. A missing file is not an error.
pub fn remove_stale(path: &Path) -> ClusterResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(target: "persist", "removed stale {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ClusterError::FileWrite {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read a summaries file written by a previous run.
pub fn load_summaries(path: &Path) -> ClusterResult<ClusterSummaries> {
    let content = std::fs::read_to_string(path).map_err(|e| ClusterError::ResultsLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ClusterError::ResultsLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::ClusterSummary;
    use crate::types::ClusterId;
    use indexmap::IndexMap;
    use serde::ser::Error as _;
    use tempfile::TempDir;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refusing to serialize"))
        }
    }

    fn summaries() -> ClusterSummaries {
        let mut map = IndexMap::new();
        map.insert(
            ClusterId::new(0),
            ClusterSummary {
                size: 1,
                common_styles: vec!["art deco".to_string()],
                sample_paths: vec!["a.jpg".to_string()],
                ..Default::default()
            },
        );
        map.insert(ClusterId::new(1), ClusterSummary::default());
        ClusterSummaries(map)
    }

    #[test]
    fn test_write_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/out/cluster_analysis_results.json");

        write_json_atomic(&path, &summaries(), "cluster summaries").unwrap();
        let loaded = load_summaries(&path).unwrap();
        assert_eq!(loaded, summaries());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"common_styles\""));
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("results.json");
        std::fs::write(&path, "previous").unwrap();

        let err = write_json_atomic(&path, &Unserializable, "test value").unwrap_err();
        assert!(matches!(err, ClusterError::Serialization { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");

        // No temp files left behind
        let entries = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_load_reports_missing_and_invalid_files() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            load_summaries(&missing),
            Err(ClusterError::ResultsLoad { .. })
        ));

        let invalid = temp_dir.path().join("invalid.json");
        std::fs::write(&invalid, "[1, 2]").unwrap();
        assert!(matches!(
            load_summaries(&invalid),
            Err(ClusterError::ResultsLoad { .. })
        ));
    }

    #[test]
    fn test_remove_stale_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cluster_projection.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(remove_stale(&path).unwrap());
        assert!(!path.exists());
        assert!(!remove_stale(&path).unwrap());

        // A directory in the way is a write failure, not a silent skip
        let err = remove_stale(temp_dir.path()).unwrap_err();
        assert!(matches!(err, ClusterError::FileWrite { .. }));
    }
}
