//! Load stage - reads and validates the image analysis results
//!
//! The input is the JSON array written by the image analysis step. Each
//! entry carries `original_path` and `analysis`, where `analysis` is the
//! vision model's answer: a JSON string (or, leniently, an inline object)
//! holding the six required attributes.
//!
//! A bad entry never aborts the run. It is logged with its path, counted, and
//! left out of the returned record set.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ClusterError, ClusterResult, RecordError};
use crate::pipeline::types::{LoadedRecords, SkippedRecord};
use crate::types::{AnalysisRecord, Attribute, Attributes, RecordId};

/// One entry of the analysis results file, before validation.
#[derive(Debug, Deserialize)]
struct RawAnalysisEntry {
    original_path: String,
    analysis: Value,
}

/// An entry whose shape and attributes passed validation.
#[derive(Debug)]
struct ValidatedEntry {
    source_path: String,
    attributes: Attributes,
}

impl TryFrom<Value> for ValidatedEntry {
    type Error = RecordError;

    fn try_from(entry: Value) -> Result<Self, Self::Error> {
        let raw: RawAnalysisEntry =
            serde_json::from_value(entry).map_err(|e| RecordError::MalformedEntry(e.to_string()))?;
        Ok(Self {
            attributes: parse_analysis(raw.analysis)?,
            source_path: raw.original_path,
        })
    }
}

/// Stage that turns the analysis results file into typed records.
pub struct LoadStage {
    path: PathBuf,
}

impl LoadStage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and validate the input file.
    ///
    /// Fails only when the file cannot be read or is not a JSON array.
    pub fn run(&self) -> ClusterResult<LoadedRecords> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            ClusterError::InputRead {
                path: self.path.clone(),
                source,
            }
        })?;

        let entries: Vec<Value> =
            serde_json::from_str(&content).map_err(|e| ClusterError::InputFormat {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let loaded = validate_entries(entries);
        tracing::info!(
            target: "loader",
            "loaded {} records from {} ({} skipped)",
            loaded.len(),
            self.path.display(),
            loaded.skipped.len()
        );
        Ok(loaded)
    }
}

/// Validate raw entries into records, assigning ids in input order.
pub fn validate_entries(entries: Vec<Value>) -> LoadedRecords {
    let mut loaded = LoadedRecords::default();
    let mut seen_paths: HashMap<String, RecordId> = HashMap::new();
    let mut next_id = 1u32;

    for (position, entry) in entries.into_iter().enumerate() {
        let path_hint = entry
            .get("original_path")
            .and_then(Value::as_str)
            .map(str::to_string);

        let result = ValidatedEntry::try_from(entry).and_then(|valid| {
            match seen_paths.get(&valid.source_path) {
                Some(first) => Err(RecordError::DuplicatePath {
                    first: first.value(),
                }),
                None => Ok(valid),
            }
        });

        match result {
            Ok(ValidatedEntry {
                source_path,
                attributes,
            }) => {
                let Some(id) = RecordId::from_u32(next_id) else {
                    continue;
                };
                next_id += 1;
                seen_paths.insert(source_path.clone(), id);
                loaded
                    .records
                    .insert(id, AnalysisRecord::new(id, source_path, attributes));
            }
            Err(reason) => {
                tracing::warn!(
                    target: "loader",
                    "skipping entry {position} ({}): {reason}",
                    path_hint.as_deref().unwrap_or("<no original_path>")
                );
                loaded.skipped.push(SkippedRecord {
                    position,
                    path: path_hint,
                    reason,
                });
            }
        }
    }

    loaded
}

/// Decode and check the vision model's analysis payload.
fn parse_analysis(analysis: Value) -> Result<Attributes, RecordError> {
    let object = match analysis {
        Value::String(text) => serde_json::from_str::<Value>(&text)
            .map_err(|e| RecordError::MalformedAnalysis(e.to_string()))?,
        other => other,
    };

    let Some(fields) = object.as_object() else {
        return Err(RecordError::MalformedAnalysis(
            "expected a JSON object".to_string(),
        ));
    };

    for attribute in Attribute::ALL {
        match fields.get(attribute.key()) {
            None | Some(Value::Null) => return Err(RecordError::MissingAttribute(attribute)),
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(RecordError::MalformedAnalysis(format!(
                    "attribute '{attribute}' is not a string"
                )));
            }
        }
    }

    serde_json::from_value(object).map_err(|e| RecordError::MalformedAnalysis(e.to_string()))
}
