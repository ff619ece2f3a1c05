//! Extract stage - weighted per-attribute TF-IDF features
//!
//! Each configured attribute gets its own vectorizer fitted on the
//! normalized values of that attribute only. The block is scaled by the
//! attribute weight and the blocks are concatenated in configuration order.
//! Attributes are independent, so they are vectorized on the rayon pool.

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::config::AttributeWeight;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::stages::normalize::normalize;
use crate::pipeline::types::{FeatureBlock, FeatureMatrix};
use crate::types::{AnalysisRecord, Attribute, RecordId};
use crate::vector::TfidfVectorizer;

/// Columns produced for one attribute, before concatenation.
struct AttributeColumns {
    attribute: Attribute,
    weight: f64,
    terms: Vec<String>,
    rows: Vec<Vec<f64>>,
}

/// Stage that builds the feature matrix.
pub struct ExtractStage {
    attributes: Vec<AttributeWeight>,
    parallel: bool,
}

impl ExtractStage {
    pub fn new(attributes: Vec<AttributeWeight>, parallel: bool) -> Self {
        Self {
            attributes,
            parallel,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.attributes.clone(), config.parallel_features)
    }

    /// Vectorize every record. Row order and keys follow `records`.
    pub fn run(&self, records: &IndexMap<RecordId, AnalysisRecord>) -> FeatureMatrix {
        let columns: Vec<AttributeColumns> = if self.parallel {
            self.attributes
                .par_iter()
                .map(|entry| vectorize_attribute(entry, records))
                .collect()
        } else {
            self.attributes
                .iter()
                .map(|entry| vectorize_attribute(entry, records))
                .collect()
        };

        let mut matrix = FeatureMatrix::default();
        let mut offset = 0;
        for block in &columns {
            let width = block.terms.len();
            matrix.blocks.push(FeatureBlock {
                attribute: block.attribute,
                offset,
                width,
                weight: block.weight,
            });
            matrix.feature_names.extend(
                block
                    .terms
                    .iter()
                    .map(|term| format!("{}_{term}", block.attribute)),
            );
            offset += width;
        }

        for (position, id) in records.keys().enumerate() {
            let mut row = Vec::with_capacity(offset);
            for block in &columns {
                row.extend_from_slice(&block.rows[position]);
            }
            matrix.rows.insert(*id, row);
        }

        tracing::debug!(
            target: "features",
            "built {} x {} feature matrix from {} attributes",
            matrix.rows.len(),
            matrix.dimension(),
            matrix.blocks.len()
        );
        matrix
    }
}

fn vectorize_attribute(
    entry: &AttributeWeight,
    records: &IndexMap<RecordId, AnalysisRecord>,
) -> AttributeColumns {
    let corpus: Vec<String> = records
        .values()
        .map(|record| normalize(record.attribute(entry.attribute)))
        .collect();

    let (fitted, mut rows) = TfidfVectorizer::new(entry.max_features).fit_transform(&corpus);
    if fitted.is_empty() {
        tracing::debug!(
            target: "features",
            "attribute '{}' has no terms, contributing no columns",
            entry.attribute
        );
    }

    for row in &mut rows {
        for value in row.iter_mut() {
            *value *= entry.weight;
        }
    }

    AttributeColumns {
        attribute: entry.attribute,
        weight: entry.weight,
        terms: fitted.vocabulary().to_vec(),
        rows,
    }
}
