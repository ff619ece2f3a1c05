//! Pipeline configuration
//!
//! Built fresh for every run from Settings (.streetscape/settings.toml) plus
//! CLI overrides. Nothing here outlives a single pipeline invocation.

use crate::Settings;
use crate::config::AttributeWeight;
use crate::error::{ClusterError, ClusterResult};
use crate::vector::KMeansParams;

/// Configuration for one clustering run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of clusters (k)
    pub n_clusters: usize,

    /// Seed for centroid initialisation
    pub seed: u64,

    /// k-means restarts
    pub n_init: usize,

    /// Iteration cap per restart
    pub max_iterations: usize,

    /// Relative convergence tolerance
    pub tolerance: f64,

    /// Vectorized attributes in column order
    pub attributes: Vec<AttributeWeight>,

    /// Vectorize attributes on the rayon pool
    pub parallel_features: bool,

    /// Compute and write the 2-D projection
    pub write_projection: bool,

    /// Features listed in the importance ranking
    pub top_features: usize,

    /// Power-iteration cap for PCA
    pub power_iterations: usize,

    /// File name of the cluster summaries
    pub results_file: String,

    /// File name of the projection
    pub projection_file: String,

    /// Log per-stage timing at info level
    pub pipeline_tracing: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl PipelineConfig {
    /// Create config from Settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let clustering = &settings.clustering;
        Self {
            n_clusters: clustering.n_clusters,
            seed: clustering.seed,
            n_init: clustering.n_init,
            max_iterations: clustering.max_iterations,
            tolerance: clustering.tolerance,
            attributes: settings.features.attributes.clone(),
            parallel_features: settings.pipeline.parallel_features,
            write_projection: settings.persistence.write_projection,
            top_features: settings.projection.top_features,
            power_iterations: settings.projection.power_iterations,
            results_file: settings.persistence.results_file.clone(),
            projection_file: settings.persistence.projection_file.clone(),
            pipeline_tracing: settings.pipeline.pipeline_tracing,
        }
    }

    /// Set cluster count
    pub fn with_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    /// Set initialisation seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable the projection output
    pub fn with_projection(mut self, enabled: bool) -> Self {
        self.write_projection = enabled;
        self
    }

    /// k-means parameters for this run.
    pub fn kmeans_params(&self) -> KMeansParams {
        KMeansParams::new(self.n_clusters)
            .with_seed(self.seed)
            .with_n_init(self.n_init)
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.tolerance)
    }

    /// Reject settings no run could succeed with.
    ///
    /// The cluster count is checked against the record count later, once the
    /// number of valid records is known.
    pub fn validate(&self) -> ClusterResult<()> {
        if self.attributes.is_empty() {
            return Err(ClusterError::ConfigError {
                reason: "features.attributes must list at least one attribute".to_string(),
            });
        }

        for (i, spec) in self.attributes.iter().enumerate() {
            if spec.max_features == 0 {
                return Err(ClusterError::ConfigError {
                    reason: format!("max_features for '{}' must be at least 1", spec.attribute),
                });
            }
            if !spec.weight.is_finite() || spec.weight < 0.0 {
                return Err(ClusterError::ConfigError {
                    reason: format!(
                        "weight for '{}' must be a non-negative number, got {}",
                        spec.attribute, spec.weight
                    ),
                });
            }
            if self.attributes[..i]
                .iter()
                .any(|other| other.attribute == spec.attribute)
            {
                return Err(ClusterError::ConfigError {
                    reason: format!("attribute '{}' is listed twice", spec.attribute),
                });
            }
        }

        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ClusterError::ConfigError {
                reason: format!("tolerance must be a non-negative number, got {}", self.tolerance),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attribute;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.n_clusters, 5);
        assert_eq!(config.seed, 42);
        assert_eq!(config.attributes.len(), 5);
        assert!(config.write_projection);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default()
            .with_clusters(2)
            .with_seed(9)
            .with_projection(false);

        assert_eq!(config.n_clusters, 2);
        assert!(!config.write_projection);

        let params = config.kmeans_params();
        assert_eq!(params.k, 2);
        assert_eq!(params.seed, 9);
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.clustering.n_init = 4;
        settings.persistence.results_file = "clusters.json".to_string();

        let config = PipelineConfig::from_settings(&settings);
        assert_eq!(config.n_init, 4);
        assert_eq!(config.results_file, "clusters.json");
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_weights() {
        let mut config = PipelineConfig::default();
        config.attributes.push(AttributeWeight {
            attribute: Attribute::Mood,
            max_features: 3,
            weight: 1.0,
        });
        assert!(matches!(
            config.validate(),
            Err(ClusterError::ConfigError { .. })
        ));

        let mut config = PipelineConfig::default();
        config.attributes[0].weight = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.attributes[1].max_features = 0;
        assert!(config.validate().is_err());
    }
}
