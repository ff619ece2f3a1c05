//! Configuration module for the clustering pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `STREETSCAPE_` and use double
//! underscores to separate nested levels:
//! - `STREETSCAPE_CLUSTERING__N_CLUSTERS=8` sets `clustering.n_clusters`
//! - `STREETSCAPE_CLUSTERING__SEED=7` sets `clustering.seed`
//! - `STREETSCAPE_PERSISTENCE__WRITE_PROJECTION=false` sets `persistence.write_projection`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::types::Attribute;

const CONFIG_DIR: &str = ".streetscape";
const ENV_PREFIX: &str = "STREETSCAPE_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .streetscape is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Default input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// k-means settings
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Per-attribute vocabulary caps and weights
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Output file names
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// 2-D projection settings
    #[serde(default)]
    pub projection: ProjectionConfig,

    /// Pipeline execution settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    /// Analysis results written by the image analysis step
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,

    /// Directory that receives the cluster results
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClusteringConfig {
    /// Number of clusters (k)
    #[serde(default = "default_n_clusters")]
    pub n_clusters: usize,

    /// Seed for centroid initialisation
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Independent k-means restarts; the lowest-inertia run wins
    #[serde(default = "default_n_init")]
    pub n_init: usize,

    /// Iteration cap per restart
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Convergence threshold on centroid movement, relative to data variance
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AttributeWeight {
    /// Attribute to vectorize
    pub attribute: Attribute,

    /// Maximum number of terms kept in this attribute's vocabulary
    pub max_features: usize,

    /// Multiplier applied to every TF-IDF score of this attribute
    pub weight: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeaturesConfig {
    /// Vectorized attributes, in column order
    #[serde(default = "default_attributes")]
    pub attributes: Vec<AttributeWeight>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PersistenceConfig {
    /// File name of the cluster summaries inside the output directory
    #[serde(default = "default_results_file")]
    pub results_file: String,

    /// File name of the 2-D projection inside the output directory
    #[serde(default = "default_projection_file")]
    pub projection_file: String,

    /// Whether to compute and write the projection at all
    #[serde(default = "default_true")]
    pub write_projection: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProjectionConfig {
    /// Number of features listed in the importance ranking
    #[serde(default = "default_top_features")]
    pub top_features: usize,

    /// Power-iteration cap per principal component
    #[serde(default = "default_power_iterations")]
    pub power_iterations: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineSettings {
    /// Vectorize attributes in parallel
    #[serde(default = "default_true")]
    pub parallel_features: bool,

    /// Log per-stage timing at info level
    #[serde(default = "default_false")]
    pub pipeline_tracing: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `loader = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_input_file() -> PathBuf {
    PathBuf::from("results/analysis_results/analysis_results.json")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("results/cluster_results")
}
fn default_n_clusters() -> usize {
    5
}
fn default_seed() -> u64 {
    42
}
fn default_n_init() -> usize {
    10
}
fn default_max_iterations() -> usize {
    300
}
fn default_tolerance() -> f64 {
    1e-4
}
fn default_results_file() -> String {
    "cluster_analysis_results.json".to_string()
}
fn default_projection_file() -> String {
    "cluster_projection.json".to_string()
}
fn default_top_features() -> usize {
    30
}
fn default_power_iterations() -> usize {
    500
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}

/// Style, futurism and mood dominate; palette and materials are secondary.
fn default_attributes() -> Vec<AttributeWeight> {
    [
        (Attribute::ArchitecturalStyle, 25, 1.5),
        (Attribute::FuturisticElements, 25, 1.5),
        (Attribute::Mood, 15, 1.2),
        (Attribute::ColorPalette, 10, 0.7),
        (Attribute::DominantMaterials, 10, 0.7),
    ]
    .into_iter()
    .map(|(attribute, max_features, weight)| AttributeWeight {
        attribute,
        max_features,
        weight,
    })
    .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            paths: PathsConfig::default(),
            clustering: ClusteringConfig::default(),
            features: FeaturesConfig::default(),
            persistence: PersistenceConfig::default(),
            projection: ProjectionConfig::default(),
            pipeline: PipelineSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_file: default_input_file(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            n_clusters: default_n_clusters(),
            seed: default_seed(),
            n_init: default_n_init(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            attributes: default_attributes(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            results_file: default_results_file(),
            projection_file: default_projection_file(),
            write_projection: true,
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            top_features: default_top_features(),
            power_iterations: default_power_iterations(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            parallel_features: true,
            pipeline_tracing: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore
            // stays inside field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
    }

    /// Find settings.toml by looking for .streetscape from the current
    /// directory up to the filesystem root
    pub fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .streetscape is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'streetscape init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let mut settings = Settings::default();
        if let Ok(current_dir) = std::env::current_dir() {
            settings.workspace_root = Some(current_dir);
        }

        settings.save(&config_path)?;
        Ok(config_path)
    }

    /// Path of the cluster summaries file for an output directory.
    pub fn results_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.persistence.results_file)
    }

    /// Resolve a configured path against the workspace root.
    ///
    /// Absolute paths, and any path when no workspace root is known, are
    /// returned unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
