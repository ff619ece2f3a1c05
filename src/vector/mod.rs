//! Numeric building blocks for the clustering pipeline.
//!
//! Everything here works on dense `f64` rows and knows nothing about
//! analysis records:
//! - [`tfidf`]: text to TF-IDF vectors with a bounded vocabulary
//! - [`scaler`]: column standardisation
//! - [`kmeans`]: seeded k-means with k-means++ initialisation
//! - [`pca`]: principal components for 2-D projections

pub mod kmeans;
pub mod pca;
pub mod scaler;
pub mod tfidf;

pub use kmeans::{ClusteringError, KMeansModel, KMeansParams};
pub use pca::Pca;
pub use scaler::StandardScaler;
pub use tfidf::{FittedTfidf, TfidfVectorizer, tokenize};
