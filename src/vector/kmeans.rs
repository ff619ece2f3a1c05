//! Seeded k-means clustering.
//!
//! Lloyd iterations with k-means++ initialisation. Several restarts are run
//! from one seeded generator and the lowest-inertia result is kept, so the
//! outcome is a pure function of the data and the seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use thiserror::Error;

/// Errors that can occur during clustering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusteringError {
    #[error("Cannot cluster an empty set of vectors")]
    EmptyData,

    #[error("Invalid cluster count {k} for {n} vectors")]
    InvalidClusterCount { k: usize, n: usize },

    #[error("Vector {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Parameters for a k-means fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub k: usize,
    pub seed: u64,
    pub n_init: usize,
    pub max_iterations: usize,
    /// Convergence threshold on total squared centroid shift, relative to
    /// the mean per-column variance of the data.
    pub tolerance: f64,
}

impl KMeansParams {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            seed: 42,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }
}

/// Result of a k-means fit.
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// `k` centroids, same dimension as the input.
    pub centroids: Vec<Vec<f64>>,
    /// Cluster index per input row.
    pub labels: Vec<usize>,
    /// Sum of squared distances of rows to their centroid.
    pub inertia: f64,
    /// Lloyd iterations run by the winning restart.
    pub iterations: usize,
}

/// Fit k-means to `data`.
pub fn fit(data: &[Vec<f64>], params: &KMeansParams) -> Result<KMeansModel, ClusteringError> {
    if data.is_empty() {
        return Err(ClusteringError::EmptyData);
    }
    let n = data.len();
    if params.k == 0 || params.k > n {
        return Err(ClusteringError::InvalidClusterCount { k: params.k, n });
    }

    let dim = data[0].len();
    if let Some((index, row)) = data.iter().enumerate().find(|(_, r)| r.len() != dim) {
        return Err(ClusteringError::DimensionMismatch {
            index,
            expected: dim,
            actual: row.len(),
        });
    }

    let tolerance = params.tolerance * mean_variance(data, dim);
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best: Option<KMeansModel> = None;

    for run in 0..params.n_init.max(1) {
        let seeds = init_plus_plus(data, params.k, &mut rng);
        let model = lloyd(data, seeds, params.max_iterations.max(1), tolerance);
        tracing::trace!(
            target: "partition",
            "restart {run}: inertia {:.6} after {} iterations",
            model.inertia,
            model.iterations
        );
        if best.as_ref().is_none_or(|b| model.inertia < b.inertia) {
            best = Some(model);
        }
    }

    best.ok_or(ClusteringError::EmptyData)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// (index, squared distance) of the closest centroid.
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn mean_variance(data: &[Vec<f64>], dim: usize) -> f64 {
    if dim == 0 {
        return 0.0;
    }
    let n = data.len() as f64;
    let mut total = 0.0;
    for col in 0..dim {
        let mean = data.iter().map(|r| r[col]).sum::<f64>() / n;
        total += data.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / n;
    }
    total / dim as f64
}

/// k-means++ seeding: each next centre is drawn with probability
/// proportional to its squared distance from the nearest chosen centre.
fn init_plus_plus(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = data.len();
    let mut chosen = vec![false; n];
    let mut centres = Vec::with_capacity(k);

    let first = rng.random_range(0..n);
    chosen[first] = true;
    centres.push(data[first].clone());

    let mut dist: Vec<f64> = data
        .iter()
        .map(|p| squared_distance(p, &data[first]))
        .collect();

    while centres.len() < k {
        let total: f64 = dist.iter().sum();
        let next = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            let mut pick = None;
            for (i, d) in dist.iter().enumerate() {
                if *d <= 0.0 {
                    continue;
                }
                acc += d;
                pick = Some(i);
                if acc > target {
                    break;
                }
            }
            pick.unwrap_or(first)
        } else {
            // All remaining points coincide with chosen centres
            let free: Vec<usize> = (0..n).filter(|i| !chosen[*i]).collect();
            free[rng.random_range(0..free.len())]
        };

        chosen[next] = true;
        centres.push(data[next].clone());
        for (d, p) in dist.iter_mut().zip(data) {
            let candidate = squared_distance(p, &data[next]);
            if candidate < *d {
                *d = candidate;
            }
        }
    }

    centres
}

fn lloyd(
    data: &[Vec<f64>],
    mut centroids: Vec<Vec<f64>>,
    max_iterations: usize,
    tolerance: f64,
) -> KMeansModel {
    let k = centroids.len();
    let dim = data[0].len();
    let mut labels = vec![0usize; data.len()];
    let mut iterations = 0;

    for _ in 0..max_iterations {
        iterations += 1;

        let mut distances = vec![0.0; data.len()];
        for (i, point) in data.iter().enumerate() {
            let (label, d) = nearest(point, &centroids);
            labels[i] = label;
            distances[i] = d;
        }

        let mut counts = vec![0usize; k];
        for &label in &labels {
            counts[label] += 1;
        }

        // Re-seed emptied clusters with the worst-fit point of a cluster that
        // can spare it
        for empty in (0..k).filter(|c| counts[*c] == 0).collect::<Vec<_>>() {
            let donor = (0..data.len())
                .filter(|&i| counts[labels[i]] > 1 && distances[i] > 0.0)
                .max_by(|&a, &b| distances[a].total_cmp(&distances[b]));
            if let Some(i) = donor {
                counts[labels[i]] -= 1;
                labels[i] = empty;
                counts[empty] = 1;
                distances[i] = 0.0;
                centroids[empty] = data[i].clone();
            }
        }

        let mut sums = vec![vec![0.0; dim]; k];
        for (point, &label) in data.iter().zip(&labels) {
            for (s, v) in sums[label].iter_mut().zip(point) {
                *s += v;
            }
        }

        let mut shift = 0.0;
        for (c, sum) in sums.into_iter().enumerate() {
            if counts[c] == 0 {
                continue;
            }
            let updated: Vec<f64> = sum.into_iter().map(|s| s / counts[c] as f64).collect();
            shift += squared_distance(&updated, &centroids[c]);
            centroids[c] = updated;
        }

        if shift <= tolerance {
            break;
        }
    }

    let mut inertia = 0.0;
    for (i, point) in data.iter().enumerate() {
        let (label, d) = nearest(point, &centroids);
        labels[i] = label;
        inertia += d;
    }

    KMeansModel {
        centroids,
        labels,
        inertia,
        iterations,
    }
}
