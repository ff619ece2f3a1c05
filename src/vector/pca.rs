//! Principal component analysis for low-dimensional projections.
//!
//! Components are the leading eigenvectors of the sample covariance matrix,
//! found by power iteration with deflation. Each component's sign is fixed so
//! its largest-magnitude loading is positive, which keeps output stable
//! between runs.

/// A fitted PCA model.
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Vec<f64>,
    components: Vec<Vec<f64>>,
    explained_variance: Vec<f64>,
    total_variance: f64,
}

impl Pca {
    /// Fit `n_components` components. Returns None with fewer than two rows or
    /// zero columns, where no covariance can be estimated.
    pub fn fit(rows: &[Vec<f64>], n_components: usize, max_iterations: usize) -> Option<Self> {
        let n = rows.len();
        let dim = rows.first().map_or(0, Vec::len);
        if n < 2 || dim == 0 {
            return None;
        }

        let mut mean = vec![0.0; dim];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        let mut cov = vec![vec![0.0; dim]; dim];
        for row in rows {
            let centred: Vec<f64> = row.iter().zip(&mean).map(|(v, m)| v - m).collect();
            for i in 0..dim {
                for j in i..dim {
                    cov[i][j] += centred[i] * centred[j];
                }
            }
        }
        for i in 0..dim {
            for j in i..dim {
                cov[i][j] /= (n - 1) as f64;
                cov[j][i] = cov[i][j];
            }
        }

        let total_variance: f64 = (0..dim).map(|i| cov[i][i]).sum();

        let mut components = Vec::with_capacity(n_components);
        let mut explained_variance = Vec::with_capacity(n_components);
        for _ in 0..n_components.min(dim) {
            let (value, vector) = leading_eigenpair(&cov, max_iterations);
            for i in 0..dim {
                for j in 0..dim {
                    cov[i][j] -= value * vector[i] * vector[j];
                }
            }
            components.push(vector);
            explained_variance.push(value.max(0.0));
        }

        Some(Self {
            mean,
            components,
            explained_variance,
            total_variance,
        })
    }

    /// Component loadings, one row per component.
    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    pub fn explained_variance_ratio(&self) -> Vec<f64> {
        self.explained_variance
            .iter()
            .map(|v| {
                if self.total_variance > 0.0 {
                    v / self.total_variance
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Project a row onto the fitted components.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        self.components
            .iter()
            .map(|component| {
                component
                    .iter()
                    .zip(row.iter().zip(&self.mean))
                    .map(|(c, (v, m))| c * (v - m))
                    .sum()
            })
            .collect()
    }

    /// Sum of absolute loadings per feature across all components.
    pub fn feature_importance(&self) -> Vec<f64> {
        let dim = self.mean.len();
        let mut importance = vec![0.0; dim];
        for component in &self.components {
            for (imp, c) in importance.iter_mut().zip(component) {
                *imp += c.abs();
            }
        }
        importance
    }
}

fn mat_vec(matrix: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
        .collect()
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Largest eigenvalue and unit eigenvector of a symmetric PSD matrix.
fn leading_eigenpair(matrix: &[Vec<f64>], max_iterations: usize) -> (f64, Vec<f64>) {
    let dim = matrix.len();

    // Start from the covariance row with the most mass: it always has a
    // component along the dominant direction unless the matrix is zero
    let start = (0..dim)
        .max_by(|&a, &b| norm(&matrix[a]).total_cmp(&norm(&matrix[b])))
        .unwrap_or(0);
    let mut v = matrix[start].clone();
    let start_norm = norm(&v);
    if start_norm <= f64::EPSILON {
        let mut unit = vec![0.0; dim];
        unit[start] = 1.0;
        return (0.0, unit);
    }
    for x in &mut v {
        *x /= start_norm;
    }

    for _ in 0..max_iterations.max(1) {
        let mut next = mat_vec(matrix, &v);
        let len = norm(&next);
        if len <= f64::EPSILON {
            break;
        }
        for x in &mut next {
            *x /= len;
        }
        let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
        v = next;
        if delta < 1e-12 {
            break;
        }
    }

    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        for x in &mut v {
            *x = -*x;
        }
    }

    let value: f64 = v.iter().zip(mat_vec(matrix, &v)).map(|(a, b)| a * b).sum();
    (value, v)
}
