//! Column-wise standardisation to zero mean and unit variance.

use serde::{Deserialize, Serialize};

/// Per-column mean and scale learned from a matrix.
///
/// Uses the population standard deviation. Columns with (numerically) zero
/// variance get scale 1, so they are centred but not blown up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit on rows of equal length. An empty matrix yields a zero-width scaler.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row.as_ref()) {
                *mean += value;
            }
        }
        if n > 0.0 {
            for mean in &mut means {
                *mean /= n;
            }
        }

        let mut variances = vec![0.0; width];
        for row in rows {
            for ((var, value), mean) in variances.iter_mut().zip(row.as_ref()).zip(&means) {
                let d = value - mean;
                *var += d * d;
            }
        }

        let scales = variances
            .iter()
            .zip(&means)
            .map(|(var, mean)| {
                let std = if n > 0.0 { (var / n).sqrt() } else { 0.0 };
                if std <= 1e-10 * (1.0 + mean.abs()) {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        Self { means, scales }
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((v, mean), scale)| (v - mean) / scale)
            .collect()
    }

    /// Map a standardised row back to the original feature space.
    pub fn inverse_transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((v, mean), scale)| v * scale + mean)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_mean_unit_variance() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 20.0], vec![5.0, 30.0]];
        let scaler = StandardScaler::fit(&rows);
        let scaled: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform(r)).collect();

        for col in 0..2 {
            let mean: f64 = scaled.iter().map(|r| r[col]).sum::<f64>() / 3.0;
            let var: f64 = scaled.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_column_is_centred_only() {
        let rows = vec![vec![0.7, 1.0], vec![0.7, 2.0]];
        let scaler = StandardScaler::fit(&rows);
        assert_eq!(scaler.scales()[0], 1.0);
        let scaled = scaler.transform(&rows[0]);
        assert!(scaled[0].abs() < 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        let rows = vec![vec![2.0, -1.0], vec![4.0, 5.0], vec![9.0, 0.5]];
        let scaler = StandardScaler::fit(&rows);
        let back = scaler.inverse_transform(&scaler.transform(&rows[2]));
        assert!((back[0] - 9.0).abs() < 1e-12);
        assert!((back[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_width_matrix() {
        let rows: Vec<Vec<f64>> = vec![vec![], vec![]];
        let scaler = StandardScaler::fit(&rows);
        assert_eq!(scaler.width(), 0);
        assert!(scaler.transform(&[]).is_empty());
    }
}
