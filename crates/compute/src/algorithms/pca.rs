//! Principal component analysis for small inputs.
//!
//! Works on the `n × n` Gram matrix of the centred data rather than the
//! `d × d` covariance, since here `n` is a handful of tabs and `d` is the
//! embedding width. Eigenpairs come from cyclic Jacobi rotations.

use tabgroup_core::{Result, TabGroupError};

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-12;

/// Linear projection onto the leading principal components.
#[derive(Debug, Clone)]
pub struct Pca {
    n_components: usize,
    explained_variance: Option<Vec<f64>>,
}

impl Pca {
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            explained_variance: None,
        }
    }

    /// Variance captured by each kept component, after `fit_transform`.
    pub fn explained_variance(&self) -> Option<&[f64]> {
        self.explained_variance.as_deref()
    }

    /// Fit on `data` and return its component scores.
    ///
    /// The output width is `n_components`, capped at the input width. Each
    /// component's sign is fixed so its largest-magnitude score is positive.
    pub fn fit_transform(&mut self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let n = data.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let dim = data[0].len();
        if let Some(row) = data.iter().find(|r| r.len() != dim) {
            return Err(TabGroupError::DimensionMismatch {
                expected: dim,
                actual: row.len(),
            });
        }

        let components = self.n_components.min(dim).min(n);

        let mean: Vec<f64> = (0..dim)
            .map(|j| data.iter().map(|r| r[j]).sum::<f64>() / n as f64)
            .collect();
        let centered: Vec<Vec<f64>> = data
            .iter()
            .map(|r| r.iter().zip(&mean).map(|(x, m)| x - m).collect())
            .collect();

        let mut gram = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let v: f64 = centered[i].iter().zip(&centered[j]).map(|(a, b)| a * b).sum();
                gram[i][j] = v;
                gram[j][i] = v;
            }
        }

        let (eigenvalues, eigenvectors) = jacobi_eigen(gram)?;
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

        let mut scores = vec![vec![0.0; components]; n];
        let mut variance = Vec::with_capacity(components);
        for (c, &k) in order.iter().take(components).enumerate() {
            let lambda = eigenvalues[k].max(0.0);
            let scale = lambda.sqrt();
            let column: Vec<f64> = (0..n).map(|i| eigenvectors[i][k]).collect();

            let pivot = column
                .iter()
                .copied()
                .fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };

            for i in 0..n {
                scores[i][c] = sign * column[i] * scale;
            }
            variance.push(if n > 1 { lambda / (n - 1) as f64 } else { 0.0 });
        }

        self.explained_variance = Some(variance);
        Ok(scores)
    }
}

/// Eigen-decomposition of a symmetric matrix. Returns eigenvalues and a
/// matrix whose column `k` is the eigenvector for eigenvalue `k`.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
    let n = a.len();
    let mut v = vec![vec![0.0; n]; n];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum::<f64>().sqrt().max(1.0);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum::<f64>()
            .sqrt();
        if off <= JACOBI_TOLERANCE * scale {
            return Ok(((0..n).map(|i| a[i][i]).collect(), v));
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let vkp = row[p];
                    let vkq = row[q];
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    Err(TabGroupError::Numerical(
        "eigen-decomposition did not converge".to_string(),
    ))
}
