//! Covariance estimation and multivariate-normal sampling
//!
//! Uses Cholesky decomposition of the covariance matrix for the draws. A
//! singular or otherwise non-positive-definite covariance (a cluster with
//! fewer than 2 basis points yields the zero matrix) is regularized with an
//! escalating diagonal jitter rather than rejected, so generation degrades
//! to a near-delta at the center instead of failing the run.

use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_distr::StandardNormal;

/// Column-wise mean of `x` (rows are observations).
pub fn mean_rows(x: &Array2<f64>) -> Array1<f64> {
    let (n, d) = (x.nrows(), x.ncols());
    let mut mean = Array1::zeros(d);
    if n == 0 {
        return mean;
    }
    for row in x.rows() {
        for (j, &v) in row.iter().enumerate() {
            mean[j] += v;
        }
    }
    mean / n as f64
}

/// Sample covariance of `x` with the n-1 divisor (rows are observations).
///
/// Fewer than 2 rows yields the zero matrix; [`cholesky_factor`] turns that
/// into a near-delta distribution downstream.
pub fn sample_covariance(x: &Array2<f64>) -> Array2<f64> {
    let (n, d) = (x.nrows(), x.ncols());
    let mut cov = Array2::zeros((d, d));
    if n < 2 {
        return cov;
    }
    let mean = mean_rows(x);
    for row in x.rows() {
        for j in 0..d {
            let dj = row[j] - mean[j];
            for t in j..d {
                cov[[j, t]] += dj * (row[t] - mean[t]);
            }
        }
    }
    let denom = (n - 1) as f64;
    for j in 0..d {
        for t in j..d {
            cov[[j, t]] /= denom;
            cov[[t, j]] = cov[[j, t]];
        }
    }
    cov
}

/// Cholesky factorization A = L·L^T; None when A is not positive definite.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let val = a[[i, i]] - sum;
                if val <= 0.0 {
                    return None;
                }
                l[[i, j]] = val.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Cholesky factor of `cov`, regularizing a non-positive-definite input.
///
/// Retries with an escalating diagonal jitter; as a last resort falls back
/// to the element-wise sqrt of the clamped diagonal.
pub fn cholesky_factor(cov: &Array2<f64>) -> Array2<f64> {
    if let Some(l) = cholesky(cov) {
        return l;
    }

    let d = cov.nrows();
    let diag_scale = (0..d).map(|i| cov[[i, i]].abs()).sum::<f64>() / d.max(1) as f64;
    let mut jitter = 1e-10 * diag_scale.max(1.0);
    for _ in 0..8 {
        let mut a = cov.clone();
        for i in 0..d {
            a[[i, i]] += jitter;
        }
        if let Some(l) = cholesky(&a) {
            return l;
        }
        jitter *= 10.0;
    }

    let mut l = Array2::zeros((d, d));
    for i in 0..d {
        l[[i, i]] = cov[[i, i]].max(0.0).sqrt();
    }
    l
}

/// Draw `count` points from N(mean, L·L^T) as rows of the returned matrix.
pub fn sample_mvn(
    mean: &ArrayView1<f64>,
    l: &Array2<f64>,
    count: usize,
    rng: &mut StdRng,
) -> Array2<f64> {
    let d = mean.len();
    let mut out = Array2::zeros((count, d));
    for r in 0..count {
        let z: Vec<f64> = (0..d).map(|_| rng.sample(StandardNormal)).collect();
        for j in 0..d {
            let mut v = mean[j];
            for t in 0..=j {
                v += l[[j, t]] * z[t];
            }
            out[[r, j]] = v;
        }
    }
    out
}
