//! Density decomposition of a point set
//!
//! DBSCAN-style clustering with a configurable Minkowski p-norm. Points are
//! classified as core, borderline, or noise:
//! - Core: has ≥ min_pts neighbors within eps radius
//! - Borderline: belongs to a cluster but is not core itself
//! - Noise: belongs to no cluster (cluster id = -1)
//!
//! The decomposition is ephemeral derived state: it is recomputed from its
//! inputs on every call and never cached across invocations.

use ndarray::{Array2, ArrayView1};

/// Cluster id assigned to unclustered points.
pub const NOISE: i64 = -1;

/// Minkowski distance of order `p` (p = 2 is Euclidean).
pub fn minkowski(a: &ArrayView1<f64>, b: &ArrayView1<f64>, p: f64) -> f64 {
    if (p - 2.0).abs() < f64::EPSILON {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    } else {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs().powf(p))
            .sum::<f64>()
            .powf(1.0 / p)
    }
}

/// Result of a density decomposition.
///
/// `cluster[i]` is the cluster id of point `i` (or [`NOISE`]); `is_core[i]`
/// marks points whose eps-neighborhood holds at least min_pts points. The
/// three derived regions form a disjoint cover of the input.
#[derive(Debug, Clone)]
pub struct DensityRegions {
    pub cluster: Vec<i64>,
    pub is_core: Vec<bool>,
    pub n_clusters: usize,
}

impl DensityRegions {
    pub fn core_indices(&self) -> Vec<usize> {
        (0..self.cluster.len()).filter(|&i| self.is_core[i]).collect()
    }

    /// Cluster members that are not part of the dense subset.
    pub fn borderline_indices(&self) -> Vec<usize> {
        (0..self.cluster.len())
            .filter(|&i| self.cluster[i] != NOISE && !self.is_core[i])
            .collect()
    }

    pub fn noise_indices(&self) -> Vec<usize> {
        (0..self.cluster.len()).filter(|&i| self.cluster[i] == NOISE).collect()
    }

    /// All members of cluster `c`, core and borderline alike.
    pub fn members(&self, c: usize) -> Vec<usize> {
        (0..self.cluster.len()).filter(|&i| self.cluster[i] == c as i64).collect()
    }
}

/// Find all neighbors within eps distance (the point itself included).
fn region_query(x: &Array2<f64>, point_idx: usize, eps: f64, p: f64) -> Vec<usize> {
    let row = x.row(point_idx);
    (0..x.nrows())
        .filter(|&i| minkowski(&row, &x.row(i), p) <= eps)
        .collect()
}

/// Decompose `x` into dense clusters plus an unclustered residue.
pub fn decompose(x: &Array2<f64>, eps: f64, min_pts: usize, p: f64) -> DensityRegions {
    let n = x.nrows();

    let neighbors: Vec<Vec<usize>> = (0..n).map(|i| region_query(x, i, eps, p)).collect();

    let is_core: Vec<bool> = neighbors.iter().map(|nb| nb.len() >= min_pts).collect();

    let mut cluster = vec![NOISE; n];
    let mut cluster_id: i64 = 0;

    for i in 0..n {
        if cluster[i] != NOISE || !is_core[i] {
            continue;
        }

        // Expand cluster from core point i
        cluster[i] = cluster_id;
        let mut queue: Vec<usize> = neighbors[i].clone();
        let mut head = 0;

        while head < queue.len() {
            let q = queue[head];
            head += 1;

            if cluster[q] == NOISE {
                cluster[q] = cluster_id;
            }
            if !is_core[q] {
                continue;
            }
            for &nb in &neighbors[q] {
                if cluster[nb] == NOISE {
                    cluster[nb] = cluster_id;
                    queue.push(nb);
                }
            }
        }

        cluster_id += 1;
    }

    DensityRegions {
        cluster,
        is_core,
        n_clusters: cluster_id as usize,
    }
}
