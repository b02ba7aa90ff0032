//! Region-aware minority oversampling

use crate::density;
use crate::error::{DensampleError, Result};
use crate::gaussian;
use crate::sampling::{
    class_counts, stack_rows, validate_inputs, RegionCounts, ResampleResult, Sampler,
};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Residual weight kept for borderline points that contribute no majority
/// pressure, so the downstream normalization never divides by zero.
const RESIDUAL_WEIGHT: f64 = 1e-3;

/// Oversampler for a two-class split: one minority class against everything
/// else pooled as majority.
///
/// The minority class is decomposed into core, borderline, and noise regions
/// by density clustering; each region receives an adaptive share of the
/// synthetic budget and its own generation procedure (cluster-covariance
/// Gaussians for core and borderline, interpolation or a pooled Gaussian for
/// noise). Majority points crowding a borderline point can optionally be
/// pushed away before generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionOversampler {
    /// Density clustering radius
    eps: f64,
    /// Minimum neighborhood size for a dense point
    min_pts: usize,
    /// Neighbor count for k-NN weighting and interpolation
    k: usize,
    /// Distance metric order (2 = Euclidean)
    p: f64,
    /// Recompute the borderline allocation ratio adaptively
    fit_borderline_ratio: bool,
    /// Fixed borderline allocation fraction (ignored in adaptive mode)
    borderline_ratio: f64,
    /// Minimum dense-subset size before falling back to the full cluster
    /// as covariance basis
    min_core_number: usize,
    /// Noise fraction below which no noise points are generated; also the
    /// shape parameter of the noise response curve
    noise_ratio: f64,
    /// Multiplier capping per-point and per-class generation volume
    multiple_k: usize,
    /// Push majority points away from pressured borderline points
    translations: bool,
    /// Interpolation-based (true) vs Gaussian-based (false) noise generation
    noise_smote: bool,
    /// Random seed
    seed: Option<u64>,
}

impl Default for RegionOversampler {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionOversampler {
    pub fn new() -> Self {
        Self {
            eps: 0.8,
            min_pts: 4,
            k: 7,
            p: 2.0,
            fit_borderline_ratio: true,
            borderline_ratio: 0.6,
            min_core_number: 5,
            noise_ratio: 0.3,
            multiple_k: 4,
            translations: true,
            noise_smote: true,
            seed: None,
        }
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_min_pts(mut self, min_pts: usize) -> Self {
        self.min_pts = min_pts.max(1);
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self
    }

    pub fn with_p(mut self, p: f64) -> Self {
        self.p = p.max(1.0);
        self
    }

    pub fn with_fit_borderline_ratio(mut self, adaptive: bool) -> Self {
        self.fit_borderline_ratio = adaptive;
        self
    }

    pub fn with_borderline_ratio(mut self, ratio: f64) -> Self {
        self.borderline_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_core_number(mut self, n: usize) -> Self {
        self.min_core_number = n.max(1);
        self
    }

    pub fn with_noise_ratio(mut self, ratio: f64) -> Self {
        self.noise_ratio = ratio.clamp(0.0, 0.99);
        self
    }

    pub fn with_multiple_k(mut self, multiple_k: usize) -> Self {
        self.multiple_k = multiple_k.max(1);
        self
    }

    pub fn with_translations(mut self, enabled: bool) -> Self {
        self.translations = enabled;
        self
    }

    pub fn with_noise_smote(mut self, enabled: bool) -> Self {
        self.noise_smote = enabled;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Adaptive borderline allocation: grows sub-linearly with the
    /// borderline prevalence.
    fn adaptive_borderline_ratio(borderline_fraction: f64) -> f64 {
        borderline_fraction.sqrt()
    }

    /// Convex response of the noise allocation to the noise fraction:
    /// near zero just above the threshold, rising toward 1 as the fraction
    /// approaches 1.
    fn noise_response(&self, fraction: f64) -> f64 {
        let a = 0.9 / (1.0 - self.noise_ratio.powi(2));
        a * fraction.powi(2) + 1.0 - a
    }

    /// Oversample the designated minority class toward the majority count.
    ///
    /// `k` overrides the configured neighbor count for this call;
    /// `minority_class` defaults to the smallest class present (ties broken
    /// by the smaller label code). The returned rows are shuffled.
    pub fn fit_sample(
        &self,
        x: &Array2<f64>,
        y: &Array1<i64>,
        k: Option<usize>,
        minority_class: Option<i64>,
    ) -> Result<ResampleResult> {
        validate_inputs(x, y)?;
        let k = k.unwrap_or(self.k).max(1);

        let counts = class_counts(y);
        let minority = match minority_class {
            Some(c) if counts.contains_key(&c) => c,
            Some(c) => {
                return Err(DensampleError::ValidationError(format!(
                    "class {c} not present in labels"
                )))
            }
            None => {
                // smallest class; ties broken by the smaller label
                counts
                    .iter()
                    .map(|(&label, &count)| (count, label))
                    .min()
                    .map(|(_, label)| label)
                    .ok_or_else(|| {
                        DensampleError::ValidationError("empty label vector".to_string())
                    })?
            }
        };

        let n = x.nrows();
        let d = x.ncols();
        let n_min = counts[&minority];
        let n_maj = n - n_min;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Fixed index space for neighbor lookups: minority rows first.
        let minority_idx: Vec<usize> = (0..n).filter(|&i| y[i] == minority).collect();
        let majority_idx: Vec<usize> = (0..n).filter(|&i| y[i] != minority).collect();
        let minority_x = x.select(Axis(0), &minority_idx);
        let majority_x = x.select(Axis(0), &majority_idx);
        let mut all_x = stack_rows(d, &[minority_x.view(), majority_x.view()]);
        let all_y: Vec<i64> = minority_idx
            .iter()
            .chain(majority_idx.iter())
            .map(|&i| y[i])
            .collect();

        let regions = density::decompose(&minority_x, self.eps, self.min_pts, self.p);
        let borderline_idx = regions.borderline_indices();
        let noise_idx = regions.noise_indices();

        // Budget allocation: noise first, then borderline, remainder to core.
        let mut remaining = n_maj as i64 - n_min as i64;
        let noise_fraction = noise_idx.len() as f64 / n_min as f64;
        let noise_budget: i64 = if noise_fraction < self.noise_ratio {
            0
        } else {
            let raw = (self.noise_response(noise_fraction) * remaining as f64) as i64;
            let cap = (self.multiple_k * k * noise_idx.len()) as i64;
            raw.min(cap).max(0)
        };
        remaining -= noise_budget;

        let borderline_ratio = if self.fit_borderline_ratio {
            Self::adaptive_borderline_ratio(borderline_idx.len() as f64 / n_min as f64)
        } else {
            self.borderline_ratio
        };
        let borderline_budget = remaining.max(0) as f64 * borderline_ratio;

        // Per-cluster covariance: the dense subset is the basis when it is
        // large enough, else the full membership. The Cholesky factor of the
        // plain sample covariance serves core generation; dividing by the
        // basis size (sqrt on the factor) gives the tight borderline spread.
        let n_clusters = regions.n_clusters;
        let mut core_chol: Vec<Array2<f64>> = Vec::with_capacity(n_clusters);
        let mut border_chol: Vec<Array2<f64>> = Vec::with_capacity(n_clusters);
        let mut member_count: Vec<usize> = Vec::with_capacity(n_clusters);
        let mut cluster_mean: Vec<Array1<f64>> = Vec::with_capacity(n_clusters);
        for c in 0..n_clusters {
            let members = regions.members(c);
            let core_members: Vec<usize> = members
                .iter()
                .copied()
                .filter(|&i| regions.is_core[i])
                .collect();
            let basis = if core_members.len() >= self.min_core_number {
                &core_members
            } else {
                &members
            };
            let basis_x = minority_x.select(Axis(0), basis);
            let l = gaussian::cholesky_factor(&gaussian::sample_covariance(&basis_x));
            border_chol.push(&l / (basis.len() as f64).sqrt());
            core_chol.push(l);
            let members_x = minority_x.select(Axis(0), &members);
            cluster_mean.push(gaussian::mean_rows(&members_x));
            member_count.push(members.len());
        }

        // Pairwise distances from every minority point to the full set.
        let mut dist = Array2::zeros((n_min, n));
        for i in 0..n_min {
            let row = minority_x.row(i);
            for j in 0..n {
                dist[[i, j]] = density::minkowski(&row, &all_x.row(j), self.p);
            }
        }

        // Majority-pressure pass over borderline points. A point whose
        // neighborhood is dominated by the majority (or whose single nearest
        // neighbor is majority) keeps only the residual weight.
        let mut weight = vec![RESIDUAL_WEIGHT; n_min];
        let mut total_weight = 0.0;
        let mut displacement = Array2::zeros((n, d));
        for &i in &borderline_idx {
            let order = argsort_row(&dist, i);
            let nearest = &order[..(k + 1).min(n)];
            let minority_cnt = nearest.iter().filter(|&&j| j < n_min).count();
            let majority_cnt = nearest.len() - minority_cnt;
            if majority_cnt >= k || nearest[0] >= n_min {
                total_weight += weight[i];
                continue;
            }
            if majority_cnt > 0 {
                weight[i] += majority_cnt as f64;
                let max_dist = dist[[i, nearest[nearest.len() - 1]]];
                for &j in nearest {
                    if j >= n_min {
                        let dj = dist[[i, j]];
                        let scale = (max_dist - dj) / (1e-6 + dj);
                        for t in 0..d {
                            displacement[[j, t]] +=
                                (all_x[[j, t]] - minority_x[[i, t]]) * scale;
                        }
                    }
                }
            }
            total_weight += weight[i];
        }
        if self.translations {
            all_x += &displacement;
        }

        // Borderline generation: per-point counts proportional to majority
        // pressure, with a random 0/1 tie-break and a hard per-point cap.
        let per_point_cap = (k * self.multiple_k) as i64;
        let mut border_rows: Vec<f64> = Vec::new();
        let mut n_border_gen = 0usize;
        for &i in &borderline_idx {
            let num = if borderline_budget > 0.0 {
                let coin: i64 = rng.gen_range(0..2);
                let raw = (borderline_budget * weight[i] / (total_weight + 1e-6)) as i64;
                (coin + raw).min(per_point_cap).max(0) as usize
            } else {
                0
            };
            if num == 0 {
                continue;
            }
            let c = regions.cluster[i] as usize;
            let pts = gaussian::sample_mvn(&minority_x.row(i), &border_chol[c], num, &mut rng);
            border_rows.extend(pts.iter().copied());
            n_border_gen += num;
        }

        // Core generation: leftover budget split across clusters by their
        // share of the non-noise minority points.
        let core_budget = (remaining - n_border_gen as i64).max(0) as f64;
        let non_noise = n_min - noise_idx.len();
        let mut core_rows: Vec<f64> = Vec::new();
        let mut n_core_gen = 0usize;
        for c in 0..n_clusters {
            let num =
                (core_budget * member_count[c] as f64 / (non_noise as f64 + 1e-6)) as usize;
            if num == 0 {
                continue;
            }
            let pts = gaussian::sample_mvn(&cluster_mean[c].view(), &core_chol[c], num, &mut rng);
            core_rows.extend(pts.iter().copied());
            n_core_gen += num;
        }

        // Noise generation: interpolation toward a near neighbor, or a
        // single Gaussian fit over the noise points.
        let mut noise_rows: Vec<f64> = Vec::new();
        let mut n_noise_gen = 0usize;
        if noise_budget > 0 {
            if self.noise_smote {
                let orders: Vec<Vec<usize>> =
                    noise_idx.iter().map(|&i| argsort_row(&dist, i)).collect();
                for _ in 0..noise_budget {
                    let pos = rng.gen_range(0..noise_idx.len());
                    let i = noise_idx[pos];
                    let order = &orders[pos];
                    let hi = (k + 1).min(order.len());
                    if hi <= 1 {
                        continue;
                    }
                    let j = order[rng.gen_range(1..hi)];
                    let rate: f64 = rng.gen();
                    for t in 0..d {
                        noise_rows.push(all_x[[j, t]] * rate + all_x[[i, t]] * (1.0 - rate));
                    }
                    n_noise_gen += 1;
                }
            } else if noise_idx.len() > 1 {
                let noise_x = minority_x.select(Axis(0), &noise_idx);
                let l = gaussian::cholesky_factor(&gaussian::sample_covariance(&noise_x));
                let mean = gaussian::mean_rows(&noise_x);
                let pts = gaussian::sample_mvn(&mean.view(), &l, noise_budget as usize, &mut rng);
                noise_rows.extend(pts.iter().copied());
                n_noise_gen += noise_budget as usize;
            }
        }

        let counts = RegionCounts {
            core: n_core_gen,
            borderline: n_border_gen,
            noise: n_noise_gen,
        };
        tracing::info!(
            core = counts.core,
            borderline = counts.borderline,
            noise = counts.noise,
            "synthetic points generated"
        );

        // Assemble originals plus the three generation batches, then shuffle.
        let n_total = n + counts.total();
        let mut out_x = Array2::zeros((n_total, d));
        let mut out_y: Vec<i64> = Vec::with_capacity(n_total);
        let mut r = 0;
        for row in all_x.rows() {
            for (j, &v) in row.iter().enumerate() {
                out_x[[r, j]] = v;
            }
            r += 1;
        }
        out_y.extend_from_slice(&all_y);
        for batch in [&border_rows, &core_rows, &noise_rows] {
            for chunk in batch.chunks(d) {
                for (j, &v) in chunk.iter().enumerate() {
                    out_x[[r, j]] = v;
                }
                out_y.push(minority);
                r += 1;
            }
        }

        let mut perm: Vec<usize> = (0..n_total).collect();
        perm.shuffle(&mut rng);
        let x = out_x.select(Axis(0), &perm);
        let y = Array1::from_vec(perm.iter().map(|&i| out_y[i]).collect());

        Ok(ResampleResult { x, y, counts })
    }
}

impl Sampler for RegionOversampler {
    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit_sample(x, y, None, None)
    }
}

/// Column indices of `dist` row `row`, sorted by ascending distance.
fn argsort_row(dist: &Array2<f64>, row: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..dist.ncols()).collect();
    order.sort_by(|&a, &b| {
        dist[[row, a]]
            .partial_cmp(&dist[[row, b]])
            .unwrap_or(Ordering::Equal)
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 40 majority points on a loose grid near the origin, `n_min` minority
    /// points on a tight grid near (10, 10).
    fn create_imbalanced_data(n_min: usize) -> (Array2<f64>, Array1<i64>) {
        let mut data = Vec::new();
        let mut labels = Vec::new();

        for i in 0..40 {
            data.push((i % 8) as f64);
            data.push((i / 8) as f64);
            labels.push(0i64);
        }
        for i in 0..n_min {
            data.push(10.0 + 0.2 * (i % 4) as f64);
            data.push(10.0 + 0.2 * (i / 4) as f64);
            labels.push(1i64);
        }

        let n = 40 + n_min;
        let mut x = Array2::zeros((n, 2));
        for (i, chunk) in data.chunks(2).enumerate() {
            x[[i, 0]] = chunk[0];
            x[[i, 1]] = chunk[1];
        }
        (x, Array1::from_vec(labels))
    }

    fn sampler() -> RegionOversampler {
        RegionOversampler::new()
            .with_eps(0.5)
            .with_min_pts(3)
            .with_k(5)
            .with_seed(42)
    }

    #[test]
    fn test_oversampling_never_removes_points() {
        let (x, y) = create_imbalanced_data(10);
        let result = sampler().fit_sample(&x, &y, None, None).unwrap();
        let before = class_counts(&y);
        let after = class_counts(&result.y);
        for (class, &count) in &before {
            assert!(after[class] >= count);
        }
    }

    #[test]
    fn test_dimensionality_preserved() {
        let (x, y) = create_imbalanced_data(10);
        let result = sampler().fit_sample(&x, &y, None, None).unwrap();
        assert_eq!(result.x.ncols(), x.ncols());
        assert_eq!(result.x.nrows(), result.y.len());
    }

    #[test]
    fn test_synthetic_points_carry_minority_label() {
        let (x, y) = create_imbalanced_data(10);
        let result = sampler().fit_sample(&x, &y, None, None).unwrap();
        let before = class_counts(&y);
        let after = class_counts(&result.y);
        // Only the minority class may grow
        assert_eq!(after[&0], before[&0]);
        assert_eq!(after[&1], before[&1] + result.n_synthetic());
    }

    #[test]
    fn test_balanced_classes_add_nothing() {
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            data.push((i % 5) as f64);
            data.push((i / 5) as f64);
            labels.push(0i64);
            data.push(10.0 + 0.2 * (i % 5) as f64);
            data.push(10.0 + 0.2 * (i / 5) as f64);
            labels.push(1i64);
        }
        let mut x = Array2::zeros((20, 2));
        for (i, chunk) in data.chunks(2).enumerate() {
            x[[i, 0]] = chunk[0];
            x[[i, 1]] = chunk[1];
        }
        let y = Array1::from_vec(labels);

        let result = sampler().fit_sample(&x, &y, None, Some(1)).unwrap();
        assert_eq!(result.n_synthetic(), 0);
        assert_eq!(result.x.nrows(), 20);
    }

    #[test]
    fn test_unknown_minority_class_rejected() {
        let (x, y) = create_imbalanced_data(10);
        let err = sampler().fit_sample(&x, &y, None, Some(99)).unwrap_err();
        assert!(matches!(err, DensampleError::ValidationError(_)));
    }

    #[test]
    fn test_single_cluster_generates_core_only() {
        // 40 majority vs 20 tightly clustered minority, all minority points
        // dense.
        let (x, y) = create_imbalanced_data(20);
        let result = sampler().fit_sample(&x, &y, None, None).unwrap();
        assert_eq!(result.counts.noise, 0);
        assert_eq!(result.counts.borderline, 0);
        assert!(result.counts.core > 0);
        // Minority count moves close to the majority count
        let after = class_counts(&result.y);
        assert!(after[&1] >= 35 && after[&1] <= 41);
    }

    #[test]
    fn test_isolated_minority_generates_noise_only() {
        // Minority points far apart: all noise, interpolation-based output
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            data.push((i % 8) as f64);
            data.push((i / 8) as f64);
            labels.push(0i64);
        }
        for i in 0..8 {
            data.push(100.0 + 20.0 * i as f64);
            data.push(100.0);
            labels.push(1i64);
        }
        let mut x = Array2::zeros((48, 2));
        for (i, chunk) in data.chunks(2).enumerate() {
            x[[i, 0]] = chunk[0];
            x[[i, 1]] = chunk[1];
        }
        let y = Array1::from_vec(labels);

        let result = sampler().fit_sample(&x, &y, None, None).unwrap();
        assert!(result.counts.noise > 0);
        assert_eq!(result.counts.core, 0);
        assert_eq!(result.counts.borderline, 0);

        // Interpolated points stay inside the global bounding box
        for j in 0..2 {
            let lo = x.column(j).iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = x.column(j).iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            for &v in result.x.column(j).iter() {
                assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
            }
        }
    }

    #[test]
    fn test_noise_below_threshold_generates_nothing_for_noise() {
        // 12 clustered minority points plus one far outlier: noise fraction
        // 1/13 is below the default 0.3 threshold.
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            data.push((i % 8) as f64);
            data.push((i / 8) as f64);
            labels.push(0i64);
        }
        for i in 0..12 {
            data.push(10.0 + 0.2 * (i % 4) as f64);
            data.push(10.0 + 0.2 * (i / 4) as f64);
            labels.push(1i64);
        }
        data.push(500.0);
        data.push(500.0);
        labels.push(1i64);
        let mut x = Array2::zeros((53, 2));
        for (i, chunk) in data.chunks(2).enumerate() {
            x[[i, 0]] = chunk[0];
            x[[i, 1]] = chunk[1];
        }
        let y = Array1::from_vec(labels);

        let result = sampler().fit_sample(&x, &y, None, None).unwrap();
        assert_eq!(result.counts.noise, 0);
        assert!(result.counts.core > 0);
    }

    #[test]
    fn test_seed_reproducibility() {
        let (x, y) = create_imbalanced_data(10);
        let a = sampler().fit_sample(&x, &y, None, None).unwrap();
        let b = sampler().fit_sample(&x, &y, None, None).unwrap();
        assert_eq!(a.y, b.y);
        assert_eq!(a.x, b.x);
    }

    #[test]
    fn test_adaptive_borderline_ratio_is_sqrt() {
        assert!((RegionOversampler::adaptive_borderline_ratio(0.25) - 0.5).abs() < 1e-12);
        assert!((RegionOversampler::adaptive_borderline_ratio(0.0)).abs() < 1e-12);
        assert!((RegionOversampler::adaptive_borderline_ratio(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_noise_response_curve() {
        let s = RegionOversampler::new().with_noise_ratio(0.3);
        // Full multiplier at fraction 1
        assert!((s.noise_response(1.0) - 1.0).abs() < 1e-9);
        // Small allocation right at the threshold: 1 - a(1 - t²) = 0.1
        assert!((s.noise_response(0.3) - 0.1).abs() < 1e-9);
        // Monotonically increasing on [threshold, 1]
        assert!(s.noise_response(0.6) > s.noise_response(0.35));
    }
}
