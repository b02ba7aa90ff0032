//! Multiclass oversampling scheduler

use crate::error::Result;
use crate::sampling::{
    class_counts, class_indices, validate_inputs, RegionCounts, RegionOversampler,
    ResampleResult, Sampler,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Generalizes [`RegionOversampler`] to any number of classes.
///
/// Classes are processed in decreasing size order (ties broken by the
/// smaller label code). Each round treats the next class as the minority
/// against a size-capped uniform subsample of the classes already processed,
/// so no single large class dominates the two-class density analysis. The
/// per-class point pools are rebuilt from scratch every round: a class's
/// working set is that round's oversampled points plus whatever was left
/// out of the round's subsample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MulticlassScheduler {
    /// Configured two-class engine, cloned with a fresh child seed per round
    sampler: RegionOversampler,
    /// Random seed
    seed: Option<u64>,
}

impl Default for MulticlassScheduler {
    fn default() -> Self {
        Self::new(RegionOversampler::new())
    }
}

impl MulticlassScheduler {
    pub fn new(sampler: RegionOversampler) -> Self {
        Self { sampler, seed: None }
    }

    /// Set random seed; child seeds for every round derive from it, so one
    /// seed reproduces the whole run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Oversample every class toward the largest class's count.
    pub fn fit_sample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        validate_inputs(x, y)?;
        let d = x.ncols();

        let counts = class_counts(y);
        let indices = class_indices(y);
        let mut classes: Vec<i64> = counts.keys().copied().collect();
        classes.sort_by(|a, b| counts[b].cmp(&counts[a]).then(a.cmp(b)));
        let n_max = counts[&classes[0]];

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Owned per-class point pools, rebuilt every round.
        let mut pools: HashMap<i64, Vec<Vec<f64>>> = classes
            .iter()
            .map(|&c| {
                let rows = indices[&c].iter().map(|&i| x.row(i).to_vec()).collect();
                (c, rows)
            })
            .collect();

        let mut totals = RegionCounts::default();

        for i in 1..classes.len() {
            let target = classes[i];
            let mut used: HashMap<i64, Vec<Vec<f64>>> = HashMap::new();
            let mut unused: HashMap<i64, Vec<Vec<f64>>> = HashMap::new();

            for (rank, &c) in classes.iter().enumerate() {
                let pool = pools.remove(&c).unwrap_or_default();
                if rank < i {
                    // size-capped uniform subsample of an already processed class
                    let take = (n_max / i).min(pool.len());
                    let chosen = rand::seq::index::sample(&mut rng, pool.len(), take).into_vec();
                    let mut picked = vec![false; pool.len()];
                    for &idx in &chosen {
                        picked[idx] = true;
                    }
                    let mut used_rows = Vec::with_capacity(take);
                    let mut unused_rows = Vec::with_capacity(pool.len() - take);
                    for (idx, row) in pool.into_iter().enumerate() {
                        if picked[idx] {
                            used_rows.push(row);
                        } else {
                            unused_rows.push(row);
                        }
                    }
                    used.insert(c, used_rows);
                    unused.insert(c, unused_rows);
                } else if rank == i {
                    used.insert(c, pool);
                    unused.insert(c, Vec::new());
                } else {
                    used.insert(c, Vec::new());
                    unused.insert(c, pool);
                }
            }

            let (ux, uy) = pack_pools(&classes, &used, d);
            let distinct = class_counts(&uy).len();
            if distinct < 2 {
                // nothing usable to compare against this round
                tracing::warn!(class = target, round = i, "skipping round with a single class");
                pools = merge_pools(&classes, used, unused);
                continue;
            }

            let round_sampler = self.sampler.clone().with_seed(rng.gen());
            let result = round_sampler.fit_sample(&ux, &uy, None, Some(target))?;
            totals += result.counts;
            tracing::debug!(
                class = target,
                round = i,
                synthetic = result.n_synthetic(),
                "scheduler round complete"
            );

            // Rebuild each class's pool: oversampled points plus the rows
            // held out of this round.
            let mut new_pools: HashMap<i64, Vec<Vec<f64>>> = HashMap::new();
            for &c in &classes {
                let mut rows: Vec<Vec<f64>> = Vec::new();
                for (ri, &label) in result.y.iter().enumerate() {
                    if label == c {
                        rows.push(result.x.row(ri).to_vec());
                    }
                }
                if let Some(rest) = unused.remove(&c) {
                    rows.extend(rest);
                }
                new_pools.insert(c, rows);
            }
            pools = new_pools;
        }

        let (x_out, y_out) = pack_pools(&classes, &pools, d);
        Ok(ResampleResult {
            x: x_out,
            y: y_out,
            counts: totals,
        })
    }
}

impl Sampler for MulticlassScheduler {
    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit_sample(x, y)
    }
}

/// Concatenate per-class pools into arrays, classes in rank order.
fn pack_pools(
    classes: &[i64],
    pools: &HashMap<i64, Vec<Vec<f64>>>,
    d: usize,
) -> (Array2<f64>, Array1<i64>) {
    let total: usize = classes
        .iter()
        .map(|c| pools.get(c).map_or(0, |rows| rows.len()))
        .sum();
    let mut x = Array2::zeros((total, d));
    let mut y = Vec::with_capacity(total);
    let mut r = 0;
    for &c in classes {
        if let Some(rows) = pools.get(&c) {
            for row in rows {
                for (j, &v) in row.iter().enumerate() {
                    x[[r, j]] = v;
                }
                y.push(c);
                r += 1;
            }
        }
    }
    (x, Array1::from_vec(y))
}

/// Reunite a used/unused split into whole per-class pools.
fn merge_pools(
    classes: &[i64],
    mut used: HashMap<i64, Vec<Vec<f64>>>,
    mut unused: HashMap<i64, Vec<Vec<f64>>>,
) -> HashMap<i64, Vec<Vec<f64>>> {
    let mut pools = HashMap::new();
    for &c in classes {
        let mut rows = used.remove(&c).unwrap_or_default();
        rows.extend(unused.remove(&c).unwrap_or_default());
        pools.insert(c, rows);
    }
    pools
}
