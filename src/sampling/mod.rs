//! Oversampling engines
//!
//! - [`RegionOversampler`] — two-class oversampling driven by a density
//!   decomposition of the minority class into core, borderline, and noise
//!   regions.
//! - [`MulticlassScheduler`] — generalizes the two-class engine to any
//!   number of classes by processing them in decreasing size order.

mod region;
mod scheduler;

pub use region::RegionOversampler;
pub use scheduler::MulticlassScheduler;

use crate::error::{DensampleError, Result};
use ndarray::{Array1, Array2, ArrayView2};
use std::collections::HashMap;

/// Synthetic points generated per structural region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionCounts {
    pub core: usize,
    pub borderline: usize,
    pub noise: usize,
}

impl RegionCounts {
    pub fn total(&self) -> usize {
        self.core + self.borderline + self.noise
    }
}

impl std::ops::AddAssign for RegionCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.core += rhs.core;
        self.borderline += rhs.borderline;
        self.noise += rhs.noise;
    }
}

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Synthetic samples generated, broken down by region
    pub counts: RegionCounts,
}

impl ResampleResult {
    pub fn n_synthetic(&self) -> usize {
        self.counts.total()
    }
}

/// Trait for samplers
pub trait Sampler: Send + Sync {
    /// Resample data, raising minority class counts toward the majority
    fn fit_resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;
}

/// Get class distribution
pub fn class_counts(y: &Array1<i64>) -> HashMap<i64, usize> {
    let mut counts = HashMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class
pub fn class_indices(y: &Array1<i64>) -> HashMap<i64, Vec<usize>> {
    let mut indices = HashMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

/// Eager input validation shared by both samplers.
pub(crate) fn validate_inputs(x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(DensampleError::ShapeError(format!(
            "feature rows ({}) and label count ({}) differ",
            x.nrows(),
            y.len()
        )));
    }
    if class_counts(y).len() < 2 {
        return Err(DensampleError::ValidationError(
            "need at least 2 distinct classes for oversampling".to_string(),
        ));
    }
    Ok(())
}

/// Stack row blocks vertically into one matrix of width `d`.
pub(crate) fn stack_rows(d: usize, parts: &[ArrayView2<f64>]) -> Array2<f64> {
    let total: usize = parts.iter().map(|p| p.nrows()).sum();
    let mut out = Array2::zeros((total, d));
    let mut r = 0;
    for part in parts {
        for row in part.rows() {
            for (j, &v) in row.iter().enumerate() {
                out[[r, j]] = v;
            }
            r += 1;
        }
    }
    out
}
