//! densample - Density-based oversampling for imbalanced datasets
//!
//! Synthesizes new minority-class points so that class sizes become more
//! balanced, while respecting the minority class's spatial structure: dense
//! core regions, borderline regions near the majority class, and isolated
//! noise points each get their own share of the synthetic budget and their
//! own generation procedure.
//!
//! # Modules
//!
//! - [`sampling`] - The oversampling engines ([`sampling::RegionOversampler`]
//!   for a two-class split, [`sampling::MulticlassScheduler`] for any number
//!   of classes)
//! - [`density`] - Density decomposition of a point set into clusters,
//!   core/borderline flags, and noise
//! - [`gaussian`] - Covariance estimation and multivariate-normal sampling
//! - [`dataset`] - CSV loading, label encoding, and result serialization
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use densample::prelude::*;
//!
//! # fn main() -> densample::Result<()> {
//! let dataset = densample::dataset::load_csv("data.csv")?;
//! let scheduler = MulticlassScheduler::new(
//!     RegionOversampler::new().with_eps(0.5).with_min_pts(3),
//! )
//! .with_seed(42);
//! let result = scheduler.fit_sample(&dataset.x, &dataset.y)?;
//! println!("generated {} synthetic points", result.n_synthetic());
//! # Ok(())
//! # }
//! ```

pub mod error;

pub mod density;
pub mod gaussian;
pub mod sampling;

pub mod cli;
pub mod dataset;

pub use error::{DensampleError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::dataset::{load_csv, Dataset, LabelEncoder};
    pub use crate::density::{decompose, DensityRegions};
    pub use crate::error::{DensampleError, Result};
    pub use crate::sampling::{
        class_counts, class_indices, MulticlassScheduler, RegionCounts, RegionOversampler,
        ResampleResult, Sampler,
    };
}
