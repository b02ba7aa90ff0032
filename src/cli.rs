//! Command-line interface

use crate::dataset;
use crate::error::{DensampleError, Result};
use crate::sampling::{MulticlassScheduler, RegionOversampler};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "densample")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Density-based oversampling for imbalanced datasets")]
pub struct Cli {
    /// Input CSV (header row, class label in the last column)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Output CSV; defaults to <input stem>_resampled.csv
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Distance metric order (2 = Euclidean)
    #[arg(short, long, default_value_t = 2.0)]
    pub p: f64,

    /// Neighbor count for k-NN weighting and interpolation
    #[arg(short, long, default_value_t = 7)]
    pub k: usize,

    /// Density clustering radius
    #[arg(long, default_value_t = 0.8)]
    pub eps: f64,

    /// Minimum neighborhood size for a dense point
    #[arg(long, default_value_t = 4)]
    pub min_pts: usize,

    /// Recompute the borderline allocation ratio adaptively
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub fit_borderline_ratio: bool,

    /// Fixed borderline allocation fraction (ignored in adaptive mode)
    #[arg(long, default_value_t = 0.6)]
    pub borderline_ratio: f64,

    /// Minimum dense-subset size for the cluster covariance basis
    #[arg(long, default_value_t = 5)]
    pub min_core_number: usize,

    /// Noise fraction below which no noise points are generated
    #[arg(long, default_value_t = 0.3)]
    pub noise_ratio: f64,

    /// Multiplier capping per-point and per-class generation volume
    #[arg(long, default_value_t = 4)]
    pub multiple_k: usize,

    /// Push majority points away from pressured borderline points
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub translations: bool,

    /// Interpolation-based (true) vs Gaussian-based (false) noise generation
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub noise_smote: bool,

    /// Oversample only this class (label token) against the rest
    #[arg(long)]
    pub minority: Option<String>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    fn sampler(&self) -> RegionOversampler {
        RegionOversampler::new()
            .with_eps(self.eps)
            .with_min_pts(self.min_pts)
            .with_k(self.k)
            .with_p(self.p)
            .with_fit_borderline_ratio(self.fit_borderline_ratio)
            .with_borderline_ratio(self.borderline_ratio)
            .with_min_core_number(self.min_core_number)
            .with_noise_ratio(self.noise_ratio)
            .with_multiple_k(self.multiple_k)
            .with_translations(self.translations)
            .with_noise_smote(self.noise_smote)
    }

    fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .data
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("data");
            self.data.with_file_name(format!("{stem}_resampled.csv"))
        })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();
    let dataset = dataset::load_csv(&cli.data)?;

    let result = match &cli.minority {
        Some(token) => {
            let code = dataset.encoder.transform(token).ok_or_else(|| {
                DensampleError::ValidationError(format!("unknown class label '{token}'"))
            })?;
            let mut sampler = cli.sampler();
            if let Some(seed) = cli.seed {
                sampler = sampler.with_seed(seed);
            }
            sampler.fit_sample(&dataset.x, &dataset.y, None, Some(code))?
        }
        None => {
            let mut scheduler = MulticlassScheduler::new(cli.sampler());
            if let Some(seed) = cli.seed {
                scheduler = scheduler.with_seed(seed);
            }
            scheduler.fit_sample(&dataset.x, &dataset.y)?
        }
    };

    let output = cli.output_path();
    dataset.write_csv(&output, &result.x, &result.y)?;
    tracing::info!(
        synthetic = result.n_synthetic(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        path = %output.display(),
        "oversampling complete"
    );
    Ok(())
}
