//! End-to-end oversampling scenarios through the public API

use densample::prelude::*;
use ndarray::{Array1, Array2};

fn grid_blob(cx: f64, cy: f64, spacing: f64, size: usize, label: i64) -> (Vec<f64>, Vec<i64>) {
    let mut data = Vec::with_capacity(size * 2);
    let labels = vec![label; size];
    for i in 0..size {
        data.push(cx + spacing * (i % 8) as f64);
        data.push(cy + spacing * (i / 8) as f64);
    }
    (data, labels)
}

fn build(blobs: &[(Vec<f64>, Vec<i64>)]) -> (Array2<f64>, Array1<i64>) {
    let mut data = Vec::new();
    let mut labels = Vec::new();
    for (d, l) in blobs {
        data.extend_from_slice(d);
        labels.extend_from_slice(l);
    }
    let n = labels.len();
    let mut x = Array2::zeros((n, 2));
    for (i, chunk) in data.chunks(2).enumerate() {
        x[[i, 0]] = chunk[0];
        x[[i, 1]] = chunk[1];
    }
    (x, Array1::from_vec(labels))
}

#[test]
fn test_two_class_core_scenario() {
    // 100 majority vs 20 tightly clustered minority: everything generated
    // in the dense core, minority count raised close to the majority count.
    let (x, y) = build(&[
        grid_blob(0.0, 0.0, 1.0, 100, 0),
        grid_blob(50.0, 50.0, 0.2, 20, 1),
    ]);

    let sampler = RegionOversampler::new()
        .with_eps(0.5)
        .with_min_pts(3)
        .with_k(5)
        .with_seed(7);
    let result = sampler.fit_sample(&x, &y, None, None).unwrap();

    assert_eq!(result.counts.borderline, 0);
    assert_eq!(result.counts.noise, 0);
    assert!(result.counts.core >= 70);

    let after = class_counts(&result.y);
    assert_eq!(after[&0], 100);
    assert!(after[&1] >= 90 && after[&1] <= 101);
}

#[test]
fn test_fully_isolated_minority_interpolates() {
    // Every minority point is noise; with noise_smote all synthetic points
    // are convex combinations of existing points and stay inside the global
    // bounding box.
    let mut blobs = vec![grid_blob(0.0, 0.0, 1.0, 60, 0)];
    let mut noise_data = Vec::new();
    for i in 0..10 {
        noise_data.push(200.0 + 30.0 * i as f64);
        noise_data.push(-50.0 + 10.0 * i as f64);
    }
    blobs.push((noise_data, vec![1i64; 10]));
    let (x, y) = build(&blobs);

    let sampler = RegionOversampler::new()
        .with_eps(0.5)
        .with_min_pts(3)
        .with_k(5)
        .with_noise_smote(true)
        .with_seed(11);
    let result = sampler.fit_sample(&x, &y, None, None).unwrap();

    assert!(result.counts.noise > 0);
    assert_eq!(result.counts.noise, result.n_synthetic());

    for j in 0..2 {
        let lo = x.column(j).iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = x.column(j).iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for &v in result.x.column(j).iter() {
            assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
        }
    }
}

#[test]
fn test_gaussian_noise_generation() {
    // noise_smote disabled with more than one noise point falls back to a
    // Gaussian fit over the noise points.
    let mut blobs = vec![grid_blob(0.0, 0.0, 1.0, 60, 0)];
    let mut noise_data = Vec::new();
    for i in 0..10 {
        noise_data.push(200.0 + 30.0 * i as f64);
        noise_data.push(0.0);
    }
    blobs.push((noise_data, vec![1i64; 10]));
    let (x, y) = build(&blobs);

    let sampler = RegionOversampler::new()
        .with_eps(0.5)
        .with_min_pts(3)
        .with_k(5)
        .with_noise_smote(false)
        .with_seed(11);
    let result = sampler.fit_sample(&x, &y, None, None).unwrap();

    assert!(result.counts.noise > 0);
    assert_eq!(result.counts.core, 0);
    assert_eq!(result.counts.borderline, 0);
}

#[test]
fn test_three_class_scheduler_balances() {
    let (x, y) = build(&[
        grid_blob(0.0, 0.0, 0.2, 50, 0),
        grid_blob(30.0, 0.0, 0.2, 30, 1),
        grid_blob(0.0, 30.0, 0.2, 10, 2),
    ]);

    let scheduler = MulticlassScheduler::new(
        RegionOversampler::new()
            .with_eps(0.5)
            .with_min_pts(3)
            .with_k(5),
    )
    .with_seed(42);
    let result = scheduler.fit_sample(&x, &y).unwrap();

    let before = class_counts(&y);
    let after = class_counts(&result.y);
    for (class, &count) in &before {
        assert!(after[class] >= count, "class {class} shrank");
    }
    // Smaller classes move toward the largest class's size
    assert!((after[&1] as i64 - 50).abs() <= (before[&1] as i64 - 50).abs());
    assert!((after[&2] as i64 - 50).abs() <= (before[&2] as i64 - 50).abs());
    assert!(after[&1] > before[&1]);
    assert!(after[&2] > before[&2]);
}

#[test]
fn test_sampler_trait_objects() {
    let (x, y) = build(&[
        grid_blob(0.0, 0.0, 0.2, 30, 0),
        grid_blob(30.0, 0.0, 0.2, 12, 1),
    ]);

    let samplers: Vec<Box<dyn Sampler>> = vec![
        Box::new(
            RegionOversampler::new()
                .with_eps(0.5)
                .with_min_pts(3)
                .with_seed(1),
        ),
        Box::new(
            MulticlassScheduler::new(RegionOversampler::new().with_eps(0.5).with_min_pts(3))
                .with_seed(1),
        ),
    ];

    for sampler in &samplers {
        let result = sampler.fit_resample(&x, &y).unwrap();
        assert_eq!(result.x.nrows(), result.y.len());
        assert!(result.x.nrows() >= x.nrows());
        assert_eq!(result.x.ncols(), 2);
    }
}

#[test]
fn test_mismatched_inputs_rejected_eagerly() {
    let x = Array2::zeros((4, 2));
    let y = Array1::from_vec(vec![0i64, 1, 0]);
    let sampler = RegionOversampler::new();
    assert!(sampler.fit_sample(&x, &y, None, None).is_err());

    let scheduler = MulticlassScheduler::default();
    assert!(scheduler.fit_sample(&x, &y).is_err());
}
