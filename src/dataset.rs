//! Dataset loading and serialization
//!
//! Flat-file glue around the sampling core: a CSV with a header row, numeric
//! feature columns, and the class label in the last column. Labels are
//! opaque tokens; they are encoded to contiguous integer codes on load and
//! decoded back on write.

use crate::error::{DensampleError, Result};
use ndarray::{Array1, Array2};
use std::path::Path;

/// Maps label tokens to contiguous integer codes (sorted token order).
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Build an encoder over the distinct tokens in `labels`.
    pub fn fit(labels: &[String]) -> Self {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn transform(&self, label: &str) -> Option<i64> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
            .map(|i| i as i64)
    }

    pub fn inverse(&self, code: i64) -> Option<&str> {
        if code < 0 {
            return None;
        }
        self.classes.get(code as usize).map(|s| s.as_str())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// A loaded dataset: features, encoded labels, and the schema needed to
/// write results back out.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub y: Array1<i64>,
    pub encoder: LabelEncoder,
    pub feature_names: Vec<String>,
    pub label_name: String,
}

impl Dataset {
    /// Write an augmented (x, y) pair using this dataset's schema, decoding
    /// label codes back to their original tokens.
    pub fn write_csv<P: AsRef<Path>>(
        &self,
        path: P,
        x: &Array2<f64>,
        y: &Array1<i64>,
    ) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(DensampleError::ShapeError(format!(
                "feature rows ({}) and label count ({}) differ",
                x.nrows(),
                y.len()
            )));
        }
        let mut writer = csv::Writer::from_path(path.as_ref())?;

        let mut header = self.feature_names.clone();
        header.push(self.label_name.clone());
        writer.write_record(&header)?;

        for (i, row) in x.rows().into_iter().enumerate() {
            let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            let label = self.encoder.inverse(y[i]).ok_or_else(|| {
                DensampleError::DataError(format!("label code {} has no known token", y[i]))
            })?;
            record.push(label.to_string());
            writer.write_record(&record)?;
        }
        writer.flush()?;
        tracing::info!(rows = x.nrows(), path = %path.as_ref().display(), "dataset written");
        Ok(())
    }
}

/// Load a CSV dataset: header row, numeric features, label in the last
/// column.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;

    let headers = reader.headers()?.clone();
    let width = headers.len();
    if width < 2 {
        return Err(DensampleError::DataError(
            "dataset needs at least one feature column and a label column".to_string(),
        ));
    }
    let feature_names: Vec<String> = headers.iter().take(width - 1).map(String::from).collect();
    let label_name = headers[width - 1].to_string();

    let mut features: Vec<f64> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != width {
            return Err(DensampleError::DataError(format!(
                "row {}: expected {} columns, found {}",
                row + 1,
                width,
                record.len()
            )));
        }
        for col in 0..width - 1 {
            let value = record[col].trim().parse::<f64>().map_err(|e| {
                DensampleError::DataError(format!(
                    "row {}, column '{}': {}",
                    row + 1,
                    feature_names[col],
                    e
                ))
            })?;
            features.push(value);
        }
        labels.push(record[width - 1].trim().to_string());
    }

    let n = labels.len();
    let d = width - 1;
    let mut x = Array2::zeros((n, d));
    for (i, chunk) in features.chunks(d).enumerate() {
        for (j, &v) in chunk.iter().enumerate() {
            x[[i, j]] = v;
        }
    }

    let encoder = LabelEncoder::fit(&labels);
    let mut y = Vec::with_capacity(n);
    for label in &labels {
        let code = encoder.transform(label).ok_or_else(|| {
            DensampleError::DataError(format!("label token '{label}' missing from encoder"))
        })?;
        y.push(code);
    }

    tracing::info!(rows = n, features = d, classes = encoder.classes().len(),
        path = %path.as_ref().display(), "dataset loaded");

    Ok(Dataset {
        x,
        y: Array1::from_vec(y),
        encoder,
        feature_names,
        label_name,
    })
}
