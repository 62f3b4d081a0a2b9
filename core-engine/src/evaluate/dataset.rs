//! Labeled flow dataset loading
//!
//! Reads CICIDS2017-style CSV exports. Headers are trimmed (the public
//! files carry leading spaces), feature columns are taken in schema order
//! and rows with a missing or non-numeric value are dropped.

use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::error::{CoreError, CoreResult};
use crate::features::FlowSchema;

/// Default name of the ground-truth column
pub const DEFAULT_LABEL_COLUMN: &str = "Label";

#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub features: Array2<f32>,
    /// Raw label strings, one per row
    pub labels: Vec<String>,
    pub files: Vec<PathBuf>,
    pub dropped_rows: usize,
}

impl LabeledDataset {
    /// Load one CSV file, or every `*.csv` in a directory in name order
    pub fn load<P: AsRef<Path>>(path: P, schema: &FlowSchema, label_column: &str) -> CoreResult<Self> {
        let files = csv_files(path.as_ref())?;

        let mut values: Vec<f32> = Vec::new();
        let mut labels = Vec::new();
        let mut dropped = 0;

        for file in &files {
            log::info!("Loading: {}", file.display());
            let (rows, skipped) = read_file(file, schema, label_column, &mut values, &mut labels)?;
            log::debug!("{}: {} rows kept, {} dropped", file.display(), rows, skipped);
            dropped += skipped;
        }

        let features = Array2::from_shape_vec((labels.len(), schema.len()), values)
            .map_err(|e| CoreError::Schema(e.to_string()))?;

        log::info!("Loaded {} rows ({} dropped) from {} file(s)", labels.len(), dropped, files.len());
        Ok(Self { features, labels, files, dropped_rows: dropped })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn csv_files(path: &Path) -> CoreResult<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(CoreError::Schema(format!("Dataset not found: {}", path.display())));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(CoreError::Schema(format!("No CSV files found in {}", path.display())));
    }
    Ok(files)
}

/// Append one file's rows; returns (kept, dropped)
fn read_file(
    path: &Path,
    schema: &FlowSchema,
    label_column: &str,
    values: &mut Vec<f32>,
    labels: &mut Vec<String>,
) -> CoreResult<(usize, usize)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let label_index = position(label_column).ok_or_else(|| {
        CoreError::Schema(format!("{} has no '{}' column", path.display(), label_column))
    })?;
    let columns = schema
        .features()
        .iter()
        .map(|name| {
            position(name)
                .ok_or_else(|| CoreError::Schema(format!("{} has no '{}' column", path.display(), name)))
        })
        .collect::<CoreResult<Vec<usize>>>()?;

    let mut kept = 0;
    let mut dropped = 0;
    let mut row = Vec::with_capacity(columns.len());

    for record in reader.records() {
        let record = record?;
        let label = record.get(label_index).map(str::trim).unwrap_or_default();

        row.clear();
        let complete = !label.is_empty()
            && columns.iter().all(|&c| match record.get(c).and_then(parse_value) {
                Some(v) => {
                    row.push(v);
                    true
                }
                None => false,
            });

        if complete {
            values.extend_from_slice(&row);
            labels.push(label.to_string());
            kept += 1;
        } else {
            dropped += 1;
        }
    }

    Ok((kept, dropped))
}

fn parse_value(field: &str) -> Option<f32> {
    let v: f64 = field.trim().parse().ok()?;
    if v.is_nan() {
        None
    } else {
        Some(v as f32)
    }
}
