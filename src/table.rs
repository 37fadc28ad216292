//! Offline feature table.
//!
//! Segments whole recordings into time-based overlapping windows and runs
//! them through the exact same extractor the live engine uses. Columns are
//! the sorted schema names plus `label` and `subject`; this file is the
//! contract with the model-training side.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};

use crate::config::WindowConfig;
use crate::pipeline::buffer::Window;
use crate::pipeline::error::SockError;
use crate::pipeline::features::FeatureExtractor;
use crate::pipeline::source::SensorSample;

/// One labelled feature row, values in schema order.
#[derive(Clone, Debug)]
pub struct FeatureRow {
    pub values: Vec<f64>,
    pub label: String,
    pub subject: String,
}

#[derive(Clone, Debug)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn write_csv(&self, path: &Path) -> Result<(), SockError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{},label,subject", self.columns.join(","))?;
        for row in &self.rows {
            for value in &row.values {
                write!(writer, "{value},")?;
            }
            writeln!(writer, "{},{}", row.label, row.subject)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Cut a recording into overlapping time windows.
///
/// Windows advance by `stride_ms` and keep only those holding at least the
/// configured fraction of the nominal sample count; a window that thin
/// (dropout, gap) is skipped outright, never zero-padded, because padding
/// would bias the feature distribution.
pub fn segment(samples: &[SensorSample], config: &WindowConfig) -> Vec<Window> {
    let mut windows = Vec::new();
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return windows;
    };
    let start = first.timestamp_ms;
    let end = last.timestamp_ms;
    let min_samples = config.min_samples();

    let mut current = start;
    while current + config.window_ms <= end {
        let upper = current + config.window_ms;
        let members: Vec<SensorSample> = samples
            .iter()
            .filter(|s| s.timestamp_ms >= current && s.timestamp_ms < upper)
            .cloned()
            .collect();
        if members.len() >= min_samples {
            windows.push(Window::new(members));
        }
        current += config.stride_ms;
    }
    windows
}

/// Accumulates labelled recordings into one table.
pub struct TableBuilder<'a> {
    extractor: &'a FeatureExtractor,
    window: WindowConfig,
    rows: Vec<FeatureRow>,
}

impl<'a> TableBuilder<'a> {
    pub fn new(extractor: &'a FeatureExtractor, window: WindowConfig) -> Self {
        Self {
            extractor,
            window,
            rows: Vec::new(),
        }
    }

    /// Featurize one recording; returns how many windows were usable.
    pub fn add_recording(
        &mut self,
        samples: &[SensorSample],
        label: &str,
        subject: &str,
    ) -> Result<usize, SockError> {
        let windows = segment(samples, &self.window);
        if windows.is_empty() {
            warn!("no usable windows for {subject}/{label}");
        }
        let added = windows.len();
        for window in windows {
            self.rows.push(FeatureRow {
                values: self.extractor.extract_row(&window)?,
                label: label.to_string(),
                subject: subject.to_string(),
            });
        }
        info!("{subject}/{label}: {added} windows featurized");
        Ok(added)
    }

    pub fn finish(self) -> FeatureTable {
        FeatureTable {
            columns: self.extractor.schema().names().to_vec(),
            rows: self.rows,
        }
    }
}
