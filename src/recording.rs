//! Raw recording files.
//!
//! One CSV per recording: a `time_ms` column followed by the channel
//! columns in the layout's canonical order. Filenames carry the subject
//! and activity (`S01_walking_forward_20260115_143022.csv`), which is how
//! the table builder labels training rows.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::config::SensorLayout;
use crate::pipeline::error::SockError;
use crate::pipeline::source::SensorSample;

/// Streams samples into a raw CSV recording, one line per sample.
pub struct RecordingWriter {
    writer: BufWriter<File>,
}

impl RecordingWriter {
    pub fn create(path: &Path, layout: &SensorLayout) -> Result<Self, SockError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "time_ms,{}", layout.channel_names().join(","))?;
        Ok(Self { writer })
    }

    pub fn write_sample(&mut self, sample: &SensorSample) -> Result<(), SockError> {
        write!(self.writer, "{}", sample.timestamp_ms)?;
        for value in &sample.values {
            write!(self.writer, ",{value}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(), SockError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Load a raw recording, mapping header columns onto the layout order.
///
/// Comment lines (`#`) and lines that fail to parse are skipped, the same
/// tolerance the live decoder applies; a missing channel column is a hard
/// error because the resulting features would be garbage.
pub fn read_recording(path: &Path, layout: &SensorLayout) -> Result<Vec<SensorSample>, SockError> {
    let malformed = |reason: &str| SockError::MalformedRecording {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();
    let header = lines
        .next()
        .ok_or_else(|| malformed("empty file"))??;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let time_col = columns
        .iter()
        .position(|c| *c == "time_ms")
        .ok_or_else(|| malformed("missing time_ms column"))?;
    let mut channel_cols = Vec::new();
    for name in layout.channel_names() {
        let idx = columns
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| malformed(&format!("missing channel column {name}")))?;
        channel_cols.push(idx);
    }

    let mut samples = Vec::new();
    let mut skipped = 0usize;
    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match parse_line(&fields, time_col, &channel_cols) {
            Some(sample) => samples.push(sample),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("{}: skipped {skipped} unparseable lines", path.display());
    }
    Ok(samples)
}

fn parse_line(fields: &[&str], time_col: usize, channel_cols: &[usize]) -> Option<SensorSample> {
    let timestamp_ms = fields.get(time_col)?.parse::<u64>().ok()?;
    let mut values = Vec::with_capacity(channel_cols.len());
    for &col in channel_cols {
        values.push(fields.get(col)?.parse::<u16>().ok()?);
    }
    Some(SensorSample::new(timestamp_ms, values))
}

/// Recover (subject, activity) from a recording filename.
///
/// Matches the known activity list first, so multi-word activities like
/// `walking_forward` survive; otherwise falls back to treating everything
/// between the subject and the trailing timestamp as the label.
pub fn parse_recording_name(filename: &str, activities: &[String]) -> (String, String) {
    let stem = filename.strip_suffix(".csv").unwrap_or(filename);
    let parts: Vec<&str> = stem.split('_').collect();
    let subject = parts.first().unwrap_or(&"unknown").to_string();

    for activity in activities {
        if stem.contains(activity.as_str()) {
            return (subject, activity.clone());
        }
    }
    if parts.len() >= 3 {
        (subject, parts[1..parts.len() - 2].join("_"))
    } else {
        (subject, "unknown".to_string())
    }
}
