//! Recording quality checks.
//!
//! The pipeline itself never crashes on bad data (gaps just thin out
//! windows until the fill floor discards them), but recordings destined
//! for training deserve a louder verdict. These checks flag the usual
//! hardware failure modes: saturated or floating ADC lines, stuck
//! channels, clock regressions and dropout.

use serde::Serialize;

use crate::config::{SensorLayout, ADC_MAX};
use crate::pipeline::source::SensorSample;

#[derive(Clone, Copy, Debug)]
pub struct QualityConfig {
    /// Readings at or above this count as saturated.
    pub saturation_threshold: u16,
    /// Readings at or below this count as floating/disconnected.
    pub noise_floor: u16,
    /// Fewer distinct values than this marks a channel as stuck.
    pub stuck_unique_values: usize,
    /// Channels under this standard deviation are flagged as inactive.
    pub min_channel_std: f64,
    /// Gaps longer than this are reported.
    pub max_gap_ms: u64,
    /// Tolerated fraction of missing samples against the nominal rate.
    pub max_dropout_rate: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            saturation_threshold: 4000,
            noise_floor: 10,
            stuck_unique_values: 5,
            min_channel_std: 10.0,
            max_gap_ms: 50,
            max_dropout_rate: 0.20,
        }
    }
}

/// Outcome of validating one recording. `issues` fail the recording;
/// `warnings` are worth a look but keep it usable.
#[derive(Clone, Debug, Default, Serialize)]
pub struct QualityReport {
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub sample_count: usize,
    pub non_monotonic_count: usize,
    pub gap_count: usize,
    pub dropout_rate: f64,
}

impl QualityReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn validate_recording(
    samples: &[SensorSample],
    layout: &SensorLayout,
    config: &QualityConfig,
    nominal_rate_hz: f64,
) -> QualityReport {
    let mut report = QualityReport {
        sample_count: samples.len(),
        ..QualityReport::default()
    };
    if samples.is_empty() {
        report.issues.push("recording holds no samples".to_string());
        return report;
    }

    check_timestamps(samples, config, nominal_rate_hz, &mut report);
    for (idx, name) in layout.channel_names().iter().enumerate() {
        check_channel(samples, idx, name, config, &mut report);
    }
    report
}

fn check_timestamps(
    samples: &[SensorSample],
    config: &QualityConfig,
    nominal_rate_hz: f64,
    report: &mut QualityReport,
) {
    for pair in samples.windows(2) {
        let (prev, next) = (pair[0].timestamp_ms, pair[1].timestamp_ms);
        if next < prev {
            report.non_monotonic_count += 1;
        } else if next - prev > config.max_gap_ms {
            report.gap_count += 1;
        }
    }
    if report.non_monotonic_count > 0 {
        report.issues.push(format!(
            "{} non-monotonic timestamp(s)",
            report.non_monotonic_count
        ));
    }
    if report.gap_count > 0 {
        report.warnings.push(format!(
            "{} gap(s) longer than {} ms",
            report.gap_count, config.max_gap_ms
        ));
    }

    let duration_ms = samples
        .last()
        .unwrap()
        .timestamp_ms
        .saturating_sub(samples[0].timestamp_ms);
    let expected = duration_ms as f64 * nominal_rate_hz / 1000.0 + 1.0;
    if expected > 1.0 {
        report.dropout_rate = (1.0 - samples.len() as f64 / expected).max(0.0);
        if report.dropout_rate > config.max_dropout_rate {
            report.issues.push(format!(
                "dropout rate {:.1}% exceeds {:.0}%",
                report.dropout_rate * 100.0,
                config.max_dropout_rate * 100.0
            ));
        }
    }
}

fn check_channel(
    samples: &[SensorSample],
    idx: usize,
    name: &str,
    config: &QualityConfig,
    report: &mut QualityReport,
) {
    let values: Vec<u16> = samples
        .iter()
        .map(|s| s.values.get(idx).copied().unwrap_or(0))
        .collect();
    let n = values.len() as f64;

    let out_of_range = values.iter().filter(|&&v| v > ADC_MAX).count();
    if out_of_range > 0 {
        report
            .issues
            .push(format!("{name}: {out_of_range} reading(s) beyond the ADC range"));
    }

    let saturated = values
        .iter()
        .filter(|&&v| v >= config.saturation_threshold)
        .count() as f64
        / n;
    if saturated > 0.05 {
        report
            .warnings
            .push(format!("{name}: saturated {:.0}% of the time", saturated * 100.0));
    }

    let floating = values.iter().filter(|&&v| v <= config.noise_floor).count() as f64 / n;
    if floating > 0.95 {
        report
            .warnings
            .push(format!("{name}: near zero throughout, possibly disconnected"));
    }

    let mut distinct: Vec<u16> = values.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < config.stuck_unique_values {
        report
            .issues
            .push(format!("{name}: stuck ({} distinct values)", distinct.len()));
    } else {
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var = values
            .iter()
            .map(|&v| (v as f64 - mean) * (v as f64 - mean))
            .sum::<f64>()
            / n;
        if var.sqrt() < config.min_channel_std {
            report
                .warnings
                .push(format!("{name}: low variance ({:.1})", var.sqrt()));
        }
    }
}
