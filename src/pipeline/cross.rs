//! Cross-sensor gait-symmetry features.
//!
//! Works on the fixed two-leg topology: per leg, a heel/ball pressure pair
//! and one knee stretch channel. Ratios carry a 1e-6 guard in the
//! denominator so a silent channel cannot divide by zero, and every
//! correlation collapses to exactly 0 when either series has no variance.

use std::collections::BTreeMap;

use ndarray::{ArrayView2, Axis};

use crate::config::{LEFT_BALL, LEFT_HEEL, LEFT_KNEE, RIGHT_BALL, RIGHT_HEEL, RIGHT_KNEE};

const RATIO_EPSILON: f64 = 1e-6;

/// Fixed name set this extractor produces.
pub const NAMES: [&str; 18] = [
    "left_pressure_mean",
    "left_pressure_std",
    "right_pressure_mean",
    "right_pressure_std",
    "left_right_pressure_ratio",
    "left_heel_ball_ratio",
    "right_heel_ball_ratio",
    "left_knee_mean",
    "left_knee_std",
    "right_knee_mean",
    "right_knee_std",
    "left_right_knee_ratio",
    "left_total_mean",
    "right_total_mean",
    "left_right_total_ratio",
    "left_right_correlation",
    "left_pressure_stretch_corr",
    "right_pressure_stretch_corr",
];

pub fn extract(matrix: &ArrayView2<f64>) -> BTreeMap<String, f64> {
    let col = |i: usize| matrix.index_axis(Axis(1), i);
    let n = matrix.nrows();

    // Summed pressure signal per leg (heel + ball), sample by sample.
    let left_pressure: Vec<f64> = (0..n)
        .map(|r| col(LEFT_HEEL)[r] + col(LEFT_BALL)[r])
        .collect();
    let right_pressure: Vec<f64> = (0..n)
        .map(|r| col(RIGHT_HEEL)[r] + col(RIGHT_BALL)[r])
        .collect();
    let left_knee: Vec<f64> = col(LEFT_KNEE).iter().copied().collect();
    let right_knee: Vec<f64> = col(RIGHT_KNEE).iter().copied().collect();

    // Total activity per leg: pressure sum plus knee stretch.
    let left_total: Vec<f64> = left_pressure
        .iter()
        .zip(&left_knee)
        .map(|(p, k)| p + k)
        .collect();
    let right_total: Vec<f64> = right_pressure
        .iter()
        .zip(&right_knee)
        .map(|(p, k)| p + k)
        .collect();

    let mut features = BTreeMap::new();
    let mut put = |name: &str, value: f64| {
        features.insert(name.to_string(), value);
    };

    put("left_pressure_mean", mean(&left_pressure));
    put("left_pressure_std", std(&left_pressure));
    put("right_pressure_mean", mean(&right_pressure));
    put("right_pressure_std", std(&right_pressure));
    put(
        "left_right_pressure_ratio",
        ratio(mean(&left_pressure), mean(&right_pressure)),
    );

    let left_heel: Vec<f64> = col(LEFT_HEEL).iter().copied().collect();
    let left_ball: Vec<f64> = col(LEFT_BALL).iter().copied().collect();
    let right_heel: Vec<f64> = col(RIGHT_HEEL).iter().copied().collect();
    let right_ball: Vec<f64> = col(RIGHT_BALL).iter().copied().collect();
    put(
        "left_heel_ball_ratio",
        ratio(mean(&left_heel), mean(&left_ball)),
    );
    put(
        "right_heel_ball_ratio",
        ratio(mean(&right_heel), mean(&right_ball)),
    );

    put("left_knee_mean", mean(&left_knee));
    put("left_knee_std", std(&left_knee));
    put("right_knee_mean", mean(&right_knee));
    put("right_knee_std", std(&right_knee));
    put(
        "left_right_knee_ratio",
        ratio(mean(&left_knee), mean(&right_knee)),
    );

    put("left_total_mean", mean(&left_total));
    put("right_total_mean", mean(&right_total));
    put(
        "left_right_total_ratio",
        ratio(mean(&left_total), mean(&right_total)),
    );

    put(
        "left_right_correlation",
        correlation(&left_total, &right_total),
    );
    put(
        "left_pressure_stretch_corr",
        correlation(&left_pressure, &left_knee),
    );
    put(
        "right_pressure_stretch_corr",
        correlation(&right_pressure, &right_knee),
    );

    features
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

fn std(data: &[f64]) -> f64 {
    let m = mean(data);
    let var = data.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / data.len() as f64;
    var.sqrt()
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    numerator / (denominator + RATIO_EPSILON)
}

/// Pearson correlation; exactly 0 when either side has no variance.
fn correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.len() <= 1 {
        return 0.0;
    }
    let ma = mean(a);
    let mb = mean(b);
    let mut num = 0.0;
    let mut da2 = 0.0;
    let mut db2 = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - ma;
        let dy = y - mb;
        num += dx * dy;
        da2 += dx * dx;
        db2 += dy * dy;
    }
    if da2 > 0.0 && db2 > 0.0 {
        num / (da2.sqrt() * db2.sqrt())
    } else {
        0.0
    }
}
