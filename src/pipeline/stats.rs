//! Per-channel statistical features.
//!
//! All statistics operate on the raw ADC values cast to f64; no scaling
//! happens here (standardization is the classifier adapter's job). The
//! formulas are the population forms:
//! - std uses the 1/N variance, not 1/(N-1)
//! - percentiles interpolate linearly between order statistics
//! - skewness is m3 / m2^1.5, excess kurtosis m4 / m2^2 - 3, both 0 when
//!   the window has no variance
//! - zero crossings are sign-change transitions about the channel mean,
//!   normalized by N - 1
//! - slope is the ordinary least-squares fit of value against sample index

use std::collections::BTreeMap;

use ndarray::{ArrayView1, ArrayView2, Axis};

/// Per-channel feature name suffixes, one per computed statistic.
pub const SUFFIXES: [&str; 14] = [
    "mean", "std", "min", "max", "range", "q25", "q50", "q75", "skewness", "kurtosis", "zcr",
    "rms", "energy", "slope",
];

/// Extract the statistical features for every channel of a window matrix.
pub fn extract(matrix: &ArrayView2<f64>, channel_names: &[String]) -> BTreeMap<String, f64> {
    let mut features = BTreeMap::new();
    for (i, name) in channel_names.iter().enumerate() {
        let column = matrix.index_axis(Axis(1), i);
        channel_features(&column, name, &mut features);
    }
    features
}

fn channel_features(data: &ArrayView1<f64>, name: &str, out: &mut BTreeMap<String, f64>) {
    let n = data.len();
    let nf = n as f64;

    let sum: f64 = data.iter().sum();
    let mean = sum / nf;

    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    let mut sum_sq = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in data.iter() {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
        sum_sq += v * v;
        min = min.min(v);
        max = max.max(v);
    }
    m2 /= nf;
    m3 /= nf;
    m4 /= nf;

    let std = m2.sqrt();
    let skewness = if m2 > 0.0 { m3 / m2.powf(1.5) } else { 0.0 };
    let kurtosis = if m2 > 0.0 { m4 / (m2 * m2) - 3.0 } else { 0.0 };

    let mut sorted: Vec<f64> = data.iter().copied().collect();
    sorted.sort_by(f64::total_cmp);

    out.insert(format!("{name}_mean"), mean);
    out.insert(format!("{name}_std"), std);
    out.insert(format!("{name}_min"), min);
    out.insert(format!("{name}_max"), max);
    out.insert(format!("{name}_range"), max - min);
    out.insert(format!("{name}_q25"), percentile(&sorted, 25.0));
    out.insert(format!("{name}_q50"), percentile(&sorted, 50.0));
    out.insert(format!("{name}_q75"), percentile(&sorted, 75.0));
    out.insert(format!("{name}_skewness"), skewness);
    out.insert(format!("{name}_kurtosis"), kurtosis);
    out.insert(format!("{name}_zcr"), zero_crossing_rate(data, mean));
    out.insert(format!("{name}_rms"), (sum_sq / nf).sqrt());
    out.insert(format!("{name}_energy"), sum_sq);
    out.insert(format!("{name}_slope"), slope(data, mean));
}

/// Linear-interpolation percentile over already-sorted data.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = p / 100.0 * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Sign-change transitions about the mean, normalized by N - 1.
fn zero_crossing_rate(data: &ArrayView1<f64>, mean: f64) -> f64 {
    let n = data.len();
    if n <= 1 {
        return 0.0;
    }
    let sign = |v: f64| -> f64 {
        let d = v - mean;
        if d > 0.0 {
            1.0
        } else if d < 0.0 {
            -1.0
        } else {
            0.0
        }
    };
    let mut crossings = 0.0;
    let mut prev = sign(data[0]);
    for &v in data.iter().skip(1) {
        let s = sign(v);
        crossings += (s - prev).abs() / 2.0;
        prev = s;
    }
    crossings / (n - 1) as f64
}

/// OLS slope of value against sample index; 0 for degenerate windows.
fn slope(data: &ArrayView1<f64>, mean: f64) -> f64 {
    let n = data.len();
    if n <= 1 {
        return 0.0;
    }
    let idx_mean = (n - 1) as f64 / 2.0;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &v) in data.iter().enumerate() {
        let di = i as f64 - idx_mean;
        sxy += di * (v - mean);
        sxx += di * di;
    }
    sxy / sxx
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array2};

    fn single_channel(values: &[f64]) -> Array2<f64> {
        Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap()
    }

    #[test]
    fn ramp_has_unit_per_index_slope_and_positive_std() {
        // 50 samples climbing 0..4900 in steps of 100, the canonical ramp.
        let values: Vec<f64> = (0..50).map(|i| (i * 100) as f64).collect();
        let m = single_channel(&values);
        let features = extract(&m.view(), &["A".to_string()]);
        assert!((features["A_slope"] - 100.0).abs() < 1e-9);
        assert!(features["A_std"] > 0.0);
        assert_eq!(features["A_min"], 0.0);
        assert_eq!(features["A_max"], 4900.0);
        assert_eq!(features["A_range"], 4900.0);
    }

    #[test]
    fn constant_channel_degenerates_cleanly() {
        let m = single_channel(&[1000.0; 50]);
        let features = extract(&m.view(), &["C".to_string()]);
        assert_eq!(features["C_std"], 0.0);
        assert_eq!(features["C_skewness"], 0.0);
        assert_eq!(features["C_kurtosis"], 0.0);
        assert_eq!(features["C_zcr"], 0.0);
        assert_eq!(features["C_mean"], 1000.0);
        assert_eq!(features["C_q50"], 1000.0);
        assert!(features["C_skewness"].is_finite());
    }

    #[test]
    fn single_sample_window_yields_zero_slope() {
        let m = single_channel(&[42.0]);
        let features = extract(&m.view(), &["A".to_string()]);
        assert_eq!(features["A_slope"], 0.0);
        assert_eq!(features["A_zcr"], 0.0);
        assert_eq!(features["A_q25"], 42.0);
    }

    #[test]
    fn percentiles_interpolate_linearly() {
        let sorted = [0.0, 10.0, 20.0, 30.0];
        // pos = 0.25 * 3 = 0.75 -> between 0 and 10
        assert!((percentile(&sorted, 25.0) - 7.5).abs() < 1e-12);
        assert!((percentile(&sorted, 50.0) - 15.0).abs() < 1e-12);
        assert!((percentile(&sorted, 75.0) - 22.5).abs() < 1e-12);
    }

    #[test]
    fn alternating_signal_crosses_once_per_transition() {
        let data = arr1(&[1.0, -1.0, 1.0, -1.0, 1.0]);
        let rate = zero_crossing_rate(&data.view(), 0.2);
        // Four transitions over four gaps.
        assert!((rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rms_and_energy_agree() {
        let m = single_channel(&[3.0, 4.0]);
        let features = extract(&m.view(), &["A".to_string()]);
        assert!((features["A_energy"] - 25.0).abs() < 1e-12);
        assert!((features["A_rms"] - (12.5f64).sqrt()).abs() < 1e-12);
    }
}
