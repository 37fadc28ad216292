//! Frequency-domain features.
//!
//! Each channel gets a full-length DFT of the window (no zero padding),
//! keeping the raw magnitudes of the non-negative frequency bins
//! `k < N/2` at `k * rate / N` Hz. Gait-like activities carry a strong
//! periodic signature, which is what separates cadence-bearing activities
//! from static postures when the plain statistics overlap.

use std::collections::BTreeMap;

use ndarray::{ArrayView2, Axis};
use rustfft::{num_complex::Complex, FftPlanner};

/// Additive floor that keeps the entropy term away from log(0).
const ENTROPY_FLOOR: f64 = 1e-10;

/// Per-channel feature name suffixes.
pub const SUFFIXES: [&str; 4] = [
    "spectral_energy",
    "spectral_entropy",
    "dominant_freq",
    "spectral_centroid",
];

pub fn extract(
    matrix: &ArrayView2<f64>,
    channel_names: &[String],
    sample_rate_hz: f64,
) -> BTreeMap<String, f64> {
    let n = matrix.nrows();
    let half = n / 2;
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let frequencies: Vec<f64> = (0..half)
        .map(|k| k as f64 * sample_rate_hz / n as f64)
        .collect();

    let mut features = BTreeMap::new();
    for (i, name) in channel_names.iter().enumerate() {
        let mut buffer: Vec<Complex<f64>> = matrix
            .index_axis(Axis(1), i)
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .collect();
        fft.process(&mut buffer);

        let magnitudes: Vec<f64> = buffer.iter().take(half).map(|c| c.norm()).collect();

        features.insert(
            format!("{name}_spectral_energy"),
            magnitudes.iter().map(|m| m * m).sum(),
        );
        features.insert(format!("{name}_spectral_entropy"), entropy(&magnitudes));
        features.insert(
            format!("{name}_dominant_freq"),
            dominant_frequency(&magnitudes, &frequencies),
        );
        features.insert(
            format!("{name}_spectral_centroid"),
            centroid(&magnitudes, &frequencies),
        );
    }
    features
}

/// Shannon entropy (natural log) of the floor-shifted, sum-normalized
/// magnitude spectrum.
fn entropy(magnitudes: &[f64]) -> f64 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let total: f64 = magnitudes.iter().map(|m| m + ENTROPY_FLOOR).sum();
    -magnitudes
        .iter()
        .map(|m| {
            let p = (m + ENTROPY_FLOOR) / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Frequency of the first maximal bin; 0 for an empty spectrum.
fn dominant_frequency(magnitudes: &[f64], frequencies: &[f64]) -> f64 {
    let mut best = 0usize;
    let mut best_mag = f64::NEG_INFINITY;
    for (k, &m) in magnitudes.iter().enumerate() {
        if m > best_mag {
            best_mag = m;
            best = k;
        }
    }
    if magnitudes.is_empty() {
        0.0
    } else {
        frequencies[best]
    }
}

/// Magnitude-weighted mean frequency; 0 when the spectrum is silent.
fn centroid(magnitudes: &[f64], frequencies: &[f64]) -> f64 {
    let total: f64 = magnitudes.iter().sum();
    if total > 0.0 {
        magnitudes
            .iter()
            .zip(frequencies)
            .map(|(m, f)| m * f)
            .sum::<f64>()
            / total
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn single_channel(values: &[f64]) -> Array2<f64> {
        Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap()
    }

    fn names() -> Vec<String> {
        vec!["A".to_string()]
    }

    #[test]
    fn pure_tone_lands_in_its_own_bin() {
        // 5 Hz sine sampled at 50 Hz over one second: bin 5 of a 50-point
        // DFT is exactly the tone frequency.
        let values: Vec<f64> = (0..50)
            .map(|i| (std::f64::consts::TAU * 5.0 * i as f64 / 50.0).sin())
            .collect();
        let m = single_channel(&values);
        let features = extract(&m.view(), &names(), 50.0);
        assert!((features["A_dominant_freq"] - 5.0).abs() < 1e-9);
        assert!((features["A_spectral_centroid"] - 5.0).abs() < 0.5);
        assert!(features["A_spectral_energy"] > 0.0);
    }

    #[test]
    fn constant_signal_is_all_dc() {
        let m = single_channel(&[1000.0; 50]);
        let features = extract(&m.view(), &names(), 50.0);
        assert_eq!(features["A_dominant_freq"], 0.0);
        // All magnitude sits in bin 0, so the weighted mean frequency is 0.
        assert!(features["A_spectral_centroid"].abs() < 1e-9);
        // One concentrated bin means near-zero entropy.
        assert!(features["A_spectral_entropy"] < 0.1);
    }

    #[test]
    fn silent_signal_has_zero_energy_and_centroid() {
        let m = single_channel(&[0.0; 32]);
        let features = extract(&m.view(), &names(), 50.0);
        assert_eq!(features["A_spectral_energy"], 0.0);
        assert_eq!(features["A_spectral_centroid"], 0.0);
        assert_eq!(features["A_dominant_freq"], 0.0);
    }

    #[test]
    fn entropy_is_maximal_for_a_flat_spectrum() {
        let flat = vec![1.0; 8];
        let concentrated = {
            let mut v = vec![0.0; 8];
            v[3] = 8.0;
            v
        };
        assert!(entropy(&flat) > entropy(&concentrated));
        assert!((entropy(&flat) - (8.0f64).ln()).abs() < 1e-6);
    }
}
