//! Synthetic gait source.
//!
//! Generates a plausible walking signal for demos and tests: each leg's
//! pressure wave is half a cycle out of phase with the other, heel strike
//! leads the ball of the foot, and the knee stretch follows the swing.
//! Seedable so a replay is reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ADC_MAX;
use crate::pipeline::error::SockError;
use crate::pipeline::source::{SampleSource, SensorSample};

pub struct SyntheticGait {
    rng: StdRng,
    interval_ms: u64,
    step_period_ms: u64,
    amplitude: f64,
    baseline: f64,
    noise: f64,
    t_ms: u64,
    remaining: usize,
}

impl SyntheticGait {
    /// A walking-like stream: `samples` samples at 50 Hz, ~1.2 s per full
    /// gait cycle.
    pub fn walking(seed: u64, samples: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            interval_ms: 20,
            step_period_ms: 1200,
            amplitude: 1400.0,
            baseline: 400.0,
            noise: 30.0,
            t_ms: 0,
            remaining: samples,
        }
    }

    /// A quiet standing stream: constant load, sensor noise only. The
    /// per-heel load keeps the heel-pair sum under the step threshold.
    pub fn standing(seed: u64, samples: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            interval_ms: 20,
            step_period_ms: 1200,
            amplitude: 0.0,
            baseline: 900.0,
            noise: 30.0,
            t_ms: 0,
            remaining: samples,
        }
    }

    fn reading(&mut self, level: f64) -> u16 {
        let jitter = self.rng.gen_range(-self.noise..=self.noise);
        (level + jitter).clamp(0.0, ADC_MAX as f64) as u16
    }
}

impl SampleSource for SyntheticGait {
    fn next_sample(&mut self) -> Result<Option<SensorSample>, SockError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        let phase = std::f64::consts::TAU * (self.t_ms as f64 / self.step_period_ms as f64);
        // Rectified sine per leg: pressure only while the foot is down.
        let left = phase.sin().max(0.0);
        let right = (phase + std::f64::consts::PI).sin().max(0.0);
        // Ball contact trails heel strike by a quarter cycle.
        let left_ball = (phase - std::f64::consts::FRAC_PI_2).sin().max(0.0);
        let right_ball = (phase + std::f64::consts::FRAC_PI_2).sin().max(0.0);

        let values = vec![
            self.reading(self.baseline + self.amplitude * left),
            self.reading(self.baseline + self.amplitude * left_ball),
            self.reading(self.baseline + self.amplitude * 0.4 * right), // left knee flexes in swing
            self.reading(self.baseline + self.amplitude * right),
            self.reading(self.baseline + self.amplitude * right_ball),
            self.reading(self.baseline + self.amplitude * 0.4 * left),
        ];
        let sample = SensorSample::new(self.t_ms, values);
        self.t_ms += self.interval_ms;
        Ok(Some(sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_the_requested_number_of_samples() {
        let mut source = SyntheticGait::walking(7, 120);
        let mut count = 0;
        while source.next_sample().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 120);
    }

    #[test]
    fn same_seed_replays_identically() {
        let mut a = SyntheticGait::walking(42, 50);
        let mut b = SyntheticGait::walking(42, 50);
        while let Some(sample) = a.next_sample().unwrap() {
            assert_eq!(Some(sample), b.next_sample().unwrap());
        }
    }

    #[test]
    fn walking_loads_alternate_between_legs() {
        let mut source = SyntheticGait::walking(1, 60);
        let mut left_peak = 0u16;
        let mut right_peak = 0u16;
        while let Some(sample) = source.next_sample().unwrap() {
            left_peak = left_peak.max(sample.values[0]);
            right_peak = right_peak.max(sample.values[3]);
        }
        assert!(left_peak > 1500);
        assert!(right_peak > 1500);
    }

    #[test]
    fn standing_never_crosses_the_step_threshold() {
        let mut source = SyntheticGait::standing(3, 100);
        while let Some(sample) = source.next_sample().unwrap() {
            let heel_sum = sample.values[0] as u32 + sample.values[3] as u32;
            assert!(heel_sum < 2000);
        }
    }
}
