//! Threshold/refractory step counting over raw samples.
//!
//! Runs at sample latency, independent of the window pipeline. This is a
//! debounce, not a peak detector: it under-counts very fast cadences and
//! can over-count a single prolonged contact once the refractory interval
//! elapses mid-stance.

use crate::config::{SensorLayout, StepConfig};
use crate::pipeline::source::SensorSample;

pub struct StepCounter {
    config: StepConfig,
    heel_left: usize,
    heel_right: usize,
    last_step_ms: Option<u64>,
    count: u64,
}

impl StepCounter {
    pub fn new(config: StepConfig, layout: &SensorLayout) -> Self {
        let (heel_left, heel_right) = layout.heel_indices();
        Self {
            config,
            heel_left,
            heel_right,
            last_step_ms: None,
            count: 0,
        }
    }

    /// Feed one sample; returns true when it counted as a new step.
    pub fn update(&mut self, sample: &SensorSample) -> bool {
        let heel_sum = sample.values.get(self.heel_left).copied().unwrap_or(0) as f64
            + sample.values.get(self.heel_right).copied().unwrap_or(0) as f64;
        if heel_sum <= self.config.threshold {
            return false;
        }
        // saturating_sub: timestamps may regress on reconnect.
        let elapsed = self
            .last_step_ms
            .map(|t| sample.timestamp_ms.saturating_sub(t));
        match elapsed {
            Some(e) if e <= self.config.refractory_ms => false,
            _ => {
                self.count += 1;
                self.last_step_ms = Some(sample.timestamp_ms);
                true
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_step_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> StepCounter {
        StepCounter::new(StepConfig::default(), &SensorLayout::default())
    }

    /// Heel channels carry `heel` each; everything else stays quiet.
    fn heel_sample(t: u64, heel: u16) -> SensorSample {
        SensorSample::new(t, vec![heel, 0, 0, heel, 0, 0])
    }

    #[test]
    fn below_threshold_never_counts() {
        let mut steps = counter();
        for t in (0..2000).step_by(20) {
            steps.update(&heel_sample(t, 900)); // sum 1800 < 2000
        }
        assert_eq!(steps.count(), 0);
    }

    #[test]
    fn crossings_within_refractory_collapse_to_one_step() {
        let mut steps = counter();
        assert!(steps.update(&heel_sample(0, 1500)));
        assert!(!steps.update(&heel_sample(200, 1500)));
        assert_eq!(steps.count(), 1);
    }

    #[test]
    fn crossings_beyond_refractory_count_separately() {
        let mut steps = counter();
        assert!(steps.update(&heel_sample(0, 1500)));
        assert!(steps.update(&heel_sample(400, 1500)));
        assert_eq!(steps.count(), 2);
    }

    #[test]
    fn refractory_boundary_is_exclusive() {
        let mut steps = counter();
        steps.update(&heel_sample(0, 1500));
        // Exactly the refractory interval apart is still too soon.
        assert!(!steps.update(&heel_sample(300, 1500)));
        assert!(steps.update(&heel_sample(301, 1500)));
    }

    #[test]
    fn regressed_timestamps_do_not_panic_or_count() {
        let mut steps = counter();
        steps.update(&heel_sample(1000, 1500));
        assert!(!steps.update(&heel_sample(500, 1500)));
        assert_eq!(steps.count(), 1);
    }

    #[test]
    fn reset_starts_a_fresh_session() {
        let mut steps = counter();
        steps.update(&heel_sample(0, 1500));
        steps.reset();
        assert_eq!(steps.count(), 0);
        assert!(steps.update(&heel_sample(10, 1500)));
    }
}
